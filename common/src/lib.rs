// Common library: bcrypt hashing, credential input, configuration and reporting

pub mod config;
pub mod credential;
pub mod errors;
pub mod hasher;
pub mod report;
pub mod sql;
pub mod telemetry;

pub use hasher::{hash_password, verify_password, EncodedHash, PasswordHasher};
