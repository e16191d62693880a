// Configuration management with layered configuration (defaults, file, env, CLI)

use crate::errors::ValidationError;
use crate::hasher::{validate_cost, HashVersion, TruncationPolicy, DEFAULT_COST};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Prefix for environment overrides, e.g. `HASHGEN__HASHER__COST=12`
pub const ENV_PREFIX: &str = "HASHGEN";

/// Main settings structure containing all configuration options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub hasher: HasherConfig,
    pub sql: SqlConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HasherConfig {
    pub cost: u32,
    pub version: HashVersion,
    pub truncation: TruncationPolicy,
}

impl Default for HasherConfig {
    fn default() -> Self {
        Self {
            cost: DEFAULT_COST,
            version: HashVersion::default(),
            truncation: TruncationPolicy::default(),
        }
    }
}

/// Target of the generated `UPDATE` statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqlConfig {
    pub table: String,
    pub password_column: String,
    pub username_column: String,
    pub username: String,
}

impl Default for SqlConfig {
    fn default() -> Self {
        Self {
            table: "usuario".to_string(),
            password_column: "password".to_string(),
            username_column: "username".to_string(),
            username: "admin".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub json: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            json: false,
        }
    }
}

impl Settings {
    /// Load configuration with layered precedence: defaults → file → env
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config")
    }

    /// Load configuration from a specific directory, reading overrides from the
    /// process environment
    pub fn load_from_path<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        Self::load_with_env(config_dir, None)
    }

    /// Load configuration from a directory with an explicit environment map
    ///
    /// `None` reads the process environment.
    pub fn load_with_env<P: AsRef<Path>>(
        config_dir: P,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Local overrides, not committed to git
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Validate configuration settings
    ///
    /// The `[sql]` section is checked by `UpdateStatement::new`, and only when a
    /// statement is rendered.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_cost(self.hasher.cost).map_err(|e| ValidationError::InvalidFieldValue {
            field: "hasher.cost".to_string(),
            reason: e.to_string(),
        })?;

        if self.observability.log_level.is_empty() {
            return Err(ValidationError::MissingField(
                "observability.log_level".to_string(),
            ));
        }
        EnvFilter::try_new(&self.observability.log_level).map_err(|e| {
            ValidationError::InvalidFieldValue {
                field: "observability.log_level".to_string(),
                reason: e.to_string(),
            }
        })?;

        Ok(())
    }
}
