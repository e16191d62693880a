// Error handling framework for hashing, credential input and configuration

use thiserror::Error;

/// Hashing and verification errors
#[derive(Error, Debug)]
pub enum HashError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid cost {cost}: must be between {min} and {max}")]
    InvalidCost { cost: u32, min: u32, max: u32 },

    #[error("Malformed hash: {0}")]
    MalformedHash(String),

    #[error("Hashing primitive unavailable: {0}")]
    DependencyUnavailable(String),
}

impl From<bcrypt::BcryptError> for HashError {
    fn from(err: bcrypt::BcryptError) -> Self {
        use bcrypt::BcryptError;

        match err {
            BcryptError::CostNotAllowed(cost) => HashError::InvalidCost {
                cost,
                min: crate::hasher::MIN_COST,
                max: crate::hasher::MAX_COST,
            },
            BcryptError::InvalidCost(_)
            | BcryptError::InvalidPrefix(_)
            | BcryptError::InvalidHash(_)
            | BcryptError::InvalidSaltLen(_)
            | BcryptError::InvalidBase64(_) => HashError::MalformedHash(err.to_string()),
            other => HashError::DependencyUnavailable(other.to_string()),
        }
    }
}

/// Errors raised while obtaining the plaintext credential
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("No password source available: pass --password-env, --password-stdin or run in a terminal")]
    NoSource,

    #[error("Password must not be empty")]
    Empty,

    #[error("Environment variable not set: {0}")]
    EnvVarMissing(String),

    #[error("Environment variable {0} does not contain valid UTF-8")]
    EnvVarNotUnicode(String),

    #[error("Failed to read password: {0}")]
    ReadFailed(String),
}

/// Validation errors for settings and SQL templates
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid field value for {field}: {reason}")]
    InvalidFieldValue { field: String, reason: String },

    #[error("Invalid SQL identifier for {field}: '{value}'")]
    InvalidIdentifier { field: String, value: String },
}

/// Errors from the generate-then-verify flow
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error(transparent)]
    Hash(#[from] HashError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Freshly generated hash failed verification")]
    VerificationFailed,

    #[error("Failed to serialize report: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_not_allowed_maps_to_invalid_cost() {
        let err: HashError = bcrypt::BcryptError::CostNotAllowed(3).into();
        assert!(matches!(err, HashError::InvalidCost { cost: 3, .. }));
    }

    #[test]
    fn test_invalid_hash_maps_to_malformed() {
        let err: HashError = bcrypt::BcryptError::InvalidHash("x".to_string()).into();
        assert!(matches!(err, HashError::MalformedHash(_)));
    }

    #[test]
    fn test_error_messages_are_descriptive() {
        let err = HashError::InvalidCost {
            cost: 40,
            min: 4,
            max: 31,
        };
        assert_eq!(err.to_string(), "Invalid cost 40: must be between 4 and 31");

        let err = ValidationError::InvalidIdentifier {
            field: "sql.table".to_string(),
            value: "users; --".to_string(),
        };
        assert!(err.to_string().contains("users; --"));
    }
}
