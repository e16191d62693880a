// Generate-then-verify flow and the report printed for the operator

use crate::config::SqlConfig;
use crate::credential::Credential;
use crate::errors::GenerateError;
use crate::hasher::{EncodedHash, HashVersion, PasswordHasher};
use crate::sql::{ParameterizedStatement, UpdateStatement};
use secrecy::ExposeSecret;
use serde::Serialize;
use std::fmt;
use tracing::{error, info, instrument};

const BANNER: &str = "=========================================";

/// Output format of the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// Result of one generation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    pub hash: String,
    pub version: HashVersion,
    pub cost: u32,
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameterized: Option<ParameterizedStatement>,
}

/// Hash the credential, verify the fresh hash, and build the report
///
/// Nothing is returned unless verification succeeds, so callers never print a
/// partial result.
#[instrument(skip(hasher, credential, sql), fields(cost = hasher.cost()))]
pub fn generate(
    hasher: &PasswordHasher,
    credential: &Credential,
    sql: Option<&SqlConfig>,
) -> Result<GenerationReport, GenerateError> {
    let hash = hasher.hash(credential.expose_secret())?;

    let verified = hasher.verify(credential.expose_secret(), &hash)?;
    if !verified {
        error!("Generated hash did not verify against its own plaintext");
        return Err(GenerateError::VerificationFailed);
    }

    let parsed = EncodedHash::parse(&hash)?;

    let (sql, parameterized) = match sql {
        Some(config) => {
            let statement = UpdateStatement::new(config, &hash)?;
            (Some(statement.to_sql()), Some(statement.parameterized()))
        }
        None => (None, None),
    };

    info!(version = %parsed.version, "Hash generated and verified");

    Ok(GenerationReport {
        hash,
        version: parsed.version,
        cost: parsed.cost,
        verified,
        sql,
        parameterized,
    })
}

impl GenerationReport {
    pub fn render(&self, format: ReportFormat) -> Result<String, GenerateError> {
        match format {
            ReportFormat::Text => Ok(self.to_text()),
            ReportFormat::Json => serde_json::to_string_pretty(self)
                .map(|mut json| {
                    json.push('\n');
                    json
                })
                .map_err(|e| GenerateError::Serialization(e.to_string())),
        }
    }

    /// Human-readable report; never includes the plaintext
    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for GenerationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", BANNER)?;
        writeln!(f, "BCRYPT HASH GENERATED")?;
        writeln!(f, "{}", BANNER)?;
        writeln!(f, "Hash: {}", self.hash)?;
        writeln!(f, "Version: {}  Cost: {}", self.version, self.cost)?;
        writeln!(f)?;
        writeln!(
            f,
            "Verification: {}",
            if self.verified { "OK" } else { "FAILED" }
        )?;

        if let Some(sql) = &self.sql {
            writeln!(f)?;
            writeln!(f, "SQL to apply:")?;
            writeln!(f, "{}", sql)?;
        }

        Ok(())
    }
}
