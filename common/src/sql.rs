// SQL statement rendering for the password update
// Output is text for manual use; nothing here talks to a database.

use crate::config::SqlConfig;
use crate::errors::ValidationError;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // Optionally schema-qualified: schema.table
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}(\.[A-Za-z_][A-Za-z0-9_]{0,62})?$")
            .expect("Invalid identifier pattern")
    })
}

/// True if `value` can be emitted unquoted as a table or column name
pub fn is_valid_identifier(value: &str) -> bool {
    identifier_pattern().is_match(value)
}

/// Quote a string literal, doubling embedded single quotes
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// A password `UPDATE` for one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateStatement {
    table: String,
    password_column: String,
    username_column: String,
    username: String,
    password_hash: String,
}

/// Placeholder form of the statement with its bind values in order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterizedStatement {
    pub sql: String,
    pub params: Vec<String>,
}

impl UpdateStatement {
    /// Build the statement, validating every identifier
    pub fn new(config: &SqlConfig, password_hash: &str) -> Result<Self, ValidationError> {
        for (field, value) in [
            ("sql.table", &config.table),
            ("sql.password_column", &config.password_column),
            ("sql.username_column", &config.username_column),
        ] {
            if !is_valid_identifier(value) {
                return Err(ValidationError::InvalidIdentifier {
                    field: field.to_string(),
                    value: value.clone(),
                });
            }
        }

        if config.username.is_empty() {
            return Err(ValidationError::MissingField("sql.username".to_string()));
        }

        Ok(Self {
            table: config.table.clone(),
            password_column: config.password_column.clone(),
            username_column: config.username_column.clone(),
            username: config.username.clone(),
            password_hash: password_hash.to_string(),
        })
    }

    /// Render with inline literals, ready to paste into a SQL console
    pub fn to_sql(&self) -> String {
        format!(
            "UPDATE {} SET {} = {} WHERE {} = {};",
            self.table,
            self.password_column,
            quote_literal(&self.password_hash),
            self.username_column,
            quote_literal(&self.username)
        )
    }

    /// Render with `$1`/`$2` placeholders for a driver that binds parameters
    pub fn parameterized(&self) -> ParameterizedStatement {
        ParameterizedStatement {
            sql: format!(
                "UPDATE {} SET {} = $1 WHERE {} = $2",
                self.table, self.password_column, self.username_column
            ),
            params: vec![self.password_hash.clone(), self.username.clone()],
        }
    }
}
