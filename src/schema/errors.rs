//! Schema error types
//!
//! Error codes:
//! - TABSTORE_SCHEMA_UNKNOWN_COLUMN
//! - TABSTORE_SCHEMA_UNKNOWN
//! - TABSTORE_SCHEMA_INVALID
//! - TABSTORE_SCHEMA_MALFORMED_FILE

use thiserror::Error;

/// Schema error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Lookup of a column the schema does not declare
    #[error("Column '{column}' is not declared in schema '{schema}'")]
    UnknownColumn { schema: String, column: String },

    /// No schema registered under this name
    #[error("Schema '{0}' not found")]
    UnknownSchema(String),

    /// Schema definition violates its own invariants
    #[error("Invalid schema '{schema}': {reason}")]
    InvalidSchema { schema: String, reason: String },

    /// Schema file could not be read or parsed
    #[error("Malformed schema file '{path}': {reason}")]
    Malformed { path: String, reason: String },

    /// Two schemas registered under the same name
    #[error("Schema '{0}' is already registered")]
    AlreadyRegistered(String),
}

impl SchemaError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaError::UnknownColumn { .. } => "TABSTORE_SCHEMA_UNKNOWN_COLUMN",
            SchemaError::UnknownSchema(_) => "TABSTORE_SCHEMA_UNKNOWN",
            SchemaError::InvalidSchema { .. } => "TABSTORE_SCHEMA_INVALID",
            SchemaError::Malformed { .. } => "TABSTORE_SCHEMA_MALFORMED_FILE",
            SchemaError::AlreadyRegistered(_) => "TABSTORE_SCHEMA_ALREADY_REGISTERED",
        }
    }
}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            SchemaError::UnknownSchema("x".into()).code(),
            "TABSTORE_SCHEMA_UNKNOWN"
        );
        assert_eq!(
            SchemaError::Malformed {
                path: "p".into(),
                reason: "r".into()
            }
            .code(),
            "TABSTORE_SCHEMA_MALFORMED_FILE"
        );
    }

    #[test]
    fn test_display_names_context() {
        let err = SchemaError::UnknownColumn {
            schema: "manifest".into(),
            column: "age".into(),
        };
        let display = err.to_string();
        assert!(display.contains("age"));
        assert!(display.contains("manifest"));
    }
}
