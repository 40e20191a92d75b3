//! CLI error types
//!
//! Every CLI error ends the process with a non-zero exit status.

use std::io;

use thiserror::Error;

use crate::backup::BackupError;
use crate::config::ConfigError;
use crate::schema::SchemaError;
use crate::table::TableError;

/// CLI error
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Backup(#[from] BackupError),

    /// stdout could not be written
    #[error("Failed to write output: {0}")]
    Output(String),
}

impl CliError {
    /// Returns the stable error code of the underlying failure
    pub fn code(&self) -> &'static str {
        match self {
            CliError::Config(e) => e.code(),
            CliError::Schema(e) => e.code(),
            CliError::Table(e) => e.code(),
            CliError::Backup(e) => e.code(),
            CliError::Output(_) => "TABSTORE_CLI_OUTPUT",
        }
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::Output(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::Output(format!("JSON error: {}", e))
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
