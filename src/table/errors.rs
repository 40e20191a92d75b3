//! Record set error types
//!
//! Error codes:
//! - TABSTORE_TABLE_VALIDATION_FAILED
//! - TABSTORE_TABLE_DUPLICATE_RECORDS
//! - TABSTORE_TABLE_UNSUPPORTED_OPTION
//! - TABSTORE_TABLE_LIKELY_CSV
//! - TABSTORE_TABLE_MALFORMED_FILE
//! - TABSTORE_TABLE_MISSING_COLUMNS
//! - TABSTORE_TABLE_ENCODE
//! - TABSTORE_TABLE_IO

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::schema::SchemaError;

/// One failing cell found during validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellError {
    /// Row position (0-based) in the record set; `None` for column-level problems
    pub row: Option<usize>,
    /// Column name
    pub column: String,
    /// Expected type or condition
    pub expected: String,
    /// What was found
    pub actual: String,
}

impl CellError {
    pub fn new(
        row: Option<usize>,
        column: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            row,
            column: column.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn missing_value(row: usize, column: impl Into<String>) -> Self {
        Self::new(Some(row), column, "a value for required column", "missing")
    }

    pub fn absent_column(column: impl Into<String>) -> Self {
        Self::new(None, column, "required column to be present", "column absent")
    }

    pub fn undeclared_column(column: impl Into<String>) -> Self {
        Self::new(None, column, "no undeclared columns", "extra column present")
    }
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.row {
            Some(row) => write!(
                f,
                "row {} column '{}': expected {}, got {}",
                row, self.column, self.expected, self.actual
            ),
            None => write!(
                f,
                "column '{}': expected {}, got {}",
                self.column, self.expected, self.actual
            ),
        }
    }
}

fn join_cells(errors: &[CellError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Record set error type
#[derive(Debug, Error)]
pub enum TableError {
    /// One or more cells failed schema checks
    #[error("Error when validating the record set with schema '{schema}': {}", join_cells(.errors))]
    Validation {
        schema: String,
        errors: Vec<CellError>,
    },

    /// Rows collide under the uniqueness key
    #[error("Duplicate records found for key columns {key_columns:?} at rows {rows:?}")]
    DuplicateRecords {
        key_columns: Vec<String>,
        rows: Vec<usize>,
    },

    /// Caller asked for a parse override on the fixed format
    #[error("This function does not accept the '{option}' option: the file format is fixed (tab-separated, header row)")]
    UnsupportedOption { option: String },

    /// Content looks comma-separated
    #[error("It looks like the file at {} might be a CSV file. Make sure it is tab-separated", .path.display())]
    LikelyCsv { path: PathBuf },

    /// File content could not be parsed
    #[error("Malformed file {}: {reason}", .path.display())]
    Malformed { path: PathBuf, reason: String },

    /// Diff/selection requested columns absent from one side
    #[error("The columns {columns:?} are not present in both record sets")]
    MissingColumns { columns: Vec<String> },

    /// Record set could not be rendered as TSV
    #[error("Failed to encode record set: {0}")]
    Encode(String),

    /// Filesystem failure
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl TableError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        TableError::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            TableError::Validation { .. } => "TABSTORE_TABLE_VALIDATION_FAILED",
            TableError::DuplicateRecords { .. } => "TABSTORE_TABLE_DUPLICATE_RECORDS",
            TableError::UnsupportedOption { .. } => "TABSTORE_TABLE_UNSUPPORTED_OPTION",
            TableError::LikelyCsv { .. } => "TABSTORE_TABLE_LIKELY_CSV",
            TableError::Malformed { .. } => "TABSTORE_TABLE_MALFORMED_FILE",
            TableError::MissingColumns { .. } => "TABSTORE_TABLE_MISSING_COLUMNS",
            TableError::Encode(_) => "TABSTORE_TABLE_ENCODE",
            TableError::Io { .. } => "TABSTORE_TABLE_IO",
            TableError::Schema(e) => e.code(),
        }
    }

    /// Whether the caller can fix its input and retry
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            TableError::Validation { .. } | TableError::DuplicateRecords { .. }
        )
    }
}

/// Result type for record set operations
pub type TableResult<T> = Result<T, TableError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display_lists_cells() {
        let err = TableError::Validation {
            schema: "manifest".into(),
            errors: vec![
                CellError::missing_value(0, "visit_id"),
                CellError::new(Some(2), "b", "int", "string 'b'"),
                CellError::absent_column("a"),
            ],
        };
        let display = err.to_string();
        assert!(display.contains("Error when validating"));
        assert!(display.contains("row 0 column 'visit_id'"));
        assert!(display.contains("row 2 column 'b'"));
        assert!(display.contains("column 'a': expected required column to be present"));
    }

    #[test]
    fn test_likely_csv_names_path() {
        let err = TableError::LikelyCsv {
            path: PathBuf::from("/data/manifest.csv"),
        };
        assert!(err.to_string().contains("/data/manifest.csv"));
        assert!(err.to_string().contains("might be a CSV"));
    }

    #[test]
    fn test_codes() {
        let err = TableError::MissingColumns {
            columns: vec!["b".into()],
        };
        assert_eq!(err.code(), "TABSTORE_TABLE_MISSING_COLUMNS");
        assert!(!err.is_validation());

        let err = TableError::from(SchemaError::UnknownSchema("x".into()));
        assert_eq!(err.code(), "TABSTORE_SCHEMA_UNKNOWN");
    }
}
