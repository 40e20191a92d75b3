//! Fixed-format TSV reader and writer
//!
//! Format: tab-separated, one header row, UTF-8, no row-index column. An
//! empty cell is a missing value. The reader never infers types; every
//! non-empty cell is read as a string and typing happens in validation.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use super::errors::{TableError, TableResult};
use super::record_set::RecordSet;
use super::value::{Record, Value};
use crate::observability::{log_event, Event};
use crate::schema::{ColumnType, Schema};

const DELIMITER: u8 = b'\t';

/// Options for [`RecordSet::load_with`].
///
/// The parse overrides exist so callers get a clear rejection instead of a
/// silently misread file: the format is fixed and any override is an error.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Run validation before returning
    pub validate: bool,
    /// Field delimiter override (rejected)
    pub delimiter: Option<u8>,
    /// Column type override (rejected)
    pub dtype: Option<ColumnType>,
    /// Whitespace delimiting (rejected)
    pub whitespace_delimited: bool,
}

impl LoadOptions {
    pub fn validated() -> Self {
        Self {
            validate: true,
            ..Self::default()
        }
    }

    fn reject_overrides(&self) -> TableResult<()> {
        let option = if self.delimiter.is_some() {
            "delimiter"
        } else if self.dtype.is_some() {
            "dtype"
        } else if self.whitespace_delimited {
            "whitespace_delimited"
        } else {
            return Ok(());
        };
        Err(TableError::UnsupportedOption {
            option: option.to_string(),
        })
    }
}

impl RecordSet {
    /// Loads a TSV file, optionally validating it.
    pub fn load(path: &Path, schema: Arc<Schema>, validate: bool) -> TableResult<RecordSet> {
        let options = LoadOptions {
            validate,
            ..LoadOptions::default()
        };
        Self::load_with(path, schema, &options)
    }

    /// Loads a TSV file with explicit options.
    pub fn load_with(path: &Path, schema: Arc<Schema>, options: &LoadOptions) -> TableResult<RecordSet> {
        options.reject_overrides()?;

        let file = File::open(path).map_err(|e| TableError::io(path, e))?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(DELIMITER)
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| csv_error(path, e))?
            .iter()
            .map(str::to_string)
            .collect();
        check_header(path, &headers)?;

        let mut records = Vec::new();
        for result in reader.records() {
            let row = result.map_err(|e| csv_error(path, e))?;
            if row.len() > headers.len() {
                let line = row.position().map_or(0, |p| p.line());
                return Err(TableError::Malformed {
                    path: path.to_path_buf(),
                    reason: format!(
                        "line {} has {} fields but the header has {}",
                        line,
                        row.len(),
                        headers.len()
                    ),
                });
            }

            // Short rows are padded with missing by `from_parts`
            let record: Record = headers
                .iter()
                .zip(row.iter())
                .map(|(column, cell)| (column.clone(), Value::from_cell(cell)))
                .collect();
            records.push(record);
        }

        let set = RecordSet::from_parts(schema, headers, records);

        let rows = set.len().to_string();
        let display = path.display().to_string();
        log_event(
            Event::TableLoaded,
            &[
                ("path", display.as_str()),
                ("rows", rows.as_str()),
                ("schema", set.schema().name()),
            ],
        );

        if options.validate {
            set.validate()
        } else {
            Ok(set)
        }
    }

    /// Renders the record set as TSV bytes: header, then one line per row.
    ///
    /// Active index columns are written as ordinary leading columns.
    pub fn to_tsv(&self) -> TableResult<Vec<u8>> {
        let columns = self.all_columns();
        let mut writer = csv::WriterBuilder::new()
            .delimiter(DELIMITER)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        writer
            .write_record(&columns)
            .map_err(|e| TableError::Encode(e.to_string()))?;

        for row in self.records() {
            let cells = columns
                .iter()
                .map(|c| row.get(c).map(Value::to_cell).unwrap_or_default());
            writer
                .write_record(cells)
                .map_err(|e| TableError::Encode(e.to_string()))?;
        }

        writer
            .into_inner()
            .map_err(|e| TableError::Encode(e.to_string()))
    }

    /// Writes the record set to `path` as TSV, replacing any existing file.
    pub fn save(&self, path: &Path) -> TableResult<()> {
        let bytes = self.to_tsv()?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| TableError::io(parent, e))?;
        }

        let mut file = File::create(path).map_err(|e| TableError::io(path, e))?;
        file.write_all(&bytes).map_err(|e| TableError::io(path, e))?;
        file.sync_all().map_err(|e| TableError::io(path, e))?;
        Ok(())
    }
}

fn check_header(path: &Path, headers: &[String]) -> TableResult<()> {
    let malformed = |reason: String| TableError::Malformed {
        path: path.to_path_buf(),
        reason,
    };

    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        return Err(malformed("missing header row".to_string()));
    }

    // Heuristic: a comma-separated file read with tabs has one wide column
    if headers.len() == 1 && headers[0].contains(',') {
        return Err(TableError::LikelyCsv {
            path: path.to_path_buf(),
        });
    }

    for (position, header) in headers.iter().enumerate() {
        if header.trim().is_empty() {
            return Err(malformed(format!("empty column name at position {}", position)));
        }
        if headers[..position].contains(header) {
            return Err(malformed(format!("duplicate column name '{}'", header)));
        }
    }

    Ok(())
}

fn csv_error(path: &Path, error: csv::Error) -> TableError {
    match error.into_kind() {
        csv::ErrorKind::Io(e) => TableError::io(path, e),
        csv::ErrorKind::Utf8 { pos, err } => TableError::Malformed {
            path: path.to_path_buf(),
            reason: format!(
                "invalid UTF-8 on line {}: {}",
                pos.map_or(0, |p| p.line()),
                err
            ),
        },
        other => TableError::Malformed {
            path: path.to_path_buf(),
            reason: format!("{:?}", other),
        },
    }
}
