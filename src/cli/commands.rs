//! CLI command implementations
//!
//! Each command resolves a configured table, does its work through the
//! library API, and returns the JSON payload written to stdout. Commands
//! never print directly; `run_command` owns the output.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{json, Map, Value as Json};

use crate::backup::{list_snapshots, resolve_reference};
use crate::config::{StoreConfig, TableLayout};
use crate::observability::Logger;
use crate::schema::Schema;
use crate::table::RecordSet;

use super::args::{Cli, Command};
use super::errors::CliResult;
use super::io::{write_error, write_response};

/// A configured table ready to be read
struct OpenTable {
    config: StoreConfig,
    layout: TableLayout,
    schema: Arc<Schema>,
}

fn open_table(config_path: &Path, table: &str) -> CliResult<OpenTable> {
    let config = StoreConfig::load(config_path)?;
    let layout = config.table(table)?;
    let schema = config.schema_registry()?.get(&layout.schema)?;
    Ok(OpenTable {
        config,
        layout,
        schema,
    })
}

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    if let Some(level) = cli.log_level {
        Logger::init(level);
    }
    run_command(cli.command)
}

/// Run a command, writing its response (or error) as JSON to stdout.
pub fn run_command(cmd: Command) -> CliResult<()> {
    let result = match cmd {
        Command::Validate {
            config,
            table,
            file,
        } => validate(&config, &table, file.as_deref()),
        Command::Diff {
            config,
            table,
            other,
            columns,
        } => diff(&config, &table, &other, &columns),
        Command::Merge {
            config,
            table,
            input,
            dry_run,
        } => merge(&config, &table, &input, dry_run),
        Command::History { config, table } => history(&config, &table),
    };

    match result {
        Ok(data) => write_response(data),
        Err(e) => {
            write_error(e.code(), &e.to_string())?;
            Err(e)
        }
    }
}

/// Validate a table's reference (or another file) against the table schema.
pub fn validate(config_path: &Path, table: &str, file: Option<&Path>) -> CliResult<Json> {
    let open = open_table(config_path, table)?;
    let path = file.map_or_else(|| open.layout.reference.clone(), Path::to_path_buf);

    let validated = RecordSet::load(&path, open.schema, true)?;

    Ok(json!({
        "table": table,
        "path": path.display().to_string(),
        "rows": validated.len(),
        "valid": true,
    }))
}

/// Rows of the table's reference that are absent from `other`.
pub fn diff(config_path: &Path, table: &str, other: &Path, columns: &[String]) -> CliResult<Json> {
    let open = open_table(config_path, table)?;

    let current = RecordSet::load(&open.layout.reference, Arc::clone(&open.schema), false)?;
    let other = RecordSet::load(other, open.schema, false)?;

    let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
    let cols = if columns.is_empty() {
        None
    } else {
        Some(columns.as_slice())
    };
    let missing = current.get_diff(&other, cols)?;

    Ok(json!({
        "table": table,
        "count": missing.len(),
        "records": records_json(&missing),
    }))
}

/// Upsert the rows of `input` into the table and commit a snapshot.
pub fn merge(config_path: &Path, table: &str, input: &Path, dry_run: bool) -> CliResult<Json> {
    let open = open_table(config_path, table)?;
    let reference = &open.layout.reference;

    let mut current = if reference.exists() {
        RecordSet::load(reference, Arc::clone(&open.schema), false)?
    } else {
        RecordSet::empty(Arc::clone(&open.schema))
    };

    let incoming = RecordSet::load(input, Arc::clone(&open.schema), false)?;
    let incoming_rows = incoming.len();
    current.add_or_update_records(incoming.into_records())?;

    let options = open.config.backup_options(&open.layout).with_dry_run(dry_run);
    let snapshot = current.save_with_backup(reference, &options)?;

    Ok(json!({
        "table": table,
        "incoming": incoming_rows,
        "rows": current.len(),
        "dry_run": dry_run,
        "snapshot": snapshot.map(|p| p.display().to_string()),
    }))
}

/// A table's snapshots, oldest first, marking the one the reference points at.
pub fn history(config_path: &Path, table: &str) -> CliResult<Json> {
    let open = open_table(config_path, table)?;
    let reference = &open.layout.reference;

    let snapshots = list_snapshots(reference, open.layout.backup_dir_name.as_deref())?;
    let current = resolve_reference(reference)?;

    let entries: Vec<Json> = snapshots
        .iter()
        .map(|snapshot| {
            let is_current = current
                .as_deref()
                .map_or(false, |target| same_file(target, &snapshot.path));
            json!({
                "path": snapshot.path.display().to_string(),
                "timestamp": snapshot.timestamp.format("%Y-%m-%dT%H:%M").to_string(),
                "counter": snapshot.counter,
                "current": is_current,
            })
        })
        .collect();

    Ok(json!({
        "table": table,
        "reference": reference.display().to_string(),
        "snapshots": entries,
    }))
}

fn records_json(set: &RecordSet) -> Json {
    let rows = set
        .records()
        .iter()
        .map(|row| {
            let object: Map<String, Json> = row
                .iter()
                .map(|(column, value)| (column.clone(), value.to_json()))
                .collect();
            Json::Object(object)
        })
        .collect();
    Json::Array(rows)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (canonical(a), canonical(b)) {
        (Some(a), Some(b)) => a == b,
        _ => a == b,
    }
}

fn canonical(path: &Path) -> Option<PathBuf> {
    fs::canonicalize(path).ok()
}
