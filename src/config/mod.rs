//! Store configuration
//!
//! A JSON file declaring where a dataset lives and which tables it holds:
//!
//! ```json
//! {
//!   "dataset_root": "/data/study",
//!   "schema_dir": "schemas",
//!   "use_relative_links": true,
//!   "tables": {
//!     "manifest": { "path": "manifest.tsv", "schema": "manifest" }
//!   }
//! }
//! ```
//!
//! Relative table paths and `schema_dir` resolve against `dataset_root`.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backup::BackupOptions;
use crate::observability::{log_event, Event};
use crate::schema::{SchemaError, SchemaRegistry};

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid config JSON in {}: {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("Unknown table '{0}'")]
    UnknownTable(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl ConfigError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Read { .. } => "TABSTORE_CONFIG_READ",
            ConfigError::Parse { .. } => "TABSTORE_CONFIG_PARSE",
            ConfigError::Invalid(_) => "TABSTORE_CONFIG_INVALID",
            ConfigError::UnknownTable(_) => "TABSTORE_CONFIG_UNKNOWN_TABLE",
            ConfigError::Schema(e) => e.code(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Dataset root directory (required)
    pub dataset_root: PathBuf,

    /// Directory of extra `*.json` schemas (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_dir: Option<PathBuf>,

    /// Link references with relative paths (optional, default true)
    #[serde(default = "default_use_relative_links")]
    pub use_relative_links: bool,

    /// Tables by name
    #[serde(default)]
    pub tables: BTreeMap<String, TableEntry>,
}

fn default_use_relative_links() -> bool {
    true
}

/// One table entry in the configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableEntry {
    /// Reference path
    pub path: PathBuf,
    /// Schema (record kind) name
    pub schema: String,
    /// Backup directory name override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_dir: Option<String>,
}

/// Resolved location and kind of a configured table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout {
    pub name: String,
    /// Absolute (or root-relative) reference path
    pub reference: PathBuf,
    pub schema: String,
    pub backup_dir_name: Option<String>,
}

impl StoreConfig {
    /// Load and validate configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: StoreConfig = serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let registry = config.schema_registry()?;
        config.validate(&registry)?;

        let config_display = path.display().to_string();
        let tables = config.tables.len().to_string();
        log_event(
            Event::ConfigLoaded,
            &[
                ("config", config_display.as_str()),
                ("tables", tables.as_str()),
            ],
        );

        Ok(config)
    }

    /// Validates the configuration against a schema registry.
    pub fn validate(&self, registry: &SchemaRegistry) -> ConfigResult<()> {
        if self.dataset_root.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("dataset_root must not be empty".into()));
        }

        for (name, entry) in &self.tables {
            if entry.path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "table '{}' has an empty path",
                    name
                )));
            }
            if !registry.contains(&entry.schema) {
                return Err(ConfigError::Invalid(format!(
                    "table '{}' uses unknown schema '{}'",
                    name, entry.schema
                )));
            }
        }

        Ok(())
    }

    /// Resolved schema directory, if configured
    pub fn schema_path(&self) -> Option<PathBuf> {
        self.schema_dir.as_ref().map(|dir| self.dataset_root.join(dir))
    }

    /// Built-in schemas plus those in the schema directory.
    pub fn schema_registry(&self) -> ConfigResult<SchemaRegistry> {
        let mut registry = SchemaRegistry::with_builtins();
        if let Some(dir) = self.schema_path() {
            registry.load_dir(&dir)?;
        }
        Ok(registry)
    }

    /// Resolves a configured table by name.
    pub fn table(&self, name: &str) -> ConfigResult<TableLayout> {
        let entry = self
            .tables
            .get(name)
            .ok_or_else(|| ConfigError::UnknownTable(name.to_string()))?;

        Ok(TableLayout {
            name: name.to_string(),
            reference: self.dataset_root.join(&entry.path),
            schema: entry.schema.clone(),
            backup_dir_name: entry.backup_dir.clone(),
        })
    }

    /// Backup options for a table under this configuration.
    pub fn backup_options(&self, layout: &TableLayout) -> BackupOptions {
        BackupOptions {
            backup_dir_name: layout.backup_dir_name.clone(),
            use_relative_path: self.use_relative_links,
            dry_run: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnDef, Schema};
    use serde_json::json;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, config: serde_json::Value) -> PathBuf {
        let path = dir.path().join("tabstore.json");
        fs::write(&path, config.to_string()).unwrap();
        path
    }

    #[test]
    fn test_load_minimal() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, json!({ "dataset_root": dir.path() }));

        let config = StoreConfig::load(&path).unwrap();
        assert!(config.use_relative_links);
        assert!(config.tables.is_empty());
    }

    #[test]
    fn test_table_resolves_against_root() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            json!({
                "dataset_root": "/data/study",
                "tables": {
                    "processing_status": {
                        "path": "derivatives/processing_status.tsv",
                        "schema": "processing_status",
                        "backup_dir": ".processing_statuses"
                    }
                }
            }),
        );

        let config = StoreConfig::load(&path).unwrap();
        let layout = config.table("processing_status").unwrap();
        assert_eq!(
            layout.reference,
            PathBuf::from("/data/study/derivatives/processing_status.tsv")
        );
        assert_eq!(layout.schema, "processing_status");
        assert_eq!(layout.backup_dir_name.as_deref(), Some(".processing_statuses"));

        let options = config.backup_options(&layout);
        assert!(options.use_relative_path);
        assert!(!options.dry_run);
    }

    #[test]
    fn test_unknown_table() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, json!({ "dataset_root": dir.path() }));

        let err = StoreConfig::load(&path).unwrap().table("nope").unwrap_err();
        assert_eq!(err.code(), "TABSTORE_CONFIG_UNKNOWN_TABLE");
    }

    #[test]
    fn test_rejects_empty_root() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, json!({ "dataset_root": "" }));
        assert_eq!(StoreConfig::load(&path).unwrap_err().code(), "TABSTORE_CONFIG_INVALID");
    }

    #[test]
    fn test_rejects_empty_table_path() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            json!({
                "dataset_root": dir.path(),
                "tables": { "manifest": { "path": "", "schema": "manifest" } }
            }),
        );
        assert!(StoreConfig::load(&path).is_err());
    }

    #[test]
    fn test_rejects_unknown_schema() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            json!({
                "dataset_root": dir.path(),
                "tables": { "visits": { "path": "visits.tsv", "schema": "visits" } }
            }),
        );
        let err = StoreConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("unknown schema 'visits'"));
    }

    #[test]
    fn test_schema_dir_extends_registry() {
        let dir = TempDir::new().unwrap();
        let schema = Schema::new(
            "visits",
            vec![ColumnDef::required_string("participant_id")],
            ["participant_id"],
        )
        .unwrap();
        SchemaRegistry::save_schema(&schema, &dir.path().join("schemas")).unwrap();

        let path = write_config(
            &dir,
            json!({
                "dataset_root": dir.path(),
                "schema_dir": "schemas",
                "tables": { "visits": { "path": "visits.tsv", "schema": "visits" } }
            }),
        );

        let config = StoreConfig::load(&path).unwrap();
        assert!(config.schema_registry().unwrap().contains("visits"));
    }

    #[test]
    fn test_malformed_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tabstore.json");
        fs::write(&path, "{ nope").unwrap();
        assert_eq!(StoreConfig::load(&path).unwrap_err().code(), "TABSTORE_CONFIG_PARSE");
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = StoreConfig::load(&dir.path().join("absent.json")).unwrap_err();
        assert_eq!(err.code(), "TABSTORE_CONFIG_READ");
    }
}
