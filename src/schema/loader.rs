//! Schema registry
//!
//! Resolves record kinds to schemas. The built-in kinds are always present;
//! additional schemas are loaded from a directory of `<name>.json` files.
//! A registered name can never be replaced.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::builtin;
use super::errors::{SchemaError, SchemaResult};
use super::types::Schema;

/// In-memory registry of schemas keyed by name.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, Arc<Schema>>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in record kinds.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for schema in builtin::all() {
            registry
                .schemas
                .insert(schema.name().to_string(), Arc::new(schema));
        }
        registry
    }

    /// Loads every `*.json` schema file in a directory.
    ///
    /// A missing directory loads nothing. Returns the number of schemas added.
    pub fn load_dir(&mut self, schema_dir: &Path) -> SchemaResult<usize> {
        if !schema_dir.exists() {
            return Ok(0);
        }

        let entries = fs::read_dir(schema_dir).map_err(|e| SchemaError::Malformed {
            path: schema_dir.display().to_string(),
            reason: format!("Failed to read schema directory: {}", e),
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| SchemaError::Malformed {
                path: schema_dir.display().to_string(),
                reason: format!("Failed to read directory entry: {}", e),
            })?;

            let path = entry.path();
            if path.extension().map_or(true, |ext| ext != "json") {
                continue;
            }
            paths.push(path);
        }

        // Directory order is not stable across filesystems
        paths.sort();

        for path in &paths {
            self.load_file(path)?;
        }

        Ok(paths.len())
    }

    /// Loads a single schema file and registers it.
    pub fn load_file(&mut self, path: &Path) -> SchemaResult<Arc<Schema>> {
        let schema = Schema::from_json_file(path)?;
        self.register(schema)
    }

    /// Registers a schema programmatically.
    pub fn register(&mut self, schema: Schema) -> SchemaResult<Arc<Schema>> {
        if self.schemas.contains_key(schema.name()) {
            return Err(SchemaError::AlreadyRegistered(schema.name().to_string()));
        }

        let schema = Arc::new(schema);
        self.schemas
            .insert(schema.name().to_string(), Arc::clone(&schema));
        Ok(schema)
    }

    /// Resolves a schema by name.
    pub fn get(&self, name: &str) -> SchemaResult<Arc<Schema>> {
        self.schemas
            .get(name)
            .cloned()
            .ok_or_else(|| SchemaError::UnknownSchema(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Registered schema names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.schemas.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Writes a schema as `<dir>/<name>.json`, refusing to overwrite.
    pub fn save_schema(schema: &Schema, schema_dir: &Path) -> SchemaResult<PathBuf> {
        let path = schema_dir.join(format!("{}.json", schema.name()));

        if path.exists() {
            return Err(SchemaError::AlreadyRegistered(schema.name().to_string()));
        }

        fs::create_dir_all(schema_dir).map_err(|e| SchemaError::Malformed {
            path: schema_dir.display().to_string(),
            reason: format!("Failed to create schema directory: {}", e),
        })?;

        let content = serde_json::to_string_pretty(schema).map_err(|e| SchemaError::Malformed {
            path: path.display().to_string(),
            reason: format!("Failed to serialize schema: {}", e),
        })?;

        fs::write(&path, content).map_err(|e| SchemaError::Malformed {
            path: path.display().to_string(),
            reason: format!("Failed to write file: {}", e),
        })?;

        Ok(path)
    }
}
