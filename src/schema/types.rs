//! Schema type definitions
//!
//! Supported column types:
//! - string: UTF-8 string
//! - int: 64-bit signed integer
//! - float: 64-bit floating point
//! - bool: Boolean
//! - list: list of strings

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::errors::{SchemaError, SchemaResult};
use crate::table::Value;

/// Semantic column types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// UTF-8 string
    String,
    /// 64-bit signed integer
    Int,
    /// 64-bit floating point
    Float,
    /// Boolean
    Bool,
    /// List of strings
    List,
}

impl ColumnType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Int => "int",
            ColumnType::Float => "float",
            ColumnType::Bool => "bool",
            ColumnType::List => "list",
        }
    }
}

/// Column definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawColumn", into = "RawColumn")]
pub struct ColumnDef {
    /// Column name
    pub name: String,
    /// Column data type
    pub column_type: ColumnType,
    /// Whether the column must be present with a value in every row
    pub required: bool,
    /// Value used when an optional column is missing
    pub default: Option<Value>,
    /// Human description
    pub description: Option<String>,
    /// Closed set of accepted values (string columns only)
    pub allowed_values: Option<Vec<String>>,
}

impl ColumnDef {
    fn new(name: impl Into<String>, column_type: ColumnType, required: bool) -> Self {
        Self {
            name: name.into(),
            column_type,
            required,
            default: None,
            description: None,
            allowed_values: None,
        }
    }

    /// Create a required string column
    pub fn required_string(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::String, true)
    }

    /// Create an optional string column
    pub fn optional_string(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::String, false)
    }

    /// Create a required int column
    pub fn required_int(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Int, true)
    }

    /// Create an optional int column
    pub fn optional_int(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Int, false)
    }

    /// Create an optional float column
    pub fn optional_float(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Float, false)
    }

    /// Create a required bool column
    pub fn required_bool(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Bool, true)
    }

    /// Create an optional bool column
    pub fn optional_bool(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Bool, false)
    }

    /// Create an optional list column defaulting to the empty list
    pub fn optional_list(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::List, false).with_default(Value::List(Vec::new()))
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_allowed_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Checks the definition itself and normalizes the default to the column type.
    fn check(&mut self, schema: &str) -> SchemaResult<()> {
        let invalid = |reason: String| SchemaError::InvalidSchema {
            schema: schema.to_string(),
            reason,
        };

        if self.name.is_empty() {
            return Err(invalid("column names must not be empty".into()));
        }

        if let Some(default) = &self.default {
            if self.required && !default.is_missing() {
                return Err(invalid(format!(
                    "required column '{}' cannot have a default",
                    self.name
                )));
            }
            let coerced = default.coerce(self.column_type).map_err(|found| {
                invalid(format!(
                    "default for column '{}' must be {}, got {}",
                    self.name,
                    self.column_type.type_name(),
                    found
                ))
            })?;
            self.default = if coerced.is_missing() { None } else { Some(coerced) };
        }

        if self.allowed_values.is_some() && self.column_type != ColumnType::String {
            return Err(invalid(format!(
                "allowed values are only supported on string columns ('{}')",
                self.name
            )));
        }

        Ok(())
    }
}

/// Serialized form of a column definition
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawColumn {
    name: String,
    #[serde(rename = "type")]
    column_type: ColumnType,
    #[serde(default)]
    required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    allowed_values: Option<Vec<String>>,
}

impl TryFrom<RawColumn> for ColumnDef {
    type Error = String;

    fn try_from(raw: RawColumn) -> Result<Self, Self::Error> {
        let default = raw
            .default
            .as_ref()
            .map(Value::from_json)
            .transpose()
            .map_err(|e| format!("column '{}': {}", raw.name, e))?;

        Ok(Self {
            name: raw.name,
            column_type: raw.column_type,
            required: raw.required,
            default,
            description: raw.description,
            allowed_values: raw.allowed_values,
        })
    }
}

impl From<ColumnDef> for RawColumn {
    fn from(def: ColumnDef) -> Self {
        Self {
            name: def.name,
            column_type: def.column_type,
            required: def.required,
            default: def.default.as_ref().map(Value::to_json),
            description: def.description,
            allowed_values: def.allowed_values,
        }
    }
}

/// Complete schema definition for one record kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSchema", into = "RawSchema")]
pub struct Schema {
    name: String,
    description: Option<String>,
    columns: Vec<ColumnDef>,
    index_columns: Vec<String>,
    allow_extra_columns: bool,
}

/// Serialized form of a schema
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawSchema {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    columns: Vec<ColumnDef>,
    #[serde(default)]
    index_columns: Vec<String>,
    #[serde(default)]
    allow_extra_columns: bool,
}

impl TryFrom<RawSchema> for Schema {
    type Error = SchemaError;

    fn try_from(raw: RawSchema) -> Result<Self, Self::Error> {
        let mut schema = Schema::new(raw.name, raw.columns, raw.index_columns)?;
        schema.description = raw.description;
        schema.allow_extra_columns = raw.allow_extra_columns;
        Ok(schema)
    }
}

impl From<Schema> for RawSchema {
    fn from(schema: Schema) -> Self {
        Self {
            name: schema.name,
            description: schema.description,
            columns: schema.columns,
            index_columns: schema.index_columns,
            allow_extra_columns: schema.allow_extra_columns,
        }
    }
}

impl Schema {
    /// Create a new schema, checking its structure.
    pub fn new<I, S>(
        name: impl Into<String>,
        columns: Vec<ColumnDef>,
        index_columns: I,
    ) -> SchemaResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut schema = Self {
            name: name.into(),
            description: None,
            columns,
            index_columns: index_columns.into_iter().map(Into::into).collect(),
            allow_extra_columns: false,
        };
        schema.validate_structure()?;
        Ok(schema)
    }

    /// Reads a schema from a JSON file.
    pub fn from_json_file(path: &Path) -> SchemaResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| SchemaError::Malformed {
            path: path.display().to_string(),
            reason: format!("Failed to read file: {}", e),
        })?;

        serde_json::from_str(&content).map_err(|e| SchemaError::Malformed {
            path: path.display().to_string(),
            reason: format!("Invalid schema JSON: {}", e),
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Tolerate columns the schema does not declare.
    pub fn with_extra_columns(mut self, allow: bool) -> Self {
        self.allow_extra_columns = allow;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Default uniqueness/merge key for record sets of this kind
    pub fn index_columns(&self) -> &[String] {
        &self.index_columns
    }

    pub fn allows_extra_columns(&self) -> bool {
        self.allow_extra_columns
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn get(&self, column: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == column)
    }

    /// Declaration order of a column, if declared.
    pub fn position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == column)
    }

    /// Looks up a column definition.
    pub fn column(&self, column: &str) -> SchemaResult<&ColumnDef> {
        self.get(column).ok_or_else(|| SchemaError::UnknownColumn {
            schema: self.name.clone(),
            column: column.to_string(),
        })
    }

    pub fn is_required(&self, column: &str) -> SchemaResult<bool> {
        Ok(self.column(column)?.required)
    }

    pub fn default_for(&self, column: &str) -> SchemaResult<Option<&Value>> {
        Ok(self.column(column)?.default.as_ref())
    }

    pub fn column_type(&self, column: &str) -> SchemaResult<ColumnType> {
        Ok(self.column(column)?.column_type)
    }

    /// Validates the schema structure itself (not a record set)
    fn validate_structure(&mut self) -> SchemaResult<()> {
        if self.name.is_empty() {
            return Err(SchemaError::InvalidSchema {
                schema: self.name.clone(),
                reason: "schema name must not be empty".into(),
            });
        }

        let mut seen = HashSet::new();
        for column in &mut self.columns {
            column.check(&self.name)?;
            if !seen.insert(column.name.clone()) {
                return Err(SchemaError::InvalidSchema {
                    schema: self.name.clone(),
                    reason: format!("duplicate column '{}'", column.name),
                });
            }
        }

        let mut seen_index = HashSet::new();
        for index_column in &self.index_columns {
            if !seen.contains(index_column) {
                return Err(SchemaError::InvalidSchema {
                    schema: self.name.clone(),
                    reason: format!("index column '{}' is not declared", index_column),
                });
            }
            if !seen_index.insert(index_column) {
                return Err(SchemaError::InvalidSchema {
                    schema: self.name.clone(),
                    reason: format!("index column '{}' listed twice", index_column),
                });
            }
        }

        Ok(())
    }
}
