//! Typed validation of record sets
//!
//! Validation is a pure check. It never repairs the receiver: on success it
//! returns a new record set holding every schema column in schema order, with
//! values coerced to their declared types and missing optional values replaced
//! by defaults.
//!
//! Checks, all collected before failing:
//! - every required column is present and has a value in every row
//! - every value coerces to its column type (and is an allowed value if the
//!   column declares a closed set)
//! - no undeclared columns, unless the schema tolerates them
//!
//! Duplicate detection runs only once the cells are clean, over the declared
//! index columns (or every column when there is no index).

use std::collections::HashMap;
use std::sync::Arc;

use super::errors::{CellError, TableError, TableResult};
use super::record_set::RecordSet;
use super::value::{Record, Value};
use crate::observability::{log_event, Event};
use crate::schema::ColumnDef;

impl RecordSet {
    /// Validates against the schema, returning the typed record set.
    pub fn validate(&self) -> TableResult<RecordSet> {
        let result = self.validate_inner();
        match &result {
            Ok(validated) => {
                let rows = validated.len().to_string();
                log_event(
                    Event::TableValidated,
                    &[("rows", rows.as_str()), ("schema", self.schema().name())],
                );
            }
            Err(e) => {
                let message = e.to_string();
                log_event(
                    Event::ValidationFailed,
                    &[
                        ("code", e.code()),
                        ("error", message.as_str()),
                        ("schema", self.schema().name()),
                    ],
                );
            }
        }
        result
    }

    /// Validation without logging, for internal comparisons.
    pub(crate) fn validate_inner(&self) -> TableResult<RecordSet> {
        let schema = Arc::clone(self.schema());
        let present = self.all_columns();
        let mut errors = Vec::new();

        let extras: Vec<String> = present
            .iter()
            .filter(|c| !schema.contains(c))
            .cloned()
            .collect();
        if !schema.allows_extra_columns() {
            errors.extend(extras.iter().map(CellError::undeclared_column));
        }

        for def in schema.columns() {
            if def.required && !present.contains(&def.name) {
                errors.push(CellError::absent_column(&def.name));
            }
        }

        let mut rows = Vec::with_capacity(self.len());
        for (position, row) in self.records().iter().enumerate() {
            let mut typed = Record::new();
            for def in schema.columns() {
                let column_present = present.contains(&def.name);
                let value = match check_cell(position, def, row.get(&def.name), column_present) {
                    Ok(value) => value,
                    Err(error) => {
                        errors.push(error);
                        Value::Missing
                    }
                };
                typed.insert(def.name.clone(), value);
            }
            if schema.allows_extra_columns() {
                for extra in &extras {
                    let value = row.get(extra).cloned().unwrap_or(Value::Missing);
                    typed.insert(extra.clone(), value);
                }
            }
            rows.push(typed);
        }

        if !errors.is_empty() {
            return Err(TableError::Validation {
                schema: schema.name().to_string(),
                errors,
            });
        }

        let mut columns = schema.column_names();
        if schema.allows_extra_columns() {
            columns.extend(extras);
        }

        let key_columns = if self.index_columns().is_empty() {
            columns.clone()
        } else {
            self.index_columns().to_vec()
        };
        check_duplicates(&rows, &key_columns)?;

        let mut validated = RecordSet::from_parts(schema, columns, rows);
        validated.set_index_columns(self.index_columns());
        Ok(validated)
    }
}

/// Coerces one cell, applying the default for a missing optional value.
fn check_cell(
    position: usize,
    def: &ColumnDef,
    raw: Option<&Value>,
    column_present: bool,
) -> Result<Value, CellError> {
    let raw = raw.cloned().unwrap_or(Value::Missing);
    let value = raw
        .coerce(def.column_type)
        .map_err(|found| CellError::new(Some(position), &def.name, def.column_type.type_name(), found))?;

    if value.is_missing() {
        if def.required {
            // An absent required column is reported once, not per row
            return if column_present {
                Err(CellError::missing_value(position, &def.name))
            } else {
                Ok(Value::Missing)
            };
        }
        return Ok(def.default.clone().unwrap_or(Value::Missing));
    }

    if let (Some(allowed), Value::Str(s)) = (&def.allowed_values, &value) {
        if !allowed.iter().any(|a| a == s) {
            return Err(CellError::new(
                Some(position),
                &def.name,
                format!("one of {:?}", allowed),
                format!("'{}'", s),
            ));
        }
    }

    Ok(value)
}

static MISSING: Value = Value::Missing;

/// Rejects rows that share a key, listing every row involved.
fn check_duplicates(rows: &[Record], key_columns: &[String]) -> TableResult<()> {
    let mut seen: HashMap<Vec<&Value>, Vec<usize>> = HashMap::new();
    for (position, row) in rows.iter().enumerate() {
        let key = key_columns
            .iter()
            .map(|c| row.get(c).unwrap_or(&MISSING))
            .collect();
        seen.entry(key).or_default().push(position);
    }

    let mut duplicated: Vec<usize> = seen
        .into_values()
        .filter(|positions| positions.len() > 1)
        .flatten()
        .collect();
    if duplicated.is_empty() {
        return Ok(());
    }

    duplicated.sort_unstable();
    Err(TableError::DuplicateRecords {
        key_columns: key_columns.to_vec(),
        rows: duplicated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;
    use crate::schema::{builtin, Schema};

    fn schema() -> Arc<Schema> {
        Arc::new(
            Schema::new(
                "sample",
                vec![
                    ColumnDef::required_string("a"),
                    ColumnDef::optional_int("b").with_default(0),
                    ColumnDef::optional_list("c"),
                ],
                ["b"],
            )
            .unwrap(),
        )
    }

    fn set(records: Vec<Record>) -> RecordSet {
        RecordSet::from_records(schema(), records)
    }

    #[test]
    fn test_valid_rows() {
        let cases = vec![
            record! { "a" => "A", "b" => 1 },
            record! { "a" => "AA", "b" => Value::Missing },
            record! { "a" => "A", "b" => "0" },
        ];
        for row in cases {
            assert!(set(vec![row.clone()]).validate().is_ok(), "{:?}", row);
        }
    }

    #[test]
    fn test_invalid_rows() {
        let cases = vec![record! { "a" => 1, "b" => 1 }, record! { "a" => "A", "b" => "b" }];
        for row in cases {
            let err = set(vec![row]).validate().unwrap_err();
            assert!(err.to_string().contains("Error when validating"));
            assert_eq!(err.code(), "TABSTORE_TABLE_VALIDATION_FAILED");
        }
    }

    #[test]
    fn test_validated_copy_is_typed_and_complete() {
        let original = set(vec![record! { "a" => "A", "b" => "7" }]);
        let validated = original.validate().unwrap();

        assert_eq!(validated.columns(), ["a", "b", "c"]);
        assert_eq!(validated.records()[0]["b"], Value::Int(7));
        assert_eq!(validated.records()[0]["c"], Value::List(vec![]));
        // Receiver untouched
        assert_eq!(original.records()[0]["b"], Value::from("7"));
        assert_eq!(original.columns(), ["a", "b"]);
    }

    #[test]
    fn test_missing_optional_gets_default() {
        let validated = set(vec![record! { "a" => "A" }]).validate().unwrap();
        assert_eq!(validated.records()[0]["b"], Value::Int(0));
    }

    #[test]
    fn test_all_required_columns_present() {
        let err = set(vec![record! { "b" => 0 }]).validate().unwrap_err();
        match err {
            TableError::Validation { errors, .. } => {
                assert_eq!(errors, vec![CellError::absent_column("a")]);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_errors_are_collected() {
        let err = set(vec![
            record! { "a" => "A", "b" => "x" },
            record! { "a" => Value::Missing, "b" => 2 },
            record! { "a" => "C", "b" => "y" },
        ])
        .validate()
        .unwrap_err();

        match err {
            TableError::Validation { errors, .. } => {
                let rows: Vec<_> = errors.iter().map(|e| e.row).collect();
                assert_eq!(rows, vec![Some(0), Some(1), Some(2)]);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_undeclared_column_rejected() {
        let err = set(vec![record! { "a" => "A", "zz" => "?" }]).validate().unwrap_err();
        assert!(err.to_string().contains("column 'zz'"));
    }

    #[test]
    fn test_undeclared_column_tolerated() {
        let schema = Arc::new(
            Schema::new("loose", vec![ColumnDef::required_string("a")], Vec::<String>::new())
                .unwrap()
                .with_extra_columns(true),
        );
        let validated = RecordSet::from_records(schema, vec![record! { "a" => "A", "zz" => "?" }])
            .validate()
            .unwrap();
        assert_eq!(validated.columns(), ["a", "zz"]);
    }

    #[test]
    fn test_duplicate_records() {
        let cases = vec![
            vec![record! { "a" => "A", "b" => 1 }, record! { "a" => "A", "b" => 1 }],
            vec![record! { "a" => "A", "b" => 1 }, record! { "a" => "AA", "b" => 1 }],
            vec![
                record! { "a" => "A", "b" => 1 },
                record! { "a" => "AA", "b" => 1 },
                record! { "a" => "AAA", "b" => 2 },
            ],
        ];
        for rows in cases {
            let err = set(rows).validate().unwrap_err();
            assert!(err.to_string().contains("Duplicate records"));
        }
    }

    #[test]
    fn test_duplicates_compare_coerced_keys() {
        let err = set(vec![record! { "a" => "A", "b" => "1" }, record! { "a" => "B", "b" => 1 }])
            .validate()
            .unwrap_err();
        match err {
            TableError::DuplicateRecords { key_columns, rows } => {
                assert_eq!(key_columns, vec!["b".to_string()]);
                assert_eq!(rows, vec![0, 1]);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_duplicates_without_index_use_all_columns() {
        let schema = Arc::new(
            Schema::new(
                "unkeyed",
                vec![ColumnDef::required_string("a"), ColumnDef::optional_int("b")],
                Vec::<String>::new(),
            )
            .unwrap(),
        );
        let distinct = RecordSet::from_records(
            Arc::clone(&schema),
            vec![record! { "a" => "A", "b" => 1 }, record! { "a" => "A", "b" => 2 }],
        );
        assert!(distinct.validate().is_ok());

        let same = RecordSet::from_records(
            schema,
            vec![record! { "a" => "A", "b" => 1 }, record! { "a" => "A", "b" => 1 }],
        );
        assert!(same.validate().is_err());
    }

    #[test]
    fn test_allowed_values() {
        let schema = Arc::new(builtin::processing_status());
        let mut row = record! {
            "participant_id" => "01",
            "bids_participant_id" => "sub-01",
            "session_id" => "BL",
            "bids_session_id" => "ses-BL",
            "pipeline_name" => "fmriprep",
            "pipeline_version" => "23.1.3",
            "pipeline_step" => "default",
            "status" => "SUCCESS",
        };
        let ok = RecordSet::from_records(Arc::clone(&schema), vec![row.clone()]);
        assert!(ok.validate().is_ok());

        row.insert("status".into(), Value::from("DONE"));
        let err = RecordSet::from_records(schema, vec![row]).validate().unwrap_err();
        assert!(err.to_string().contains("'DONE'"));
    }

    #[test]
    fn test_overridden_key_is_kept() {
        let mut original = set(vec![record! { "a" => "A", "b" => 1 }, record! { "a" => "B", "b" => 1 }]);
        original.set_index_columns(&["a", "b"]);
        let validated = original.validate().unwrap();
        assert_eq!(validated.index_columns(), ["a".to_string(), "b".to_string()]);
    }
}
