//! Key-based upsert and concatenation

use std::collections::HashMap;
use std::sync::Arc;

use super::errors::TableResult;
use super::record_set::RecordSet;
use super::value::{Record, Value};
use crate::observability::{log_event, Event};

impl RecordSet {
    /// Upserts rows by the declared index columns.
    ///
    /// The incoming rows are validated as a whole before anything changes. A
    /// row whose key matches an existing row replaces it in place; any other
    /// row is appended. Rows are stored as given, not default-filled.
    ///
    /// The active index is reset whether or not the upsert succeeds.
    pub fn add_or_update_records(&mut self, records: Vec<Record>) -> TableResult<()> {
        let result = self.upsert(records);
        self.reset_index();
        result
    }

    fn upsert(&mut self, records: Vec<Record>) -> TableResult<()> {
        let mut incoming = RecordSet::from_records(Arc::clone(self.schema()), records.clone());
        incoming.set_index_columns(self.index_columns());
        incoming.validate()?;

        for record in &records {
            for column in record.keys() {
                self.ensure_column(column);
            }
        }

        let key_columns = if self.index_columns().is_empty() {
            self.all_columns()
        } else {
            self.index_columns().to_vec()
        };
        let columns = self.all_columns();

        let mut positions: HashMap<Vec<Value>, usize> = self
            .records()
            .iter()
            .enumerate()
            .map(|(position, row)| (self.key_of(row, &key_columns), position))
            .collect();

        let (mut added, mut updated) = (0usize, 0usize);
        for mut record in records {
            let row: Record = columns
                .iter()
                .map(|c| (c.clone(), record.remove(c).unwrap_or(Value::Missing)))
                .collect();
            let key = self.key_of(&row, &key_columns);

            match positions.get(&key) {
                Some(&position) => {
                    self.rows_mut()[position] = row;
                    updated += 1;
                }
                None => {
                    positions.insert(key, self.len());
                    self.rows_mut().push(row);
                    added += 1;
                }
            }
        }

        let added = added.to_string();
        let updated = updated.to_string();
        log_event(
            Event::MergeApplied,
            &[
                ("added", added.as_str()),
                ("schema", self.schema().name()),
                ("updated", updated.as_str()),
            ],
        );
        Ok(())
    }

    /// Rows of `self` followed by rows of `other`.
    ///
    /// With `validate` set the result is validated, so colliding keys fail.
    pub fn concatenate(&self, other: &RecordSet, validate: bool) -> TableResult<RecordSet> {
        let mut records = self.to_records();
        records.extend(other.to_records());

        let mut combined = RecordSet::from_records(Arc::clone(self.schema()), records);
        combined.set_index_columns(self.index_columns());

        if validate {
            combined.validate()
        } else {
            Ok(combined)
        }
    }
}
