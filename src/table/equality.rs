//! Value-level equality between record sets
//!
//! Two record sets are equal when they hold the same rows over the same
//! columns, regardless of row order, column order, or whether a cell was
//! read as text or given typed. Each side is compared in its validated form
//! when it validates and in raw form otherwise.

use std::collections::BTreeSet;

use super::record_set::RecordSet;
use super::value::Value;
use crate::schema::ColumnType;

impl RecordSet {
    /// Whether `self` and `other` hold the same content.
    pub fn equals(&self, other: &RecordSet) -> bool {
        let (mut left, left_valid) = normalize(self);
        let (mut right, right_valid) = normalize(other);

        let columns = comparable_columns(&left);
        if columns != comparable_columns(&right) || left.len() != right.len() {
            return false;
        }

        let index = self.index_columns();
        let sort_by: Option<Vec<String>> = if !index.is_empty() && index.iter().all(|c| columns.contains(c)) {
            Some(index.to_vec())
        } else if left_valid && right_valid {
            Some(columns.iter().cloned().collect())
        } else {
            // Raw sides keep their row order
            None
        };

        if let Some(by) = sort_by {
            if left.sort_values(Some(&by[..]), true).is_err()
                || right.sort_values(Some(&by[..]), true).is_err()
            {
                return false;
            }
        }

        left.records()
            .iter()
            .zip(right.records())
            .all(|(a, b)| columns.iter().all(|c| a.get(c) == b.get(c)))
    }
}

/// Validated form if the set validates, raw form (index reset) otherwise.
fn normalize(set: &RecordSet) -> (RecordSet, bool) {
    match set.validate_inner() {
        Ok(validated) => (validated, true),
        Err(_) => {
            let mut raw = set.clone();
            raw.reset_index();
            (raw, false)
        }
    }
}

/// Column names, minus list columns holding nothing but empty lists.
fn comparable_columns(set: &RecordSet) -> BTreeSet<String> {
    set.all_columns()
        .into_iter()
        .filter(|column| !is_empty_list_column(set, column))
        .collect()
}

fn is_empty_list_column(set: &RecordSet, column: &str) -> bool {
    let is_list = set
        .schema()
        .get(column)
        .map_or(false, |def| def.column_type == ColumnType::List);

    is_list
        && set
            .records()
            .iter()
            .all(|row| row.get(column).map_or(true, Value::is_empty_like))
}
