//! Record set: an ordered, schema-bound collection of rows
//!
//! Column discipline:
//! - `columns()` lists the plain columns
//! - `index()` lists the columns currently applied as index
//! - a column is in exactly one of the two; `reset_index` moves the index
//!   back in front of the plain columns
//!
//! Every stored row carries an entry for every column (plain or index);
//! absent values are `Value::Missing`.

use std::collections::BTreeSet;
use std::sync::Arc;

use super::errors::{TableError, TableResult};
use super::value::{Record, Value};
use crate::schema::Schema;

/// Schema-bound table of rows
#[derive(Debug, Clone)]
pub struct RecordSet {
    schema: Arc<Schema>,
    /// Declared uniqueness/merge key
    index_columns: Vec<String>,
    /// Active index
    index: Vec<String>,
    /// Plain columns
    columns: Vec<String>,
    rows: Vec<Record>,
}

impl RecordSet {
    /// Creates an empty record set whose columns are the schema's columns.
    pub fn empty(schema: Arc<Schema>) -> Self {
        let columns = schema.column_names();
        let index_columns = schema.index_columns().to_vec();
        Self {
            schema,
            index_columns,
            index: Vec::new(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Creates a record set from in-memory rows.
    ///
    /// Columns are the union of the row keys: schema-declared columns in
    /// declaration order, then undeclared ones sorted by name. With no rows,
    /// the schema's columns are used.
    pub fn from_records(schema: Arc<Schema>, records: Vec<Record>) -> Self {
        if records.is_empty() {
            return Self::empty(schema);
        }

        let present: BTreeSet<&str> = records
            .iter()
            .flat_map(|r| r.keys().map(String::as_str))
            .collect();

        let mut columns: Vec<String> = schema
            .columns()
            .iter()
            .filter(|c| present.contains(c.name.as_str()))
            .map(|c| c.name.clone())
            .collect();
        columns.extend(
            present
                .iter()
                .filter(|name| !schema.contains(name))
                .map(|name| name.to_string()),
        );

        Self::from_parts(schema, columns, records)
    }

    /// Creates a record set with an explicit column order.
    ///
    /// Row keys outside `columns` are dropped; absent ones become missing.
    pub(crate) fn from_parts(schema: Arc<Schema>, columns: Vec<String>, records: Vec<Record>) -> Self {
        let index_columns = schema.index_columns().to_vec();
        let rows = records
            .into_iter()
            .map(|record| conform(record, &columns))
            .collect();
        Self {
            schema,
            index_columns,
            index: Vec::new(),
            columns,
            rows,
        }
    }

    /// Creates a sibling record set (same schema and key) over other rows.
    pub(crate) fn with_rows(&self, rows: Vec<Record>) -> Self {
        Self {
            schema: Arc::clone(&self.schema),
            index_columns: self.index_columns.clone(),
            index: self.index.clone(),
            columns: self.columns.clone(),
            rows,
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Plain (non-index) columns
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Columns currently applied as index
    pub fn index(&self) -> &[String] {
        &self.index
    }

    /// Index columns followed by plain columns
    pub fn all_columns(&self) -> Vec<String> {
        self.index.iter().chain(&self.columns).cloned().collect()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.index.iter().chain(&self.columns).any(|c| c == column)
    }

    /// Declared uniqueness/merge key
    pub fn index_columns(&self) -> &[String] {
        &self.index_columns
    }

    /// Overrides the declared key for this record set.
    pub fn set_index_columns<S: AsRef<str>>(&mut self, columns: &[S]) {
        self.index_columns = columns.iter().map(|c| c.as_ref().to_string()).collect();
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.rows
    }

    pub fn to_records(&self) -> Vec<Record> {
        self.rows.clone()
    }

    pub fn into_records(self) -> Vec<Record> {
        self.rows
    }

    /// Values of one column, in row order.
    pub fn column_values(&self, column: &str) -> TableResult<Vec<&Value>> {
        self.require_columns(&[column])?;
        Ok(self.rows.iter().map(|r| &r[column]).collect())
    }

    /// Applies `columns` as the index, replacing any active index.
    pub fn set_index<S: AsRef<str>>(&mut self, columns: &[S]) -> TableResult<()> {
        self.require_columns(columns)?;
        self.reset_index();

        let index: Vec<String> = columns.iter().map(|c| c.as_ref().to_string()).collect();
        self.columns.retain(|c| !index.contains(c));
        self.index = index;
        Ok(())
    }

    /// Moves the active index back to plain columns, in front.
    pub fn reset_index(&mut self) {
        if self.index.is_empty() {
            return;
        }
        let mut columns = std::mem::take(&mut self.index);
        columns.append(&mut self.columns);
        self.columns = columns;
    }

    /// Sorts rows by the active index (stable).
    pub fn sort_index(&mut self, ascending: bool) {
        let by = self.index.clone();
        self.sort_rows(&by, ascending);
    }

    /// Sorts rows by `by`, or by the declared key when `by` is `None` (stable).
    ///
    /// Sorting never changes which columns are index columns.
    pub fn sort_values<S: AsRef<str>>(&mut self, by: Option<&[S]>, ascending: bool) -> TableResult<()> {
        let by: Vec<String> = match by {
            Some(columns) => columns.iter().map(|c| c.as_ref().to_string()).collect(),
            None => self.index_columns.clone(),
        };
        self.require_columns(&by[..])?;
        self.sort_rows(&by, ascending);
        Ok(())
    }

    /// Returns a copy with every missing cell replaced by `value`.
    pub fn fill_missing(&self, value: impl Into<Value>) -> RecordSet {
        let value = value.into();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|(k, v)| {
                        let v = if v.is_missing() { value.clone() } else { v.clone() };
                        (k.clone(), v)
                    })
                    .collect()
            })
            .collect();
        self.with_rows(rows)
    }

    /// Returns a record set restricted to `columns`, in that order.
    pub fn select<S: AsRef<str>>(&self, columns: &[S]) -> TableResult<RecordSet> {
        self.require_columns(columns)?;
        let columns: Vec<String> = columns.iter().map(|c| c.as_ref().to_string()).collect();
        let mut selected = Self::from_parts(Arc::clone(&self.schema), columns, self.rows.clone());
        selected.index_columns = self.index_columns.clone();
        Ok(selected)
    }

    /// Errors with the columns of `columns` this set does not have.
    pub(crate) fn require_columns<S: AsRef<str>>(&self, columns: &[S]) -> TableResult<()> {
        let missing: Vec<String> = columns
            .iter()
            .map(AsRef::as_ref)
            .filter(|c| !self.has_column(c))
            .map(String::from)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(TableError::MissingColumns { columns: missing })
        }
    }

    /// Key of a row over `columns`, coerced to the declared column types.
    ///
    /// Values that do not coerce keep their raw form, so `"1"` and `1` share a
    /// key in an int column while `"x"` stays distinct.
    pub(crate) fn key_of(&self, row: &Record, columns: &[String]) -> Vec<Value> {
        columns
            .iter()
            .map(|column| {
                let raw = row.get(column).cloned().unwrap_or(Value::Missing);
                match self.schema.get(column) {
                    Some(def) => raw.coerce(def.column_type).unwrap_or(raw),
                    None => raw,
                }
            })
            .collect()
    }

    pub(crate) fn rows_mut(&mut self) -> &mut Vec<Record> {
        &mut self.rows
    }

    /// Adds a plain column (filled with missing) if the set lacks it.
    pub(crate) fn ensure_column(&mut self, column: &str) {
        if self.has_column(column) {
            return;
        }
        self.columns.push(column.to_string());
        for row in &mut self.rows {
            row.entry(column.to_string()).or_insert(Value::Missing);
        }
    }

    fn sort_rows(&mut self, by: &[String], ascending: bool) {
        if by.is_empty() {
            return;
        }
        let mut keyed: Vec<(Vec<Value>, Record)> = std::mem::take(&mut self.rows)
            .into_iter()
            .map(|row| (self.key_of(&row, by), row))
            .collect();
        keyed.sort_by(|(a, _), (b, _)| {
            let ordering = a.cmp(b);
            if ascending {
                ordering
            } else {
                ordering.reverse()
            }
        });
        self.rows = keyed.into_iter().map(|(_, row)| row).collect();
    }
}

/// Restricts a row to `columns`, filling absent ones with missing.
fn conform(mut record: Record, columns: &[String]) -> Record {
    let mut row = Record::new();
    for column in columns {
        let value = record.remove(column).unwrap_or(Value::Missing);
        row.insert(column.clone(), value);
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;
    use crate::schema::ColumnDef;

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

    #[test]
    fn test_empty_has_schema_columns() {
        let set = RecordSet::empty(schema());
        assert_eq!(set.columns(), ["a", "b", "c"]);
        assert!(set.is_empty());
        assert_eq!(set.index_columns(), ["b".to_string()]);
    }

    #[test]
    fn test_from_records_orders_by_schema_then_extras() {
        let set = RecordSet::from_records(
            schema(),
            vec![record! { "zz" => 1, "b" => 2, "a" => "A" }, record! { "extra" => "x" }],
        );
        assert_eq!(set.columns(), ["a", "b", "extra", "zz"]);
        assert_eq!(set.records()[1]["a"], Value::Missing);
        assert_eq!(set.records()[1]["extra"], Value::from("x"));
    }

    #[test]
    fn test_set_index_removes_columns() {
        let mut set = RecordSet::from_records(schema(), vec![record! { "a" => "A", "b" => 1 }]);
        set.set_index(&["b"]).unwrap();
        assert_eq!(set.index(), ["b"]);
        assert_eq!(set.columns(), ["a"]);
        assert!(set.has_column("b"));
    }

    #[test]
    fn test_sort_index_does_not_change_columns() {
        let mut set = RecordSet::empty(schema());
        let index = set.index_columns().to_vec();
        set.set_index(&index[..]).unwrap();
        set.sort_index(true);

        assert!(set.columns().iter().all(|c| !set.index().contains(c)));
        assert_eq!(set.columns(), ["a", "c"]);
    }

    #[test]
    fn test_reset_index_restores_columns_in_front() {
        let mut set = RecordSet::empty(schema());
        set.set_index(&["c"]).unwrap();
        set.reset_index();
        assert_eq!(set.columns(), ["c", "a", "b"]);
        assert!(set.index().is_empty());
    }

    #[test]
    fn test_set_index_unknown_column() {
        let mut set = RecordSet::empty(schema());
        let err = set.set_index(&["nope"]).unwrap_err();
        assert!(matches!(err, TableError::MissingColumns { .. }));
        assert_eq!(set.columns(), ["a", "b", "c"]);
    }

    #[test]
    fn test_sort_values_by_key() {
        let mut set = RecordSet::from_records(
            schema(),
            vec![record! { "a" => "A", "b" => 2 }, record! { "a" => "A", "b" => 1 }],
        );
        set.sort_values::<&str>(None, true).unwrap();
        assert_eq!(set.records()[0]["b"], Value::Int(1));

        set.sort_values::<&str>(None, false).unwrap();
        assert_eq!(set.records()[0]["b"], Value::Int(2));
    }

    #[test]
    fn test_sort_values_coerces_numeric_text() {
        let mut set = RecordSet::from_records(
            schema(),
            vec![record! { "a" => "A", "b" => "10" }, record! { "a" => "A", "b" => "9" }],
        );
        set.sort_values(Some(&["b"][..]), true).unwrap();
        assert_eq!(set.records()[0]["b"], Value::from("9"));
    }

    #[test]
    fn test_fill_missing() {
        let set = RecordSet::from_records(
            schema(),
            vec![record! { "a" => "a", "b" => Value::Missing }],
        );
        let filled = set.fill_missing("x");
        assert_eq!(filled.records()[0]["b"], Value::from("x"));
        assert_eq!(set.records()[0]["b"], Value::Missing);
    }

    #[test]
    fn test_select_columns() {
        let set = RecordSet::from_records(schema(), vec![record! { "a" => "a", "b" => 1 }]);
        let selected = set.select(&["b"]).unwrap();
        assert_eq!(selected.columns(), ["b"]);
        assert_eq!(selected.records()[0].len(), 1);
        assert!(set.select(&["q"]).is_err());
    }

    #[test]
    fn test_column_values() {
        let set = RecordSet::from_records(
            schema(),
            vec![record! { "a" => "x" }, record! { "a" => "y" }],
        );
        let values = set.column_values("a").unwrap();
        assert_eq!(values, vec![&Value::from("x"), &Value::from("y")]);
    }
}
