//! Set difference between record sets

use std::collections::HashSet;

use super::errors::{TableError, TableResult};
use super::record_set::RecordSet;

impl RecordSet {
    /// Rows of `self` with no counterpart in `other`, compared over `cols`.
    ///
    /// With `cols` unset the declared index columns are compared, or every
    /// column when no index is declared. Key values are coerced to the declared
    /// column types first. The result keeps `self`'s row order.
    pub fn get_diff(&self, other: &RecordSet, cols: Option<&[&str]>) -> TableResult<RecordSet> {
        let cols: Vec<String> = match cols {
            Some(cols) => cols.iter().map(|c| c.to_string()).collect(),
            None if !self.index_columns().is_empty() => self.index_columns().to_vec(),
            None => self.all_columns(),
        };

        let missing: Vec<String> = cols
            .iter()
            .filter(|c| !self.has_column(c) || !other.has_column(c))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(TableError::MissingColumns { columns: missing });
        }

        let theirs: HashSet<_> = other
            .records()
            .iter()
            .map(|row| other.key_of(row, &cols))
            .collect();

        let rows = self
            .records()
            .iter()
            .filter(|row| !theirs.contains(&self.key_of(row, &cols)))
            .cloned()
            .collect();

        Ok(self.with_rows(rows))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::schema::{ColumnDef, Schema};
    use crate::table::{Record, Value};

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

    fn columns(a: &[&str], b: &[i64]) -> RecordSet {
        let records: Vec<Record> = a
            .iter()
            .zip(b)
            .map(|(a, b)| crate::record! { "a" => *a, "b" => *b })
            .collect();
        RecordSet::from_records(schema(), records)
    }

    #[test]
    fn test_get_diff_counts() {
        let full = columns(&["A", "B", "C", "D"], &[1, 2, 3, 4]);

        let same = columns(&["A", "B", "C", "D"], &[1, 2, 3, 4]);
        assert_eq!(full.get_diff(&same, None).unwrap().len(), 0);

        let fewer = columns(&["A", "B", "C"], &[1, 2, 3]);
        assert_eq!(full.get_diff(&fewer, None).unwrap().len(), 1);

        let empty = columns(&[], &[]);
        let diff = full.get_diff(&empty, None).unwrap();
        assert_eq!(diff.len(), 4);
        assert_eq!(diff.schema().name(), "sample");
    }

    #[test]
    fn test_get_diff_cols() {
        let left = columns(&["A", "B", "C", "A", "B", "C"], &[1, 1, 1, 2, 2, 2]);
        let right = columns(&["A", "A", "C"], &[1, 3, 2]);

        assert_eq!(left.get_diff(&right, None).unwrap().len(), 0);
        assert_eq!(left.get_diff(&right, Some(&["a"][..])).unwrap().len(), 2);
        assert_eq!(left.get_diff(&right, Some(&["a", "b"][..])).unwrap().len(), 4);
    }

    #[test]
    fn test_get_diff_subset_of_columns() {
        let left = columns(&["a", "a"], &[1, 2]);
        let right = columns(&["a"], &[3]);

        assert_eq!(left.get_diff(&right, Some(&["a"][..])).unwrap().len(), 0);
        assert_eq!(left.get_diff(&right, Some(&["a", "b"][..])).unwrap().len(), 2);
    }

    #[test]
    fn test_get_diff_preserves_order() {
        let left = columns(&["D", "A", "C", "B"], &[4, 1, 3, 2]);
        let right = columns(&["A"], &[1]);

        let diff = left.get_diff(&right, None).unwrap();
        let values: Vec<&Value> = diff.column_values("a").unwrap();
        assert_eq!(values, vec![&Value::from("D"), &Value::from("C"), &Value::from("B")]);
    }

    #[test]
    fn test_get_diff_coerces_keys() {
        let left = columns(&["A"], &[1]);
        let right = RecordSet::from_records(schema(), vec![crate::record! { "a" => "A", "b" => "1" }]);
        assert_eq!(left.get_diff(&right, None).unwrap().len(), 0);
    }

    #[test]
    fn test_get_diff_invalid_cols() {
        let left = columns(&["A"], &[1]);
        let right = RecordSet::from_records(schema(), vec![crate::record! { "a" => "A" }]);

        let err = left.get_diff(&right, Some(&["b"][..])).unwrap_err();
        assert!(err.to_string().starts_with("The columns"));
        assert!(err.to_string().contains("are not present"));
    }

    #[test]
    fn test_get_diff_without_index_uses_all_columns() {
        let mut left = columns(&["A", "A"], &[1, 2]);
        left.set_index_columns::<&str>(&[]);
        let right = columns(&["A"], &[2]);

        let diff = left.get_diff(&right, None).unwrap();
        assert_eq!(diff.len(), 1);
        assert_eq!(diff.records()[0]["b"], Value::Int(1));
    }
}
