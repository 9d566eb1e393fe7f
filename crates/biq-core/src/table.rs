//! Materialized query results

use serde::{Deserialize, Serialize};

/// A fully materialized, immutable result set.
///
/// Columns are ordered; rows are positional. Cell values keep the JSON
/// typing produced by the executor (numbers, strings, nulls, booleans).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
}

impl ResultTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<serde_json::Value>>) -> Self {
        Self { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Indexes of columns whose non-null cells are all numbers, with at
    /// least one number present.
    pub fn numeric_columns(&self) -> Vec<usize> {
        (0..self.columns.len())
            .filter(|&idx| {
                let mut seen = false;
                for row in &self.rows {
                    match row.get(idx) {
                        Some(serde_json::Value::Number(_)) => seen = true,
                        Some(serde_json::Value::Null) | None => {}
                        Some(_) => return false,
                    }
                }
                seen
            })
            .collect()
    }

    pub fn first_numeric_column(&self) -> Option<usize> {
        self.numeric_columns().into_iter().next()
    }

    /// Numeric values of a column, skipping nulls.
    pub fn column_values(&self, idx: usize) -> Vec<f64> {
        self.rows
            .iter()
            .filter_map(|row| row.get(idx).and_then(|v| v.as_f64()))
            .collect()
    }

    /// Leading rows as name → value objects, for digests and prompts.
    pub fn sample_rows(&self, limit: usize) -> Vec<serde_json::Map<String, serde_json::Value>> {
        self.rows
            .iter()
            .take(limit)
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table() -> ResultTable {
        ResultTable::new(
            vec!["city".into(), "revenue".into(), "note".into()],
            vec![
                vec![json!("sao paulo"), json!(100.5), json!("a")],
                vec![json!("rio"), json!(Option::<f64>::None), json!("b")],
                vec![json!("recife"), json!(50), json!("c")],
            ],
        )
    }

    #[test]
    fn test_numeric_column_detection_skips_nulls() {
        assert_eq!(table().numeric_columns(), vec![1]);
        assert_eq!(table().first_numeric_column(), Some(1));
    }

    #[test]
    fn test_column_values_extracts_floats() {
        assert_eq!(table().column_values(1), vec![100.5, 50.0]);
    }

    #[test]
    fn test_all_null_column_is_not_numeric() {
        let t = ResultTable::new(
            vec!["a".into()],
            vec![vec![serde_json::Value::Null], vec![serde_json::Value::Null]],
        );
        assert!(t.numeric_columns().is_empty());
    }

    #[test]
    fn test_sample_rows_keep_column_order() {
        let samples = table().sample_rows(2);
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0]["city"], json!("sao paulo"));
        assert_eq!(samples[0]["revenue"], json!(100.5));
    }
}
