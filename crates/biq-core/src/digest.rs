//! Statistical digest of a result table
//!
//! The digest is the compact, structured view of a result set that gets
//! embedded into the analysis prompt. It is recomputed per request and
//! never cached.

use crate::table::ResultTable;
use serde::Serialize;

const SAMPLE_ROWS: usize = 3;

/// Per-column statistics for numeric columns.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnStats {
    pub column: String,
    pub total: f64,
    pub average: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
}

/// Coarse direction of a numeric series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

impl Trend {
    /// Compare the mean of the first half against the second half with a
    /// ±10% deadband. Needs at least three points.
    pub fn detect(values: &[f64]) -> Option<Trend> {
        if values.len() < 3 {
            return None;
        }
        let mid = values.len() / 2;
        let first = mean(&values[..mid]);
        let second = mean(&values[mid..]);

        if second > first * 1.1 {
            Some(Trend::Increasing)
        } else if second < first * 0.9 {
            Some(Trend::Decreasing)
        } else {
            Some(Trend::Stable)
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Trend::Increasing => "increasing",
            Trend::Decreasing => "decreasing",
            Trend::Stable => "stable",
        }
    }
}

/// Digest of one result table: shape, leading rows, numeric statistics and
/// an optional trend sentence for the first numeric column.
#[derive(Debug, Clone, Serialize)]
pub struct DataDigest {
    pub row_count: usize,
    pub columns: Vec<String>,
    pub sample_rows: Vec<serde_json::Map<String, serde_json::Value>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub statistics: Vec<ColumnStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<String>,
}

impl DataDigest {
    pub fn compute(table: &ResultTable) -> Self {
        let mut statistics = Vec::new();
        let mut trend = None;

        for idx in table.numeric_columns() {
            let values = table.column_values(idx);
            if values.is_empty() {
                continue;
            }
            let column = table.columns[idx].clone();

            if trend.is_none() {
                if let Some(direction) = Trend::detect(&values) {
                    trend = Some(format!("{} is {}", column, direction.label()));
                }
            }

            statistics.push(ColumnStats {
                column,
                total: values.iter().sum(),
                average: mean(&values),
                min: values.iter().copied().fold(f64::INFINITY, f64::min),
                max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                median: median(&values),
            });
        }

        Self {
            row_count: table.row_count(),
            columns: table.columns.clone(),
            sample_rows: table.sample_rows(SAMPLE_ROWS),
            statistics,
            trend,
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    if n == 0 {
        0.0
    } else if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spending_table() -> ResultTable {
        ResultTable::new(
            vec!["customer".into(), "total_spent".into()],
            [15000, 12000, 9500, 8200, 7800]
                .iter()
                .enumerate()
                .map(|(i, v)| vec![json!(format!("c{i}")), json!(*v)])
                .collect(),
        )
    }

    #[test]
    fn test_digest_statistics() {
        let digest = DataDigest::compute(&spending_table());
        assert_eq!(digest.row_count, 5);
        assert_eq!(digest.statistics.len(), 1);

        let stats = &digest.statistics[0];
        assert_eq!(stats.column, "total_spent");
        assert_eq!(stats.total, 52500.0);
        assert_eq!(stats.max, 15000.0);
        assert_eq!(stats.min, 7800.0);
        assert_eq!(stats.average, 10500.0);
        assert_eq!(stats.median, 9500.0);
    }

    #[test]
    fn test_digest_sample_rows_are_bounded() {
        let digest = DataDigest::compute(&spending_table());
        assert_eq!(digest.sample_rows.len(), 3);
    }

    #[test]
    fn test_trend_increasing() {
        let series = [50000.0, 55000.0, 52000.0, 63000.0, 71000.0, 78000.0];
        assert_eq!(Trend::detect(&series), Some(Trend::Increasing));
    }

    #[test]
    fn test_trend_decreasing_and_stable() {
        assert_eq!(
            Trend::detect(&[100.0, 90.0, 80.0, 40.0, 30.0, 20.0]),
            Some(Trend::Decreasing)
        );
        assert_eq!(
            Trend::detect(&[100.0, 101.0, 99.0, 100.0, 102.0, 98.0]),
            Some(Trend::Stable)
        );
    }

    #[test]
    fn test_trend_needs_three_points() {
        assert_eq!(Trend::detect(&[1.0, 2.0]), None);
    }

    #[test]
    fn test_digest_trend_names_first_numeric_column() {
        let table = ResultTable::new(
            vec!["month".into(), "revenue".into()],
            [50000, 55000, 52000, 63000, 71000, 78000]
                .iter()
                .enumerate()
                .map(|(i, v)| vec![json!(format!("2017-{:02}", i + 1)), json!(*v)])
                .collect(),
        );
        let digest = DataDigest::compute(&table);
        assert_eq!(digest.trend.as_deref(), Some("revenue is increasing"));
    }

    #[test]
    fn test_median_even_count() {
        assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]), 2.5);
    }
}
