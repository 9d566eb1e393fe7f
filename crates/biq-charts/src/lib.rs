//! Chart selection and rendering
//!
//! Chart family detection is an ordered rule table over the question text
//! and result shape, deliberately not a learned classifier: first match
//! wins and the decision is a pure function of its inputs. Rendering is
//! best-effort; every failure downgrades to "no artifact" and is never
//! allowed to abort the pipeline.

mod render;

use biq_core::ResultTable;

pub use render::ChartEngine;

const TIME_WORDS: &[&str] = &["monthly", "trend", "over time", "timeline", "growth"];
const RANK_WORDS: &[&str] = &["top", "best", "worst", "ranking", "compare"];
const SHARE_WORDS: &[&str] = &["distribution", "breakdown", "share", "percentage"];
const DATE_COLUMN_WORDS: &[&str] = &["date", "month", "year", "time"];

/// Supported chart families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Bar,
    HorizontalBar,
    Line,
    Pie,
}

/// Pick a chart family for a question and its result table.
///
/// Rules, first match wins:
/// 1. time-series keyword in the question -> line
/// 2. ranking keyword -> horizontal bar
/// 3. distribution keyword -> pie
/// 4. date-like column name -> line
/// 5. at most 10 rows -> horizontal bar, otherwise vertical bar
pub fn detect_chart_kind(question: &str, table: &ResultTable) -> ChartKind {
    let q = question.to_lowercase();

    if TIME_WORDS.iter().any(|w| q.contains(w)) {
        return ChartKind::Line;
    }
    if RANK_WORDS.iter().any(|w| q.contains(w)) {
        return ChartKind::HorizontalBar;
    }
    if SHARE_WORDS.iter().any(|w| q.contains(w)) {
        return ChartKind::Pie;
    }

    for column in &table.columns {
        let name = column.to_lowercase();
        if DATE_COLUMN_WORDS.iter().any(|w| name.contains(w)) {
            return ChartKind::Line;
        }
    }

    if table.row_count() <= 10 {
        ChartKind::HorizontalBar
    } else {
        ChartKind::Bar
    }
}

/// Derive a chart title from the question text: capitalize the first
/// letter, drop a trailing question mark, bound the length.
pub fn clean_title(question: &str) -> String {
    let mut title: String = question.trim().to_string();

    let mut chars = title.chars();
    if let Some(first) = chars.next() {
        title = first.to_uppercase().collect::<String>() + chars.as_str();
    }

    if title.ends_with('?') {
        title.pop();
    }

    if title.chars().count() > 60 {
        title = title.chars().take(57).collect::<String>() + "...";
    }

    title
}

/// Format a value for bar/point labels: rounded, thousands-separated.
pub fn format_value(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.abs().to_string();

    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if rounded < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}
