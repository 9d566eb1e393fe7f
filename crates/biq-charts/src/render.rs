//! Plotters-backed chart rendering
//!
//! Rendering contract: first column is the category/label axis, first
//! numeric column is the value axis. Row truncation per family: 15 for
//! vertical bar and line, 10 for horizontal bar (sorted ascending for
//! readability), 8 for pie.

use crate::{clean_title, detect_chart_kind, format_value, ChartKind};
use biq_core::ResultTable;
use chrono::Local;
use plotters::element::Pie;
use plotters::prelude::*;
use std::path::{Path, PathBuf};

const BAR_LIMIT: usize = 15;
const HBAR_LIMIT: usize = 10;
const PIE_LIMIT: usize = 8;

const PIE_COLORS: [RGBColor; 8] = [
    RGBColor(52, 152, 219),
    RGBColor(46, 204, 113),
    RGBColor(231, 76, 60),
    RGBColor(241, 196, 15),
    RGBColor(155, 89, 182),
    RGBColor(26, 188, 156),
    RGBColor(230, 126, 34),
    RGBColor(149, 165, 166),
];

/// Renders chart images into a designated output directory.
pub struct ChartEngine {
    output_dir: PathBuf,
}

impl ChartEngine {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir).ok();
        Self { output_dir }
    }

    /// Render the best-fitting chart for a result table.
    ///
    /// Returns `None` when the table is empty, has no numeric column, or
    /// rendering fails for any reason. Never propagates an error.
    pub fn render(&self, table: &ResultTable, question: &str) -> Option<PathBuf> {
        if table.is_empty() {
            return None;
        }
        let value_col = table.first_numeric_column()?;

        let kind = detect_chart_kind(question, table);
        let title = clean_title(question);
        let path = self.chart_path();

        let result = match kind {
            ChartKind::Bar => draw_bar(table, value_col, &title, &path, false),
            ChartKind::HorizontalBar => draw_bar(table, value_col, &title, &path, true),
            ChartKind::Line => draw_line(table, value_col, &title, &path),
            ChartKind::Pie => draw_pie(table, value_col, &title, &path),
        };

        match result {
            Ok(()) => {
                tracing::info!(chart = ?kind, path = %path.display(), "chart rendered");
                Some(path)
            }
            Err(e) => {
                tracing::warn!(chart = ?kind, error = %e, "chart rendering failed, skipping");
                std::fs::remove_file(&path).ok();
                None
            }
        }
    }

    fn chart_path(&self) -> PathBuf {
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        self.output_dir.join(format!("chart_{stamp}.png"))
    }
}

struct Series {
    labels: Vec<String>,
    values: Vec<f64>,
}

fn series(table: &ResultTable, value_col: usize, limit: usize, sort_ascending: bool) -> Series {
    let mut pairs: Vec<(String, f64)> = table
        .rows
        .iter()
        .take(limit)
        .map(|row| {
            let label = cell_label(row.first());
            let value = row.get(value_col).and_then(|v| v.as_f64()).unwrap_or(0.0);
            (label, value)
        })
        .collect();

    if sort_ascending {
        pairs.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    }

    Series {
        labels: pairs.iter().map(|(l, _)| l.clone()).collect(),
        values: pairs.iter().map(|(_, v)| *v).collect(),
    }
}

fn cell_label(cell: Option<&serde_json::Value>) -> String {
    match cell {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn y_ceiling(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max > 0.0 {
        max * 1.15
    } else {
        1.0
    }
}

type RenderResult = Result<(), Box<dyn std::error::Error>>;

fn draw_bar(
    table: &ResultTable,
    value_col: usize,
    title: &str,
    path: &Path,
    horizontal: bool,
) -> RenderResult {
    let limit = if horizontal { HBAR_LIMIT } else { BAR_LIMIT };
    let s = series(table, value_col, limit, horizontal);
    let n = s.values.len();

    let root = BitMapBackend::new(path, (1200, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    if horizontal {
        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 28))
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(200)
            .build_cartesian_2d(0f64..y_ceiling(&s.values), 0f64..n as f64)?;

        let labels = s.labels.clone();
        chart
            .configure_mesh()
            .disable_y_mesh()
            .y_labels(n)
            .y_label_formatter(&|y: &f64| {
                labels.get(*y as usize).cloned().unwrap_or_default()
            })
            .draw()?;

        chart.draw_series(s.values.iter().enumerate().map(|(i, &v)| {
            Rectangle::new(
                [(0.0, i as f64 + 0.15), (v, i as f64 + 0.85)],
                RGBColor(46, 204, 113).mix(0.8).filled(),
            )
        }))?;

        chart.draw_series(s.values.iter().enumerate().map(|(i, &v)| {
            Text::new(
                format!("  {}", format_value(v)),
                (v, i as f64 + 0.5),
                ("sans-serif", 14).into_font(),
            )
        }))?;
    } else {
        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 28))
            .margin(20)
            .x_label_area_size(100)
            .y_label_area_size(80)
            .build_cartesian_2d(0f64..n as f64, 0f64..y_ceiling(&s.values))?;

        let labels = s.labels.clone();
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(n)
            .x_label_formatter(&|x: &f64| {
                labels.get(*x as usize).cloned().unwrap_or_default()
            })
            .draw()?;

        chart.draw_series(s.values.iter().enumerate().map(|(i, &v)| {
            Rectangle::new(
                [(i as f64 + 0.15, 0.0), (i as f64 + 0.85, v)],
                RGBColor(52, 152, 219).mix(0.8).filled(),
            )
        }))?;

        chart.draw_series(s.values.iter().enumerate().map(|(i, &v)| {
            Text::new(
                format_value(v),
                (i as f64 + 0.35, v),
                ("sans-serif", 14).into_font(),
            )
        }))?;
    }

    root.present()?;
    Ok(())
}

fn draw_line(table: &ResultTable, value_col: usize, title: &str, path: &Path) -> RenderResult {
    let s = series(table, value_col, BAR_LIMIT, false);
    let n = s.values.len();

    let root = BitMapBackend::new(path, (1400, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 28))
        .margin(20)
        .x_label_area_size(100)
        .y_label_area_size(80)
        .build_cartesian_2d(0f64..n as f64, 0f64..y_ceiling(&s.values))?;

    let labels = s.labels.clone();
    chart
        .configure_mesh()
        .x_labels(n)
        .x_label_formatter(&|x: &f64| labels.get(*x as usize).cloned().unwrap_or_default())
        .draw()?;

    let line_color = RGBColor(231, 76, 60);
    chart.draw_series(LineSeries::new(
        s.values.iter().enumerate().map(|(i, &v)| (i as f64, v)),
        line_color.stroke_width(3),
    ))?;

    chart.draw_series(
        s.values
            .iter()
            .enumerate()
            .map(|(i, &v)| Circle::new((i as f64, v), 5, line_color.filled())),
    )?;

    chart.draw_series(s.values.iter().enumerate().map(|(i, &v)| {
        Text::new(
            format_value(v),
            (i as f64, v),
            ("sans-serif", 14).into_font(),
        )
    }))?;

    root.present()?;
    Ok(())
}

fn draw_pie(table: &ResultTable, value_col: usize, title: &str, path: &Path) -> RenderResult {
    let s = series(table, value_col, PIE_LIMIT, false);

    let root = BitMapBackend::new(path, (800, 800)).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled(title, ("sans-serif", 28))?;

    let center = (400, 400);
    let radius = 280.0;
    let colors: Vec<RGBColor> = PIE_COLORS.iter().cycle().take(s.values.len()).cloned().collect();

    let mut pie = Pie::new(&center, &radius, &s.values, &colors, &s.labels);
    pie.label_style(("sans-serif", 18).into_font());
    pie.percentages(("sans-serif", 14).into_font().color(&WHITE));
    root.draw(&pie)?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_no_numeric_column_yields_no_artifact() {
        let table = ResultTable::new(
            vec!["name".into(), "city".into()],
            vec![vec![json!("a"), json!("x")], vec![json!("b"), json!("y")]],
        );
        let engine = ChartEngine::new(std::env::temp_dir().join("biq_charts_test"));
        assert_eq!(engine.render(&table, "list my customers"), None);
    }

    #[test]
    fn test_empty_table_yields_no_artifact() {
        let table = ResultTable::new(vec!["revenue".into()], vec![]);
        let engine = ChartEngine::new(std::env::temp_dir().join("biq_charts_test"));
        assert_eq!(engine.render(&table, "monthly revenue"), None);
    }

    #[test]
    fn test_series_truncates_and_sorts_ascending() {
        let table = ResultTable::new(
            vec!["customer".into(), "spend".into()],
            (0..20)
                .map(|i| vec![json!(format!("c{i}")), json!(1000 - i * 10)])
                .collect(),
        );
        let s = series(&table, 1, HBAR_LIMIT, true);
        assert_eq!(s.values.len(), 10);
        assert!(s.values.windows(2).all(|w| w[0] <= w[1]));
        // sorted ascending over the leading rows only
        assert_eq!(s.values[0], 910.0);
        assert_eq!(s.values[9], 1000.0);
    }

    #[test]
    fn test_cell_label_shapes() {
        assert_eq!(cell_label(Some(&json!("sao paulo"))), "sao paulo");
        assert_eq!(cell_label(Some(&json!(2017))), "2017");
        assert_eq!(cell_label(Some(&serde_json::Value::Null)), "");
        assert_eq!(cell_label(None), "");
    }
}
