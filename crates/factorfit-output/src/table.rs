//! Fixed-width tables for data previews and descriptive statistics.

use factorfit_regression::Describe;
use ndarray::Array2;
use polars::prelude::*;
use thiserror::Error;

/// Errors that can occur while tabulating a frame.
#[derive(Debug, Error)]
pub enum TableError {
    /// Polars error while reading cells.
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

fn format_cell(value: AnyValue<'_>) -> String {
    match value {
        AnyValue::Null => "NaN".to_string(),
        AnyValue::Float64(v) => format!("{:.6}", v),
        AnyValue::Float32(v) => format!("{:.6}", v),
        other => other.to_string(),
    }
}

fn format_float(v: f64) -> String {
    format!("{:.6}", v)
}

/// Render rows under a header; the first column is left aligned, the rest right aligned.
pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(i, (cell, &w))| {
                if i == 0 {
                    format!("{:<w$}", cell, w = w)
                } else {
                    format!("{:>w$}", cell, w = w)
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
    };

    let total = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
    let mut output = String::new();
    output.push_str(&line(headers));
    output.push('\n');
    output.push_str(&"-".repeat(total));
    output.push('\n');
    for row in rows {
        output.push_str(&line(row));
        output.push('\n');
    }
    output
}

/// First `n` rows of a frame, with a leading row number.
pub fn frame_preview(df: &DataFrame, n: usize) -> Result<String, TableError> {
    let head = df.head(Some(n));
    let columns = head.get_columns();

    let mut headers = vec![String::new()];
    headers.extend(columns.iter().map(|c| c.name().to_string()));

    let mut rows = Vec::with_capacity(head.height());
    for i in 0..head.height() {
        let mut row = vec![i.to_string()];
        for column in columns {
            row.push(format_cell(column.get(i)?));
        }
        rows.push(row);
    }

    Ok(render_table(&headers, &rows))
}

/// Column names with their data types.
pub fn dtypes_table(df: &DataFrame) -> String {
    let rows: Vec<Vec<String>> = df
        .get_columns()
        .iter()
        .map(|c| vec![c.name().to_string(), c.dtype().to_string()])
        .collect();
    render_table(&["column".to_string(), "dtype".to_string()], &rows)
}

/// Missing-value count per column.
pub fn missing_table(counts: &[(String, usize)]) -> String {
    let rows: Vec<Vec<String>> = counts
        .iter()
        .map(|(name, count)| vec![name.clone(), count.to_string()])
        .collect();
    render_table(&["column".to_string(), "missing".to_string()], &rows)
}

/// Descriptive statistics with one column per variable.
pub fn describe_table(columns: &[(String, Describe)]) -> String {
    let mut headers = vec![String::new()];
    headers.extend(columns.iter().map(|(name, _)| name.clone()));

    let stat_rows: [(&str, fn(&Describe) -> String); 8] = [
        ("count", |d| format!("{:.6}", d.count as f64)),
        ("mean", |d| format_float(d.mean)),
        ("std", |d| format_float(d.std)),
        ("min", |d| format_float(d.min)),
        ("25%", |d| format_float(d.q25)),
        ("50%", |d| format_float(d.median)),
        ("75%", |d| format_float(d.q75)),
        ("max", |d| format_float(d.max)),
    ];

    let rows: Vec<Vec<String>> = stat_rows
        .iter()
        .map(|(label, get)| {
            let mut row = vec![label.to_string()];
            row.extend(columns.iter().map(|(_, d)| get(d)));
            row
        })
        .collect();

    render_table(&headers, &rows)
}

/// Square correlation matrix with row and column labels.
pub fn correlation_table(names: &[String], corr: &Array2<f64>) -> String {
    let mut headers = vec![String::new()];
    headers.extend(names.iter().cloned());

    let rows: Vec<Vec<String>> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let mut row = vec![name.clone()];
            row.extend((0..names.len()).map(|j| format_float(corr[[i, j]])));
            row
        })
        .collect();

    render_table(&headers, &rows)
}
