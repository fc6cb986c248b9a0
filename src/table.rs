//! Plain-text table rendering for probe and preview output.

use std::borrow::Cow;
use std::fmt::Write as _;

use crate::data::{Column, Row, Value};

/// Key/header/type/confidence summary of probed columns.
pub fn column_summary(columns: &[Column]) -> String {
    let headers: Vec<String> = ["column", "header", "type", "confidence"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let rows: Vec<Vec<String>> = columns
        .iter()
        .map(|column| {
            vec![
                column.key.clone(),
                column.header.clone(),
                column
                    .data_type
                    .map(|data_type| data_type.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                column
                    .confidence
                    .map(|confidence| format!("{confidence:.2}"))
                    .unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();
    render_table(&headers, &rows)
}

/// Renders up to `limit` rows as a grid with the columns' display headers.
pub fn row_grid(columns: &[Column], rows: &[Row], limit: usize) -> String {
    let headers: Vec<String> = columns.iter().map(|column| column.header.clone()).collect();
    let absent = Value::Null;
    let body: Vec<Vec<String>> = rows
        .iter()
        .take(limit)
        .map(|row| {
            columns
                .iter()
                .map(|column| row.get(&column.key).unwrap_or(&absent).as_display())
                .collect()
        })
        .collect();
    render_table(&headers, &body)
}

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|cell| cell_width(cell).max(3)).collect();
    for row in rows {
        for (index, cell) in row.iter().enumerate().take(widths.len()) {
            widths[index] = widths[index].max(cell_width(cell));
        }
    }

    let mut output = String::new();
    push_line(&mut output, headers, &widths);
    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    push_line(&mut output, &rule, &widths);
    for row in rows {
        push_line(&mut output, row, &widths);
    }
    output
}

fn push_line(output: &mut String, cells: &[String], widths: &[usize]) {
    let mut line = String::new();
    for (index, width) in widths.iter().enumerate() {
        if index > 0 {
            line.push_str("  ");
        }
        let cell = cells
            .get(index)
            .map(|cell| sanitize(cell))
            .unwrap_or(Cow::Borrowed(""));
        let padding = width.saturating_sub(cell_width(cell.as_ref()));
        line.push_str(cell.as_ref());
        line.push_str(&" ".repeat(padding));
    }
    let _ = writeln!(output, "{}", line.trim_end());
}

fn cell_width(value: &str) -> usize {
    sanitize(value).chars().count()
}

fn sanitize(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(
            value
                .chars()
                .map(|ch| match ch {
                    '\n' | '\r' | '\t' => ' ',
                    other => other,
                })
                .collect(),
        )
    } else {
        Cow::Borrowed(value)
    }
}
