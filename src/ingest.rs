//! Dataset ingestion from delimited text files and Excel workbooks.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use calamine::{Data, Reader, open_workbook_auto};
use log::info;

use crate::data::{Column, Row, Value};
use crate::io_utils::{
    decode_record, open_csv_reader_from_path, reader_headers, resolve_encoding,
    resolve_input_delimiter,
};

#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    pub delimiter: Option<u8>,
    pub encoding: Option<String>,
    pub no_headers: bool,
    pub limit: Option<usize>,
}

/// Rows plus column descriptors as read from disk. Columns carry no type
/// until probed.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub rows: Vec<Row>,
    pub columns: Vec<Column>,
    pub total_rows: usize,
}

const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xls", "xlsm", "xlsb", "ods"];

/// Reads a dataset, dispatching on the file extension. Anything that is
/// not a workbook extension is treated as delimited text.
pub fn read_dataset(path: &Path, options: &IngestOptions) -> Result<Dataset> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    let dataset = if extension
        .as_deref()
        .is_some_and(|ext| WORKBOOK_EXTENSIONS.contains(&ext))
    {
        read_workbook(path, options)?
    } else {
        read_delimited(path, options)?
    };
    info!(
        "Ingested {} row(s) across {} column(s) from {:?}",
        dataset.total_rows,
        dataset.columns.len(),
        path
    );
    Ok(dataset)
}

fn read_delimited(path: &Path, options: &IngestOptions) -> Result<Dataset> {
    let encoding = resolve_encoding(options.encoding.as_deref())?;
    let delimiter = resolve_input_delimiter(path, options.delimiter);
    let mut reader = open_csv_reader_from_path(path, delimiter, !options.no_headers)?;

    let mut columns = if options.no_headers {
        Vec::new()
    } else {
        let headers = reader_headers(&mut reader, encoding)?;
        header_columns(&headers)
    };

    let mut rows = Vec::new();
    let mut record = csv::ByteRecord::new();
    while reader
        .read_byte_record(&mut record)
        .with_context(|| format!("Reading record from {path:?}"))?
    {
        let cells = decode_record(&record, encoding)?;
        if columns.is_empty() {
            columns = positional_columns(cells.len());
        }
        if cells.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        rows.push(text_row(&columns, &cells));
        if options.limit.is_some_and(|limit| rows.len() >= limit) {
            break;
        }
    }

    let total_rows = rows.len();
    Ok(Dataset {
        rows,
        columns,
        total_rows,
    })
}

fn read_workbook(path: &Path, options: &IngestOptions) -> Result<Dataset> {
    let mut workbook =
        open_workbook_auto(path).with_context(|| format!("Opening workbook {path:?}"))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow!("Workbook {path:?} contains no worksheets"))?
        .with_context(|| format!("Reading first worksheet of {path:?}"))?;

    let mut columns = Vec::new();
    let mut rows = Vec::new();
    for (index, sheet_row) in range.rows().enumerate() {
        if index == 0 && !options.no_headers {
            let headers: Vec<String> = sheet_row.iter().map(cell_text).collect();
            columns = header_columns(&headers);
            continue;
        }
        if columns.is_empty() {
            columns = positional_columns(sheet_row.len());
        }
        if sheet_row.iter().all(|cell| cell_text(cell).trim().is_empty()) {
            continue;
        }
        let row: Row = columns
            .iter()
            .enumerate()
            .map(|(position, column)| {
                let value = sheet_row.get(position).map(cell_value).unwrap_or(Value::Null);
                (column.key.clone(), value)
            })
            .collect();
        rows.push(row);
        if options.limit.is_some_and(|limit| rows.len() >= limit) {
            break;
        }
    }

    let total_rows = rows.len();
    Ok(Dataset {
        rows,
        columns,
        total_rows,
    })
}

// Typed workbook cells keep their scalar shape; empty cells become blank
// strings so downstream absence handling matches delimited input.
fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::String(String::new()),
        Data::String(text) => Value::String(text.clone()),
        Data::Float(value) => Value::Float(*value),
        Data::Int(value) => Value::Integer(*value),
        Data::Bool(value) => Value::Boolean(*value),
        Data::DateTime(stamp) => match stamp.as_datetime() {
            Some(parsed) => Value::String(parsed.format("%Y-%m-%dT%H:%M:%S").to_string()),
            None => Value::String(stamp.to_string()),
        },
        Data::DateTimeIso(text) | Data::DurationIso(text) => Value::String(text.clone()),
        Data::Error(error) => Value::String(error.to_string()),
    }
}

fn cell_text(cell: &Data) -> String {
    cell_value(cell).as_display()
}

fn header_columns(headers: &[String]) -> Vec<Column> {
    let mut seen = HashSet::new();
    headers
        .iter()
        .enumerate()
        .map(|(index, header)| {
            let trimmed = header.trim();
            let (key, display) = if trimmed.is_empty() {
                (format!("col{index}"), format!("Column {}", index + 1))
            } else {
                (trimmed.to_string(), trimmed.to_string())
            };
            Column::new(unique_key(key, &mut seen), display)
        })
        .collect()
}

fn positional_columns(width: usize) -> Vec<Column> {
    (0..width)
        .map(|index| Column::new(format!("col{index}"), format!("Column {}", index + 1)))
        .collect()
}

fn unique_key(key: String, seen: &mut HashSet<String>) -> String {
    if seen.insert(key.clone()) {
        return key;
    }
    let mut suffix = 2;
    loop {
        let candidate = format!("{key}_{suffix}");
        if seen.insert(candidate.clone()) {
            return candidate;
        }
        suffix += 1;
    }
}

// Short records pad with blanks; cells beyond the column set are dropped.
fn text_row(columns: &[Column], cells: &[String]) -> Row {
    columns
        .iter()
        .enumerate()
        .map(|(index, column)| {
            let cell = cells.get(index).cloned().unwrap_or_default();
            (column.key.clone(), Value::String(cell))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_headers_synthesize_positional_names() {
        let headers = vec!["Name".to_string(), String::new(), " ".to_string()];
        let columns = header_columns(&headers);
        assert_eq!(columns[0].key, "Name");
        assert_eq!(columns[1].key, "col1");
        assert_eq!(columns[1].header, "Column 2");
        assert_eq!(columns[2].key, "col2");
    }

    #[test]
    fn duplicate_headers_receive_suffixes() {
        let headers = vec!["id".to_string(), "id".to_string(), "id".to_string()];
        let columns = header_columns(&headers);
        assert_eq!(columns[0].key, "id");
        assert_eq!(columns[1].key, "id_2");
        assert_eq!(columns[2].key, "id_3");
        assert!(columns.iter().all(|column| column.header == "id"));
    }

    #[test]
    fn short_records_pad_with_blank_cells() {
        let columns = positional_columns(3);
        let row = text_row(&columns, &["a".to_string()]);
        assert_eq!(row.get("col0"), Some(&Value::String("a".to_string())));
        assert_eq!(row.get("col2"), Some(&Value::String(String::new())));
    }

    #[test]
    fn workbook_cells_keep_scalar_types() {
        assert_eq!(cell_value(&Data::Int(7)), Value::Integer(7));
        assert_eq!(cell_value(&Data::Bool(true)), Value::Boolean(true));
        assert_eq!(
            cell_value(&Data::String("x".to_string())),
            Value::String("x".to_string())
        );
        assert_eq!(cell_value(&Data::Empty), Value::String(String::new()));
    }
}
