//! Serialization of transformed data into output files.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use log::{debug, info};
use rust_xlsxwriter::{Workbook, Worksheet};
use serde::{Deserialize, Serialize};

use crate::data::{TransformedData, Value};
use crate::io_utils::{is_dash, open_csv_writer, resolve_output_delimiter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "xlsx" => Ok(ExportFormat::Xlsx),
            other => bail!("Unsupported export format '{other}'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportConfig {
    pub format: ExportFormat,
    #[serde(default = "default_include_headers")]
    pub include_headers: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet_name: Option<String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            format: ExportFormat::Csv,
            include_headers: true,
            sheet_name: None,
        }
    }
}

fn default_include_headers() -> bool {
    true
}

/// Writes a transformed row set according to the export config. CSV goes
/// through the shared writer plumbing and can stream to stdout; xlsx
/// writes a single-worksheet workbook and needs a real output path.
pub fn write_dataset(
    data: &TransformedData,
    config: &ExportConfig,
    path: Option<&Path>,
    delimiter: Option<u8>,
) -> Result<()> {
    if let Some(message) = &data.error {
        bail!("Cannot export a failed transformation: {message}");
    }
    match config.format {
        ExportFormat::Csv => write_csv(data, config.include_headers, path, delimiter),
        ExportFormat::Xlsx => write_xlsx(data, config, path),
    }
}

fn write_csv(
    data: &TransformedData,
    include_headers: bool,
    path: Option<&Path>,
    delimiter: Option<u8>,
) -> Result<()> {
    let delimiter = resolve_output_delimiter(path, delimiter);
    let mut writer = open_csv_writer(path, delimiter)?;

    if include_headers {
        let headers: Vec<&str> = data
            .columns
            .iter()
            .map(|column| column.header.as_str())
            .collect();
        writer.write_record(&headers).context("Writing header row")?;
    }

    let absent = Value::Null;
    for row in &data.data {
        let record: Vec<String> = data
            .columns
            .iter()
            .map(|column| row.get(&column.key).unwrap_or(&absent).as_display())
            .collect();
        writer.write_record(&record).context("Writing data row")?;
    }
    writer.flush().context("Flushing CSV output")?;

    info!("Exported {} row(s) as csv", data.data.len());
    Ok(())
}

fn write_xlsx(data: &TransformedData, config: &ExportConfig, path: Option<&Path>) -> Result<()> {
    let path = match path {
        Some(p) if !is_dash(p) => p,
        _ => bail!("Excel export requires an output file path"),
    };
    if !config.include_headers {
        debug!("Excel output always writes the header row");
    }

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(config.sheet_name.as_deref().unwrap_or("Sheet1"))
        .context("Naming worksheet")?;

    for (position, column) in data.columns.iter().enumerate() {
        worksheet
            .write_string(0, position as u16, column.header.as_str())
            .context("Writing header row")?;
    }
    for (index, row) in data.data.iter().enumerate() {
        for (position, column) in data.columns.iter().enumerate() {
            write_cell(
                worksheet,
                (index + 1) as u32,
                position as u16,
                row.get(&column.key),
            )?;
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("Writing workbook {path:?}"))?;
    info!("Exported {} row(s) as xlsx", data.data.len());
    Ok(())
}

// Null cells stay unwritten so spreadsheet consumers see true blanks.
fn write_cell(worksheet: &mut Worksheet, row: u32, col: u16, value: Option<&Value>) -> Result<()> {
    match value {
        None | Some(Value::Null) => {}
        Some(Value::Boolean(flag)) => {
            worksheet
                .write_boolean(row, col, *flag)
                .context("Writing data row")?;
        }
        Some(Value::Integer(number)) => {
            worksheet
                .write_number(row, col, *number as f64)
                .context("Writing data row")?;
        }
        Some(Value::Float(number)) => {
            worksheet
                .write_number(row, col, *number)
                .context("Writing data row")?;
        }
        Some(Value::String(text)) => {
            worksheet
                .write_string(row, col, text.as_str())
                .context("Writing data row")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{Data, Reader, open_workbook_auto};
    use tempfile::tempdir;

    use crate::data::{Column, Row};

    #[test]
    fn format_parsing_is_case_insensitive() {
        assert_eq!(ExportFormat::from_str("CSV").unwrap(), ExportFormat::Csv);
        assert_eq!(ExportFormat::from_str(" xlsx ").unwrap(), ExportFormat::Xlsx);

        let err = ExportFormat::from_str("parquet").unwrap_err();
        assert_eq!(err.to_string(), "Unsupported export format 'parquet'");
    }

    fn typed_sample() -> TransformedData {
        let columns = vec![
            Column::new("n", "N"),
            Column::new("ok", "OK"),
            Column::new("who", "Who"),
        ];
        let mut first = Row::new();
        first.insert("n".to_string(), Value::Integer(42));
        first.insert("ok".to_string(), Value::Boolean(true));
        first.insert("who".to_string(), Value::String("amelia".to_string()));
        let mut second = Row::new();
        second.insert("n".to_string(), Value::Float(4.5));
        second.insert("ok".to_string(), Value::Null);
        second.insert("who".to_string(), Value::String("bo".to_string()));
        TransformedData::new(vec![first, second], columns)
    }

    #[test]
    fn xlsx_workbook_round_trips_typed_cells() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        let config = ExportConfig {
            format: ExportFormat::Xlsx,
            include_headers: true,
            sheet_name: Some("Results".to_string()),
        };
        write_dataset(&typed_sample(), &config, Some(&path), None).unwrap();

        let mut workbook = open_workbook_auto(&path).unwrap();
        assert!(workbook.sheet_names().contains(&"Results".to_string()));
        let range = workbook.worksheet_range_at(0).expect("one sheet").unwrap();

        assert_eq!(range.get_value((0, 0)), Some(&Data::String("N".to_string())));
        assert_eq!(range.get_value((1, 0)), Some(&Data::Float(42.0)));
        assert_eq!(range.get_value((1, 1)), Some(&Data::Bool(true)));
        assert_eq!(range.get_value((2, 0)), Some(&Data::Float(4.5)));
        assert_eq!(range.get_value((2, 1)), Some(&Data::Empty));
        assert_eq!(
            range.get_value((2, 2)),
            Some(&Data::String("bo".to_string()))
        );
    }

    #[test]
    fn xlsx_header_row_ignores_the_headers_flag() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        let config = ExportConfig {
            format: ExportFormat::Xlsx,
            include_headers: false,
            sheet_name: None,
        };
        write_dataset(&typed_sample(), &config, Some(&path), None).unwrap();

        let mut workbook = open_workbook_auto(&path).unwrap();
        assert!(workbook.sheet_names().contains(&"Sheet1".to_string()));
        let range = workbook.worksheet_range_at(0).expect("one sheet").unwrap();
        assert_eq!(range.get_value((0, 0)), Some(&Data::String("N".to_string())));
        assert_eq!(range.get_value((1, 0)), Some(&Data::Float(42.0)));
    }

    #[test]
    fn xlsx_export_requires_a_real_output_path() {
        let config = ExportConfig {
            format: ExportFormat::Xlsx,
            ..ExportConfig::default()
        };
        for path in [None, Some(Path::new("-"))] {
            let err = write_dataset(&typed_sample(), &config, path, None).unwrap_err();
            assert!(err.to_string().contains("output file path"));
        }
    }

    #[test]
    fn failed_transformations_are_not_exportable() {
        let data = TransformedData::failure("boom");
        let err = write_dataset(&data, &ExportConfig::default(), None, None).unwrap_err();
        assert!(err.to_string().contains("failed transformation"));
    }
}
