use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Parser, Subcommand};

use crate::export::ExportFormat;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Map, convert, and transform tabular datasets against a target schema",
    long_about = None
)]
pub struct Cli {
    /// Enable debug-level diagnostics
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Inspect a dataset and infer per-column types
    Probe(ProbeArgs),
    /// Check a mapping spec against a sample of the dataset
    Validate(ValidateArgs),
    /// Transform a dataset with a mapping spec and export the result
    Apply(ApplyArgs),
    /// Preview the first transformed rows as a formatted table
    Preview(PreviewArgs),
    /// Manage saved mapping configurations
    Configs(ConfigsArgs),
}

#[derive(Debug, Args)]
pub struct ProbeArgs {
    /// Input data file (CSV/TSV or Excel workbook; '-' reads CSV from stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Number of rows to sample per column when inferring types
    #[arg(long, default_value_t = 100)]
    pub sample_rows: usize,
    /// Write a starter mapping spec here (YAML or JSON by extension)
    #[arg(long = "starter-spec")]
    pub starter_spec: Option<PathBuf>,
    /// Treat the first row as data instead of headers
    #[arg(long = "no-headers")]
    pub no_headers: bool,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Input data file to sample
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Mapping spec file (YAML or JSON)
    #[arg(short = 's', long = "spec")]
    pub spec: PathBuf,
    /// Number of rows to sample for the structural checks
    #[arg(long, default_value_t = 100)]
    pub sample_rows: usize,
    /// Treat the first row as data instead of headers
    #[arg(long = "no-headers")]
    pub no_headers: bool,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Input data file to transform
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Mapping spec file (YAML or JSON)
    #[arg(short = 's', long = "spec")]
    pub spec: Option<PathBuf>,
    /// Config store file holding saved configurations
    #[arg(long = "store")]
    pub store: Option<PathBuf>,
    /// Id of the saved configuration to apply
    #[arg(long = "config")]
    pub config: Option<String>,
    /// Output file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Export format (csv or xlsx)
    #[arg(long = "format", value_parser = parse_export_format)]
    pub format: Option<ExportFormat>,
    /// Worksheet name for Excel output (defaults to Sheet1)
    #[arg(long = "sheet-name")]
    pub sheet_name: Option<String>,
    /// Omit the header row from the output
    #[arg(long = "omit-headers")]
    pub omit_headers: bool,
    /// Transform in chunks of this many rows (0 = single pass)
    #[arg(long = "chunk-size", default_value_t = 0)]
    pub chunk_size: usize,
    /// Maximum rows to transform (0 = all)
    #[arg(long, default_value_t = 0)]
    pub limit: usize,
    /// Treat the first row as data instead of headers
    #[arg(long = "no-headers")]
    pub no_headers: bool,
    /// CSV delimiter character for reading input
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Delimiter to use for output (defaults by output extension)
    #[arg(long = "output-delimiter", value_parser = parse_delimiter)]
    pub output_delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// Input data file to preview
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Mapping spec file (YAML or JSON)
    #[arg(short = 's', long = "spec")]
    pub spec: Option<PathBuf>,
    /// Config store file holding saved configurations
    #[arg(long = "store")]
    pub store: Option<PathBuf>,
    /// Id of the saved configuration to apply
    #[arg(long = "config")]
    pub config: Option<String>,
    /// Number of transformed rows to display
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
    /// Treat the first row as data instead of headers
    #[arg(long = "no-headers")]
    pub no_headers: bool,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct ConfigsArgs {
    /// Config store file (JSON)
    #[arg(long = "store")]
    pub store: PathBuf,
    #[command(subcommand)]
    pub action: ConfigsAction,
}

#[derive(Debug, Subcommand)]
pub enum ConfigsAction {
    /// List saved configurations
    List,
    /// Print one configuration as pretty JSON
    Show(ConfigShowArgs),
    /// Save a mapping spec as a named configuration
    Save(ConfigSaveArgs),
    /// Delete a configuration by id
    Delete(ConfigDeleteArgs),
}

#[derive(Debug, Args)]
pub struct ConfigShowArgs {
    /// Configuration id
    #[arg(long)]
    pub id: String,
}

#[derive(Debug, Args)]
pub struct ConfigSaveArgs {
    /// Display name for the configuration
    #[arg(long)]
    pub name: String,
    /// Free-form note on what the configuration is for
    #[arg(long)]
    pub description: Option<String>,
    /// Mapping spec file to wrap (YAML or JSON)
    #[arg(short = 's', long = "spec")]
    pub spec: PathBuf,
    /// Export format to record (csv or xlsx)
    #[arg(long = "format", value_parser = parse_export_format, default_value = "csv")]
    pub format: ExportFormat,
    /// Worksheet name to record for Excel exports
    #[arg(long = "sheet-name")]
    pub sheet_name: Option<String>,
    /// Record that exports should omit the header row
    #[arg(long = "omit-headers")]
    pub omit_headers: bool,
}

#[derive(Debug, Args)]
pub struct ConfigDeleteArgs {
    /// Configuration id
    #[arg(long)]
    pub id: String,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

pub fn parse_export_format(value: &str) -> Result<ExportFormat, String> {
    ExportFormat::from_str(value).map_err(|err| err.to_string())
}
