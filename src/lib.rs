pub mod apply;
pub mod cli;
pub mod configs;
pub mod convert;
pub mod data;
pub mod detect;
pub mod export;
pub mod ingest;
pub mod io_utils;
pub mod mapping;
pub mod preview;
pub mod probe;
pub mod store;
pub mod table;
pub mod transform;

use std::{env, sync::OnceLock};

use anyhow::{Result, bail};
use clap::Parser;
use itertools::Itertools;
use log::{LevelFilter, info, warn};

use crate::cli::{Cli, Commands};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging(verbose: bool) {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            let level = if verbose {
                LevelFilter::Debug
            } else {
                LevelFilter::Info
            };
            builder.filter_module("csv_remap", level);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.command {
        Commands::Probe(args) => probe::execute(&args),
        Commands::Validate(args) => handle_validate(&args),
        Commands::Apply(args) => apply::execute(&args),
        Commands::Preview(args) => preview::execute(&args),
        Commands::Configs(args) => configs::execute(&args),
    }
}

fn handle_validate(args: &cli::ValidateArgs) -> Result<()> {
    let spec = mapping::MappingSpec::load(&args.spec)?;
    let options = ingest::IngestOptions {
        delimiter: args.delimiter,
        encoding: args.input_encoding.clone(),
        no_headers: args.no_headers,
        limit: Some(args.sample_rows),
    };
    let dataset = ingest::read_dataset(&args.input, &options)?;

    let duplicates: Vec<&str> = spec.target_keys().duplicates().collect();
    if !duplicates.is_empty() {
        warn!(
            "Duplicate target key(s) {duplicates:?}: later mappings overwrite earlier ones"
        );
    }

    let mut invalid = 0usize;
    for mapping in &spec.mappings {
        let verdict = mapping::validate_mapping(mapping, &dataset.rows);
        match verdict.error {
            None => println!("ok    {} -> {}", mapping.source.key, mapping.target.key),
            Some(message) => {
                invalid += 1;
                println!(
                    "FAIL  {} -> {}: {message}",
                    mapping.source.key, mapping.target.key
                );
            }
        }
    }

    if invalid > 0 {
        bail!(
            "{invalid} of {} mapping(s) failed validation",
            spec.mappings.len()
        );
    }
    info!("All {} mapping(s) are valid", spec.mappings.len());
    Ok(())
}
