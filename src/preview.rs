use anyhow::{Result, bail};
use log::info;

use crate::apply::resolve_spec;
use crate::cli::PreviewArgs;
use crate::ingest::{IngestOptions, read_dataset};
use crate::table;
use crate::transform::transform_data;

pub fn execute(args: &PreviewArgs) -> Result<()> {
    let resolved = resolve_spec(
        args.spec.as_deref(),
        args.store.as_deref(),
        args.config.as_deref(),
    )?;

    let options = IngestOptions {
        delimiter: args.delimiter,
        encoding: args.input_encoding.clone(),
        no_headers: args.no_headers,
        limit: Some(args.rows),
    };
    let dataset = read_dataset(&args.input, &options)?;

    let transformed = transform_data(
        &dataset.rows,
        &resolved.spec.mappings,
        &resolved.spec.transformation_rules,
    );
    if let Some(message) = &transformed.error {
        bail!("Transformation failed: {message}");
    }

    print!(
        "{}",
        table::row_grid(&transformed.columns, &transformed.data, args.rows)
    );
    info!(
        "Previewed {} transformed row(s)",
        transformed.data.len().min(args.rows)
    );
    Ok(())
}
