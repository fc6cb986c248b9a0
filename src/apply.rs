use std::path::Path;

use anyhow::{Context, Result, bail};
use log::info;

use crate::cli::ApplyArgs;
use crate::export::{self, ExportConfig};
use crate::ingest::{IngestOptions, read_dataset};
use crate::mapping::MappingSpec;
use crate::store::{ConfigStore, JsonFileStore};
use crate::transform::{transform_chunks, transform_data};

#[derive(Debug)]
pub(crate) struct ResolvedSpec {
    pub spec: MappingSpec,
    pub export_config: ExportConfig,
}

/// A mapping spec comes from a spec file or from a saved configuration,
/// never both.
pub(crate) fn resolve_spec(
    spec_path: Option<&Path>,
    store_path: Option<&Path>,
    config_id: Option<&str>,
) -> Result<ResolvedSpec> {
    match (spec_path, store_path, config_id) {
        (Some(path), None, None) => Ok(ResolvedSpec {
            spec: MappingSpec::load(path)?,
            export_config: ExportConfig::default(),
        }),
        (None, Some(store), Some(id)) => {
            let store = JsonFileStore::new(store);
            let config = store
                .load(id)?
                .with_context(|| format!("No configuration with id '{id}' in the store"))?;
            info!("Using configuration '{}' ({id})", config.name);
            Ok(ResolvedSpec {
                spec: config.spec,
                export_config: config.export_config,
            })
        }
        (Some(_), _, _) => bail!("--spec cannot be combined with --store/--config"),
        (None, _, _) => bail!("Provide either --spec or both --store and --config"),
    }
}

pub fn execute(args: &ApplyArgs) -> Result<()> {
    let resolved = resolve_spec(
        args.spec.as_deref(),
        args.store.as_deref(),
        args.config.as_deref(),
    )?;

    let options = IngestOptions {
        delimiter: args.delimiter,
        encoding: args.input_encoding.clone(),
        no_headers: args.no_headers,
        limit: (args.limit > 0).then_some(args.limit),
    };
    let dataset = read_dataset(&args.input, &options)?;

    let rules = &resolved.spec.transformation_rules;
    let transformed = if args.chunk_size > 0 {
        transform_chunks(
            &dataset.rows,
            &resolved.spec.mappings,
            rules,
            args.chunk_size,
        )
    } else {
        transform_data(&dataset.rows, &resolved.spec.mappings, rules)
    };
    if let Some(message) = &transformed.error {
        bail!("Transformation failed: {message}");
    }

    let mut export_config = resolved.export_config;
    if let Some(format) = args.format {
        export_config.format = format;
    }
    if let Some(name) = &args.sheet_name {
        export_config.sheet_name = Some(name.clone());
    }
    if args.omit_headers {
        export_config.include_headers = false;
    }

    export::write_dataset(
        &transformed,
        &export_config,
        args.output.as_deref(),
        args.output_delimiter,
    )?;
    info!(
        "Transformed {} row(s) into {} column(s)",
        transformed.data.len(),
        transformed.columns.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_and_store_sources_are_mutually_exclusive() {
        let err = resolve_spec(
            Some(Path::new("spec.yaml")),
            Some(Path::new("store.json")),
            Some("id"),
        )
        .unwrap_err();
        assert!(err.to_string().contains("cannot be combined"));

        let err = resolve_spec(None, Some(Path::new("store.json")), None).unwrap_err();
        assert!(err.to_string().contains("Provide either"));

        let err = resolve_spec(None, None, None).unwrap_err();
        assert!(err.to_string().contains("Provide either"));
    }
}
