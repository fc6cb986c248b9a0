use std::collections::HashSet;

use anyhow::Result;
use heck::ToSnakeCase;
use log::info;

use crate::cli::ProbeArgs;
use crate::convert::default_rule_options;
use crate::data::{Column, DataType, Mapping, TransformationRule, Value};
use crate::detect::detect_column_type;
use crate::ingest::{Dataset, IngestOptions, read_dataset};
use crate::mapping::MappingSpec;
use crate::table;

pub fn execute(args: &ProbeArgs) -> Result<()> {
    let options = IngestOptions {
        delimiter: args.delimiter,
        encoding: args.input_encoding.clone(),
        no_headers: args.no_headers,
        limit: None,
    };
    let dataset = read_dataset(&args.input, &options)?;
    let columns = probe_dataset(&dataset, args.sample_rows);
    print!("{}", table::column_summary(&columns));

    if let Some(path) = &args.starter_spec {
        let spec = starter_spec(&columns);
        spec.save(path)?;
        info!(
            "Wrote starter mapping spec with {} mapping(s) to {path:?}",
            spec.mappings.len()
        );
    }

    Ok(())
}

/// Fills in type and confidence on every column by sampling up to
/// `sample_rows` rows per column.
pub fn probe_dataset(dataset: &Dataset, sample_rows: usize) -> Vec<Column> {
    dataset
        .columns
        .iter()
        .map(|column| {
            let samples: Vec<String> = dataset
                .rows
                .iter()
                .take(sample_rows)
                .map(|row| row.get(&column.key).map(Value::as_display).unwrap_or_default())
                .collect();
            let (data_type, confidence) = detect_column_type(&samples);
            Column::new(column.key.clone(), column.header.clone())
                .with_type(data_type, confidence)
        })
        .collect()
}

/// Builds an identity mapping spec from probed columns: snake_cased target
/// keys and one same-type rule per column with a detected type.
pub fn starter_spec(columns: &[Column]) -> MappingSpec {
    let mut spec = MappingSpec::default();
    let mut seen = HashSet::new();
    for column in columns {
        let mut target_key = column.header.to_snake_case();
        if target_key.is_empty() {
            target_key = column.key.to_snake_case();
        }
        if !seen.insert(target_key.clone()) {
            let mut suffix = 2;
            target_key = loop {
                let candidate = format!("{target_key}_{suffix}");
                if seen.insert(candidate.clone()) {
                    break candidate;
                }
                suffix += 1;
            };
        }

        let mut target = Column::new(target_key.clone(), column.header.clone());
        target.data_type = column.data_type;

        if let Some(data_type) = column.data_type.filter(|dt| *dt != DataType::Unknown) {
            spec.transformation_rules.insert(
                target_key,
                TransformationRule::new(data_type, data_type)
                    .with_options(default_rule_options(data_type)),
            );
        }

        spec.mappings.push(Mapping {
            source: column.clone(),
            target,
        });
    }
    spec
}
