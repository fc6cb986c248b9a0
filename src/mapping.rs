//! Mapping validation and the on-disk mapping spec document.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::{DataType, Mapping, Row, RuleSet};

/// Target types each source type maps to without an incompatibility flag.
pub fn compatible_targets(source: DataType) -> &'static [DataType] {
    match source {
        DataType::String => &[DataType::String, DataType::Email, DataType::Phone],
        DataType::Number => &[DataType::Number, DataType::Integer, DataType::String],
        DataType::Integer => &[DataType::Integer, DataType::Number, DataType::String],
        DataType::Boolean => &[DataType::Boolean, DataType::String],
        DataType::Date => &[DataType::Date, DataType::String],
        DataType::Email => &[DataType::Email, DataType::String],
        DataType::Phone => &[DataType::Phone, DataType::String],
        DataType::Unknown => &[
            DataType::String,
            DataType::Number,
            DataType::Integer,
            DataType::Boolean,
            DataType::Date,
            DataType::Email,
            DataType::Phone,
            DataType::Unknown,
        ],
    }
}

pub fn is_compatible(source: DataType, target: DataType) -> bool {
    compatible_targets(source).contains(&target)
}

/// Advisory verdict for one mapping. Does not gate transformation.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingValidation {
    pub valid: bool,
    pub error: Option<String>,
}

impl MappingValidation {
    fn valid() -> Self {
        MappingValidation {
            valid: true,
            error: None,
        }
    }

    fn invalid(message: impl Into<String>) -> Self {
        MappingValidation {
            valid: false,
            error: Some(message.into()),
        }
    }
}

/// Checks one mapping against a sample of rows: the source key must exist
/// in the first row, and declared source/target types must be compatible.
pub fn validate_mapping(mapping: &Mapping, sample_rows: &[Row]) -> MappingValidation {
    let source_key = &mapping.source.key;
    let key_present = sample_rows
        .first()
        .is_some_and(|row| row.contains_key(source_key));
    if !key_present {
        return MappingValidation::invalid(format!(
            "Source column \"{source_key}\" not found in data"
        ));
    }

    if let (Some(source_type), Some(target_type)) =
        (mapping.source.data_type, mapping.target.data_type)
    {
        if !is_compatible(source_type, target_type) {
            return MappingValidation::invalid(format!(
                "Incompatible types: {source_type} cannot be mapped to {target_type}"
            ));
        }
    }

    MappingValidation::valid()
}

/// On-disk document bundling a mapping set with its rule set. Loads from
/// YAML or JSON by extension.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingSpec {
    pub mappings: Vec<Mapping>,
    #[serde(default, skip_serializing_if = "RuleSet::is_empty")]
    pub transformation_rules: RuleSet,
}

impl MappingSpec {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Reading mapping spec from {path:?}"))?;
        let spec: MappingSpec = if is_yaml(path) {
            serde_yaml::from_str(&raw)
                .with_context(|| format!("Parsing YAML mapping spec {path:?}"))?
        } else {
            serde_json::from_str(&raw)
                .with_context(|| format!("Parsing JSON mapping spec {path:?}"))?
        };
        spec.ensure_valid()?;
        Ok(spec)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let serialized = if is_yaml(path) {
            serde_yaml::to_string(self).context("Serializing mapping spec to YAML")?
        } else {
            serde_json::to_string_pretty(self).context("Serializing mapping spec to JSON")?
        };
        fs::write(path, serialized).with_context(|| format!("Writing mapping spec to {path:?}"))
    }

    pub fn ensure_valid(&self) -> Result<()> {
        for mapping in &self.mappings {
            mapping
                .source
                .ensure_valid()
                .with_context(|| format!("Invalid source column '{}'", mapping.source.key))?;
            mapping
                .target
                .ensure_valid()
                .with_context(|| format!("Invalid target column '{}'", mapping.target.key))?;
        }
        Ok(())
    }

    pub fn target_keys(&self) -> impl Iterator<Item = &str> {
        self.mappings.iter().map(|mapping| mapping.target.key.as_str())
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    )
}
