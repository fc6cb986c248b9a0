//! Row-set transformation driven by mappings and per-target rules.

use log::{debug, warn};

use crate::convert::convert_value;
use crate::data::{Column, Mapping, Row, RuleSet, TransformedData, Value};

/// Builds one output row from one input row. Mapped cells with a rule go
/// through conversion (failures degrade to null); mappings without a rule
/// copy the source cell verbatim. Later mappings that reuse a target key
/// overwrite earlier ones.
pub fn transform_row(row: &Row, mappings: &[Mapping], rules: &RuleSet) -> Row {
    let absent = Value::Null;
    let mut output = Row::new();
    for mapping in mappings {
        let cell = row.get(&mapping.source.key).unwrap_or(&absent);
        let transformed = match rules.get(&mapping.target.key) {
            Some(rule) => {
                let result = convert_value(cell, rule.source_type, rule.target_type, &rule.options);
                if !result.success {
                    warn!(
                        "Failed to convert value for column '{}': {}",
                        mapping.target.key,
                        result.error.as_deref().unwrap_or("unknown error")
                    );
                }
                result.value
            }
            None => cell.clone(),
        };
        output.insert(mapping.target.key.clone(), transformed);
    }
    output
}

/// Output descriptors mirror the mapping list one-to-one. Type and
/// confidence carry the source column's inferred values, not the converted
/// target type; downstream consumers rely on that shape.
pub fn output_columns(mappings: &[Mapping]) -> Vec<Column> {
    mappings
        .iter()
        .map(|mapping| Column {
            key: mapping.target.key.clone(),
            header: mapping.target.header.clone(),
            data_type: mapping.source.data_type,
            confidence: mapping.source.confidence,
        })
        .collect()
}

/// Applies every mapping to every row. Per-cell failures never abort the
/// batch; the fatal path is reserved for conditions that prevent
/// processing the row set at all.
pub fn transform_data(rows: &[Row], mappings: &[Mapping], rules: &RuleSet) -> TransformedData {
    let data = rows
        .iter()
        .map(|row| transform_row(row, mappings, rules))
        .collect();
    TransformedData::new(data, output_columns(mappings))
}

/// Chunked variant for large row sets in interactive hosts. Results are
/// identical to a single `transform_data` call regardless of chunk size.
pub fn transform_chunks(
    rows: &[Row],
    mappings: &[Mapping],
    rules: &RuleSet,
    chunk_size: usize,
) -> TransformedData {
    if chunk_size == 0 {
        return TransformedData::failure("Chunk size must be at least 1");
    }
    let mut data = Vec::with_capacity(rows.len());
    for (index, chunk) in rows.chunks(chunk_size).enumerate() {
        for row in chunk {
            data.push(transform_row(row, mappings, rules));
        }
        debug!("transformed chunk {} ({} rows so far)", index + 1, data.len());
    }
    TransformedData::new(data, output_columns(mappings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DataType, TransformationRule};

    fn row_of(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    fn mapping(source: &str, target: &str) -> Mapping {
        Mapping {
            source: Column::new(source, source.to_uppercase()),
            target: Column::new(target, target.to_uppercase()),
        }
    }

    #[test]
    fn missing_source_cells_read_as_null() {
        let row = row_of(&[("a", Value::Integer(1))]);
        let mappings = vec![mapping("missing", "out")];
        let output = transform_row(&row, &mappings, &RuleSet::new());
        assert_eq!(output.get("out"), Some(&Value::Null));
    }

    #[test]
    fn duplicate_target_keys_resolve_last_write_wins() {
        let row = row_of(&[
            ("first", Value::String("one".to_string())),
            ("second", Value::String("two".to_string())),
        ]);
        let mappings = vec![mapping("first", "out"), mapping("second", "out")];
        let output = transform_row(&row, &mappings, &RuleSet::new());
        assert_eq!(output.get("out"), Some(&Value::String("two".to_string())));
    }

    #[test]
    fn unmapped_rules_copy_cells_verbatim() {
        let row = row_of(&[("a", Value::Float(2.5))]);
        let mappings = vec![mapping("a", "b")];
        let output = transform_row(&row, &mappings, &RuleSet::new());
        assert_eq!(output.get("b"), Some(&Value::Float(2.5)));
    }

    #[test]
    fn failed_conversions_degrade_to_null_without_aborting() {
        let row = row_of(&[
            ("a", Value::String("abc".to_string())),
            ("b", Value::String("42".to_string())),
        ]);
        let mappings = vec![mapping("a", "x"), mapping("b", "y")];
        let mut rules = RuleSet::new();
        rules.insert(
            "x".to_string(),
            TransformationRule::new(DataType::String, DataType::Number),
        );
        rules.insert(
            "y".to_string(),
            TransformationRule::new(DataType::String, DataType::Integer),
        );
        let output = transform_row(&row, &mappings, &rules);
        assert_eq!(output.get("x"), Some(&Value::Null));
        assert_eq!(output.get("y"), Some(&Value::Integer(42)));
    }

    #[test]
    fn zero_chunk_size_is_a_whole_batch_failure() {
        let result = transform_chunks(&[], &[], &RuleSet::new(), 0);
        assert!(result.is_failure());
        assert!(result.data.is_empty());
        assert!(result.columns.is_empty());
    }

    #[test]
    fn chunked_and_direct_transforms_agree() {
        let rows: Vec<Row> = (0..25)
            .map(|i| row_of(&[("n", Value::String(i.to_string()))]))
            .collect();
        let mappings = vec![mapping("n", "value")];
        let mut rules = RuleSet::new();
        rules.insert(
            "value".to_string(),
            TransformationRule::new(DataType::String, DataType::Integer),
        );
        let direct = transform_data(&rows, &mappings, &rules);
        let chunked = transform_chunks(&rows, &mappings, &rules, 7);
        assert_eq!(direct, chunked);
    }
}
