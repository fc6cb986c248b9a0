use std::collections::BTreeMap;
use std::fmt;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// Semantic type tags recognized by detection and conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    String,
    Number,
    Integer,
    Boolean,
    Date,
    Email,
    Phone,
    Unknown,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::String => "string",
            DataType::Number => "number",
            DataType::Integer => "integer",
            DataType::Boolean => "boolean",
            DataType::Date => "date",
            DataType::Email => "email",
            DataType::Phone => "phone",
            DataType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single cell value. Variant order matters: untagged deserialization
/// tries variants top to bottom, so `Null` must precede the scalars and
/// `Integer` must precede `Float` for whole JSON numbers to stay integral.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl Value {
    /// Absent cells (null or empty string) convert to null unconditionally.
    pub fn is_absent(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn as_display(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Boolean(b) => b.to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => {
                if f.fract() == 0.0 {
                    (*f as i64).to_string()
                } else {
                    f.to_string()
                }
            }
            Value::String(s) => s.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

/// A row keyed by column key. BTreeMap keeps iteration deterministic.
pub type Row = BTreeMap<String, Value>;

/// A named, typed slot in a tabular dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub key: String,
    pub header: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<DataType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl Column {
    pub fn new(key: impl Into<String>, header: impl Into<String>) -> Self {
        Column {
            key: key.into(),
            header: header.into(),
            data_type: None,
            confidence: None,
        }
    }

    pub fn with_type(mut self, data_type: DataType, confidence: f64) -> Self {
        self.data_type = Some(data_type);
        self.confidence = Some(confidence);
        self
    }

    pub fn ensure_valid(&self) -> Result<()> {
        if self.key.is_empty() {
            bail!("Column key cannot be empty");
        }
        if let Some(confidence) = self.confidence {
            if !(0.0..=1.0).contains(&confidence) {
                bail!(
                    "Column '{}' has confidence {confidence} outside [0, 1]",
                    self.key
                );
            }
        }
        Ok(())
    }
}

/// An association from one source column to one target column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mapping {
    pub source: Column,
    pub target: Column,
}

/// Free-form conversion options (e.g. `format`, `countryCode`).
pub type RuleOptions = BTreeMap<String, Value>;

/// Declared source/target type pair plus options for one mapped column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformationRule {
    pub source_type: DataType,
    pub target_type: DataType,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: RuleOptions,
}

impl TransformationRule {
    pub fn new(source_type: DataType, target_type: DataType) -> Self {
        TransformationRule {
            source_type,
            target_type,
            options: RuleOptions::new(),
        }
    }

    pub fn with_options(mut self, options: RuleOptions) -> Self {
        self.options = options;
        self
    }
}

/// Active rules keyed by target column key.
pub type RuleSet = BTreeMap<String, TransformationRule>;

/// Outcome of a single cell conversion. Failure carries a message and a
/// null value; it never aborts the surrounding batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub value: Value,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConversionResult {
    pub fn converted(value: Value) -> Self {
        ConversionResult {
            value,
            success: true,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        ConversionResult {
            value: Value::Null,
            success: false,
            error: Some(message.into()),
        }
    }
}

/// Result of transforming a whole row set. `error` is set only on a fatal
/// whole-batch failure, in which case `data` and `columns` are empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformedData {
    pub data: Vec<Row>,
    pub columns: Vec<Column>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TransformedData {
    pub fn new(data: Vec<Row>, columns: Vec<Column>) -> Self {
        TransformedData {
            data,
            columns,
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        TransformedData {
            data: Vec::new(),
            columns: Vec::new(),
            error: Some(message.into()),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_untagged_round_trip_preserves_variants() {
        let json = r#"[null, true, 42, 4.5, "text"]"#;
        let values: Vec<Value> = serde_json::from_str(json).unwrap();
        assert_eq!(
            values,
            vec![
                Value::Null,
                Value::Boolean(true),
                Value::Integer(42),
                Value::Float(4.5),
                Value::String("text".to_string()),
            ]
        );
        assert_eq!(serde_json::to_string(&values).unwrap(), r#"[null,true,42,4.5,"text"]"#);
    }

    #[test]
    fn value_display_collapses_whole_floats() {
        assert_eq!(Value::Float(3.0).as_display(), "3");
        assert_eq!(Value::Float(3.25).as_display(), "3.25");
        assert_eq!(Value::Null.as_display(), "");
    }

    #[test]
    fn absent_values_cover_null_and_empty_string() {
        assert!(Value::Null.is_absent());
        assert!(Value::String(String::new()).is_absent());
        assert!(!Value::String(" ".to_string()).is_absent());
        assert!(!Value::Integer(0).is_absent());
    }

    #[test]
    fn column_confidence_must_lie_in_unit_interval() {
        let valid = Column::new("id", "ID").with_type(DataType::Integer, 0.9);
        assert!(valid.ensure_valid().is_ok());

        let invalid = Column::new("id", "ID").with_type(DataType::Integer, 1.5);
        let err = invalid.ensure_valid().unwrap_err();
        assert!(err.to_string().contains("outside [0, 1]"));
    }

    #[test]
    fn transformation_rule_uses_camel_case_wire_shape() {
        let rule: TransformationRule =
            serde_json::from_str(r#"{"sourceType":"string","targetType":"integer"}"#).unwrap();
        assert_eq!(rule.source_type, DataType::String);
        assert_eq!(rule.target_type, DataType::Integer);
        assert!(rule.options.is_empty());

        let serialized = serde_json::to_string(&rule).unwrap();
        assert_eq!(serialized, r#"{"sourceType":"string","targetType":"integer"}"#);
    }

    #[test]
    fn failed_conversion_always_carries_null_and_message() {
        let result = ConversionResult::failed("Invalid number format");
        assert_eq!(result.value, Value::Null);
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Invalid number format"));
    }
}
