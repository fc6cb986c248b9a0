//! Cell-level conversion between detected and requested types.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::debug;
use thiserror::Error;

use crate::data::{ConversionResult, DataType, RuleOptions, Value};
use crate::detect::{DATE_FORMATS, EMAIL_RE};

/// Per-cell conversion failures. The display strings are user-visible and
/// surface verbatim in `ConversionResult.error`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConvertError {
    #[error("Invalid number format")]
    InvalidNumber,
    #[error("Invalid integer format")]
    InvalidInteger,
    #[error("Invalid boolean value")]
    InvalidBoolean,
    #[error("Invalid date value")]
    InvalidDate,
    #[error("Invalid email format")]
    InvalidEmail,
    #[error("Phone number too short")]
    PhoneTooShort,
}

/// Converts one cell from `source_type` to `target_type`. Absent values
/// (null or empty string) convert to null unconditionally. Failures are
/// reported in the result, never propagated.
pub fn convert_value(
    value: &Value,
    source_type: DataType,
    target_type: DataType,
    options: &RuleOptions,
) -> ConversionResult {
    if value.is_absent() {
        return ConversionResult::converted(Value::Null);
    }
    let raw = value.as_display();
    match convert_text(&raw, target_type, options) {
        Ok(converted) => ConversionResult::converted(converted),
        Err(err) => {
            debug!("cannot convert {raw:?} ({source_type} -> {target_type}): {err}");
            ConversionResult::failed(err.to_string())
        }
    }
}

fn convert_text(
    raw: &str,
    target_type: DataType,
    options: &RuleOptions,
) -> Result<Value, ConvertError> {
    match target_type {
        DataType::String => Ok(Value::String(raw.to_string())),
        DataType::Number => to_number(raw),
        DataType::Integer => to_integer(raw),
        DataType::Boolean => to_boolean(raw),
        DataType::Date => to_date(raw, options),
        DataType::Email => to_email(raw),
        DataType::Phone => to_phone(raw, options),
        DataType::Unknown => Ok(Value::String(raw.to_string())),
    }
}

fn to_number(raw: &str) -> Result<Value, ConvertError> {
    let parsed: f64 = raw.trim().parse().map_err(|_| ConvertError::InvalidNumber)?;
    if !parsed.is_finite() {
        return Err(ConvertError::InvalidNumber);
    }
    if parsed.fract() == 0.0 && parsed.abs() < i64::MAX as f64 {
        Ok(Value::Integer(parsed as i64))
    } else {
        Ok(Value::Float(parsed))
    }
}

fn to_integer(raw: &str) -> Result<Value, ConvertError> {
    parse_leading_integer(raw)
        .map(Value::Integer)
        .ok_or(ConvertError::InvalidInteger)
}

// Base-10 prefix parse: optional sign, then digits; trailing text is
// ignored, so "42abc" reads as 42 and "4.7" as 4.
fn parse_leading_integer(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let bytes = trimmed.as_bytes();
    let start = usize::from(matches!(bytes.first(), Some(b'+') | Some(b'-')));
    let mut end = start;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == start {
        return None;
    }
    trimmed[..end].parse().ok()
}

fn to_boolean(raw: &str) -> Result<Value, ConvertError> {
    let normalized = raw.trim().to_lowercase();
    match normalized.as_str() {
        "true" | "1" | "yes" | "y" => Ok(Value::Boolean(true)),
        "false" | "0" | "no" | "n" => Ok(Value::Boolean(false)),
        _ => Err(ConvertError::InvalidBoolean),
    }
}

fn to_date(raw: &str, options: &RuleOptions) -> Result<Value, ConvertError> {
    if let Some(format) = option_text(options, "format") {
        // Accepted for compatibility; output stays ISO-8601 regardless.
        debug!("date format option {format:?} requested; emitting ISO-8601");
    }
    let parsed = parse_datetime(raw).ok_or(ConvertError::InvalidDate)?;
    Ok(Value::String(
        parsed.format("%Y-%m-%dT%H:%M:%S").to_string(),
    ))
}

fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.naive_utc());
    }
    const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
    for fmt in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(parsed);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(trimmed, format.chrono_format()) {
            return parsed.and_hms_opt(0, 0, 0);
        }
    }
    None
}

fn to_email(raw: &str) -> Result<Value, ConvertError> {
    let normalized = raw.trim().to_lowercase();
    if EMAIL_RE.is_match(&normalized) {
        Ok(Value::String(normalized))
    } else {
        Err(ConvertError::InvalidEmail)
    }
}

fn to_phone(raw: &str, options: &RuleOptions) -> Result<Value, ConvertError> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < 7 {
        return Err(ConvertError::PhoneTooShort);
    }
    match option_text(options, "countryCode") {
        Some(code) => Ok(Value::String(format!("+{code}{digits}"))),
        None => Ok(Value::String(digits)),
    }
}

// Empty option values count as unset.
fn option_text(options: &RuleOptions, key: &str) -> Option<String> {
    options
        .get(key)
        .map(Value::as_display)
        .filter(|text| !text.is_empty())
}

/// Default conversion options seeded per target type.
pub fn default_rule_options(target_type: DataType) -> RuleOptions {
    let mut options = RuleOptions::new();
    match target_type {
        DataType::Date => {
            options.insert(
                "format".to_string(),
                Value::String("YYYY-MM-DD".to_string()),
            );
        }
        DataType::Phone => {
            options.insert("countryCode".to_string(), Value::String("1".to_string()));
        }
        _ => {}
    }
    options
}
