//! Heuristic type detection for raw string cells.

use std::fmt;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::data::DataType;

pub static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[\d\s\-()]{7,}$").unwrap());

static ISO_DATE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());
static DMY_DASH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{2}-\d{2}-\d{4}$").unwrap());
static MDY_SLASH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}/\d{2}/\d{4}$").unwrap());
static DAY_MONTH_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,2}\s+[A-Za-z]{3,}\s+\d{4}$").unwrap());

/// Date layouts the detector recognizes. A value only counts as a date when
/// its shape matches one of these and chrono accepts it as a calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    IsoDate,
    DayMonthYear,
    MonthDayYear,
    DayMonthNameYear,
}

pub const DATE_FORMATS: [DateFormat; 4] = [
    DateFormat::IsoDate,
    DateFormat::DayMonthYear,
    DateFormat::MonthDayYear,
    DateFormat::DayMonthNameYear,
];

impl DateFormat {
    pub fn label(&self) -> &'static str {
        match self {
            DateFormat::IsoDate => "YYYY-MM-DD",
            DateFormat::DayMonthYear => "DD-MM-YYYY",
            DateFormat::MonthDayYear => "MM/DD/YYYY",
            DateFormat::DayMonthNameYear => "D MMM YYYY",
        }
    }

    pub fn chrono_format(&self) -> &'static str {
        match self {
            DateFormat::IsoDate => "%Y-%m-%d",
            DateFormat::DayMonthYear => "%d-%m-%Y",
            DateFormat::MonthDayYear => "%m/%d/%Y",
            DateFormat::DayMonthNameYear => "%d %b %Y",
        }
    }

    fn shape(&self) -> &'static Regex {
        match self {
            DateFormat::IsoDate => &ISO_DATE_RE,
            DateFormat::DayMonthYear => &DMY_DASH_RE,
            DateFormat::MonthDayYear => &MDY_SLASH_RE,
            DateFormat::DayMonthNameYear => &DAY_MONTH_NAME_RE,
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        self.shape().is_match(value)
            && NaiveDate::parse_from_str(value, self.chrono_format()).is_ok()
    }
}

impl fmt::Display for DateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub fn detect_date_format(value: &str) -> Option<DateFormat> {
    DATE_FORMATS.iter().copied().find(|fmt| fmt.matches(value))
}

/// One ranked type guess for a value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypeCandidate {
    pub data_type: DataType,
    pub confidence: f64,
    pub format: Option<DateFormat>,
}

impl TypeCandidate {
    fn new(data_type: DataType, confidence: f64) -> Self {
        TypeCandidate {
            data_type,
            confidence,
            format: None,
        }
    }
}

type Detector = fn(&str) -> Option<TypeCandidate>;

// Ordered rule table. Each rule fires independently; stable sorting by
// confidence keeps this order for ties.
const DETECTION_RULES: &[Detector] = &[
    detect_integer,
    detect_number,
    detect_boolean,
    detect_date,
    detect_email,
    detect_phone,
    detect_string,
];

fn parse_numeric(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|parsed| parsed.is_finite())
}

fn detect_integer(value: &str) -> Option<TypeCandidate> {
    let parsed = parse_numeric(value)?;
    (parsed.fract() == 0.0).then(|| TypeCandidate::new(DataType::Integer, 0.9))
}

fn detect_number(value: &str) -> Option<TypeCandidate> {
    parse_numeric(value).map(|_| TypeCandidate::new(DataType::Number, 0.8))
}

fn detect_boolean(value: &str) -> Option<TypeCandidate> {
    let normalized = value.trim().to_lowercase();
    matches!(
        normalized.as_str(),
        "true" | "false" | "1" | "0" | "yes" | "no"
    )
    .then(|| TypeCandidate::new(DataType::Boolean, 0.9))
}

fn detect_date(value: &str) -> Option<TypeCandidate> {
    detect_date_format(value).map(|format| TypeCandidate {
        data_type: DataType::Date,
        confidence: 0.8,
        format: Some(format),
    })
}

fn detect_email(value: &str) -> Option<TypeCandidate> {
    EMAIL_RE
        .is_match(value)
        .then(|| TypeCandidate::new(DataType::Email, 0.95))
}

fn detect_phone(value: &str) -> Option<TypeCandidate> {
    PHONE_RE
        .is_match(value)
        .then(|| TypeCandidate::new(DataType::Phone, 0.7))
}

fn detect_string(_value: &str) -> Option<TypeCandidate> {
    Some(TypeCandidate::new(DataType::String, 0.5))
}

/// Infers every plausible type for a single value, ranked by confidence.
/// Blank input yields exactly `[(unknown, 1.0)]`; anything else ends with
/// the `(string, 0.5)` fallback.
pub fn detect_value_type(value: &str) -> Vec<TypeCandidate> {
    if value.trim().is_empty() {
        return vec![TypeCandidate::new(DataType::Unknown, 1.0)];
    }
    let mut candidates: Vec<TypeCandidate> = DETECTION_RULES
        .iter()
        .filter_map(|detect| detect(value))
        .collect();
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    candidates
}

/// Aggregates per-value top candidates into one column verdict. Each
/// non-blank value votes with its best guess; a type's score is the vote
/// fraction weighted by the average confidence of those votes.
pub fn detect_column_type<S: AsRef<str>>(values: &[S]) -> (DataType, f64) {
    let mut tallies: Vec<(DataType, usize, f64)> = Vec::new();
    let mut total = 0usize;

    for value in values {
        let value = value.as_ref();
        if value.trim().is_empty() {
            continue;
        }
        total += 1;
        if let Some(top) = detect_value_type(value).first() {
            match tallies
                .iter_mut()
                .find(|(data_type, ..)| *data_type == top.data_type)
            {
                Some((_, count, confidence_sum)) => {
                    *count += 1;
                    *confidence_sum += top.confidence;
                }
                None => tallies.push((top.data_type, 1, top.confidence)),
            }
        }
    }

    if total == 0 {
        return (DataType::Unknown, 0.0);
    }

    let mut best = (DataType::Unknown, 0.0_f64);
    for (data_type, count, confidence_sum) in tallies {
        let score = (count as f64 / total as f64) * (confidence_sum / count as f64);
        if score > best.1 {
            best = (data_type, score);
        }
    }
    best
}
