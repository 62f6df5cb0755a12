//! Schema checks for a parsed record set.
//!
//! Validity is decided by the header alone. Row-level problems become
//! warnings so a dataset with soft data-quality issues stays importable.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};
use sortkeep_io::RecordSet;

use crate::config::{Schema, SchemaTable};

static DATE_TIME_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}$").unwrap());
static DATE_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());
/// A number can be read from the start of the value; anything after it is ignored.
static NUMBER_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(?:Infinity|\d|\.\d)").unwrap());

// ---------------------------------------------------------------------------
// Findings
// ---------------------------------------------------------------------------

/// Structural problem; any of these makes the dataset invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    UnknownSchema { dataset: String },
    MalformedInput { reason: String },
    MissingRequiredFields { fields: Vec<String> },
    /// The source could not be loaded at all.
    Source { message: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSchema { dataset } => write!(f, "Unknown data type: {dataset}"),
            Self::MalformedInput { reason } => write!(f, "Invalid record set: {reason}"),
            Self::MissingRequiredFields { fields } => {
                write!(f, "Missing required fields: {}", fields.join(", "))
            }
            Self::Source { message } => write!(f, "{message}"),
        }
    }
}

/// Row-level data-quality issue. `row` is 1-based over data rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowWarning {
    NotANumber { row: usize, field: String, value: String },
    InvalidDate { row: usize, field: String, value: String },
    EmptyRequired { row: usize, field: String },
}

impl RowWarning {
    pub fn row(&self) -> usize {
        match self {
            Self::NotANumber { row, .. }
            | Self::InvalidDate { row, .. }
            | Self::EmptyRequired { row, .. } => *row,
        }
    }
}

impl fmt::Display for RowWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotANumber { row, field, value } => {
                write!(f, "Row {row}: \"{field}\" should be a number, got \"{value}\"")
            }
            Self::InvalidDate { row, field, value } => {
                write!(f, "Row {row}: \"{field}\" should be a valid date, got \"{value}\"")
            }
            Self::EmptyRequired { row, field } => {
                write!(f, "Row {row}: Required field \"{field}\" is empty")
            }
        }
    }
}

#[allow(clippy::ptr_arg)]
fn as_messages<T: fmt::Display, S: Serializer>(items: &Vec<T>, s: S) -> Result<S::Ok, S::Error> {
    s.collect_seq(items.iter().map(|i| i.to_string()))
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    #[serde(serialize_with = "as_messages")]
    pub errors: Vec<ValidationError>,
    #[serde(serialize_with = "as_messages")]
    pub warnings: Vec<RowWarning>,
    pub info: Vec<String>,
}

impl ValidationReport {
    fn valid() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            info: Vec::new(),
        }
    }

    fn invalid(error: ValidationError) -> Self {
        Self {
            is_valid: false,
            errors: vec![error],
            warnings: Vec::new(),
            info: Vec::new(),
        }
    }

    /// Report for a source that parsed but yielded no header.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::invalid(ValidationError::MalformedInput {
            reason: reason.into(),
        })
    }

    /// Report for a dataset whose file could not be read or parsed.
    pub fn unreadable(message: impl Into<String>) -> Self {
        Self::invalid(ValidationError::Source {
            message: message.into(),
        })
    }
}

// ---------------------------------------------------------------------------
// Validate
// ---------------------------------------------------------------------------

/// Validate `records` against the schema registered for `dataset`.
pub fn validate(dataset: &str, records: &RecordSet, schemas: &SchemaTable) -> ValidationReport {
    let Some(schema) = schemas.get(dataset) else {
        return ValidationReport::invalid(ValidationError::UnknownSchema {
            dataset: dataset.to_string(),
        });
    };
    validate_with_schema(dataset, records, schema)
}

pub fn validate_with_schema(dataset: &str, records: &RecordSet, schema: &Schema) -> ValidationReport {
    if records.fields.is_empty() {
        return ValidationReport::malformed("no header fields");
    }

    let mut report = ValidationReport::valid();

    let missing: Vec<String> = schema
        .required
        .iter()
        .filter(|f| !records.has_field(f))
        .cloned()
        .collect();
    if !missing.is_empty() {
        report.is_valid = false;
        report
            .errors
            .push(ValidationError::MissingRequiredFields { fields: missing });
    }

    for (idx, record) in records.rows.iter().enumerate() {
        let row = idx + 1;

        for field in &schema.numbers {
            if let Some(value) = record.get(field).filter(|v| !v.is_empty()) {
                if !is_number(value) {
                    report.warnings.push(RowWarning::NotANumber {
                        row,
                        field: field.clone(),
                        value: value.to_string(),
                    });
                }
            }
        }

        for field in &schema.dates {
            if let Some(value) = record.get(field).filter(|v| !v.is_empty()) {
                if !is_valid_date(value) {
                    report.warnings.push(RowWarning::InvalidDate {
                        row,
                        field: field.clone(),
                        value: value.to_string(),
                    });
                }
            }
        }

        // Headers absent from the set were already reported as a hard error.
        for field in &schema.required {
            if let Some(value) = record.get(field) {
                if value.trim().is_empty() {
                    report.warnings.push(RowWarning::EmptyRequired {
                        row,
                        field: field.clone(),
                    });
                }
            }
        }
    }

    report
        .info
        .push(format!("Validated {} records for {dataset}", records.rows.len()));
    log::debug!(
        "{dataset}: valid={} errors={} warnings={}",
        report.is_valid,
        report.errors.len(),
        report.warnings.len()
    );
    report
}

/// Leading whitespace, then a decimal number. Trailing text after the
/// number is ignored, so `1,000` and `12abc` pass while `x90` does not.
pub fn is_number(value: &str) -> bool {
    NUMBER_PREFIX.is_match(value.trim_start())
}

/// `YYYY-MM-DD HH:MM` or `YYYY-MM-DD`, and an actual calendar date/time.
pub fn is_valid_date(value: &str) -> bool {
    let value = value.trim();
    if DATE_TIME_SHAPE.is_match(value) {
        NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M").is_ok()
    } else if DATE_SHAPE.is_match(value) {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sortkeep_io::parse;

    fn draws_schema() -> SchemaTable {
        let mut table = SchemaTable::new();
        table.insert(
            "draws".into(),
            Schema {
                required: vec!["Game".into(), "CloseTime".into()],
                numbers: vec!["Pot".into()],
                dates: vec!["CloseTime".into()],
            },
        );
        table
    }

    #[test]
    fn clean_set_is_valid() {
        let set = parse("Game,CloseTime,Pot\nG1,2024-01-01 10:00,100\nG2,2024-01-02,5.5\n").unwrap();
        let report = validate("draws", &set, &draws_schema());
        assert!(report.is_valid);
        assert!(report.errors.is_empty());
        assert!(report.warnings.is_empty());
        assert_eq!(report.info, vec!["Validated 2 records for draws"]);
    }

    #[test]
    fn unknown_schema() {
        let set = parse("a\n1\n").unwrap();
        let report = validate("lottery", &set, &draws_schema());
        assert!(!report.is_valid);
        assert_eq!(
            report.errors,
            vec![ValidationError::UnknownSchema {
                dataset: "lottery".into()
            }]
        );
    }

    #[test]
    fn empty_header_is_malformed() {
        let report = validate("draws", &RecordSet::empty(), &draws_schema());
        assert!(!report.is_valid);
        assert!(matches!(report.errors[0], ValidationError::MalformedInput { .. }));
    }

    #[test]
    fn missing_required_value_is_only_a_warning() {
        let set = parse("Game,CloseTime\n,2024-01-01\n").unwrap();
        let report = validate("draws", &set, &draws_schema());
        assert!(report.is_valid);
        assert_eq!(
            report.warnings,
            vec![RowWarning::EmptyRequired {
                row: 1,
                field: "Game".into()
            }]
        );
    }

    #[test]
    fn missing_required_header_is_an_error() {
        let set = parse("Game\nG1\n").unwrap();
        let report = validate("draws", &set, &draws_schema());
        assert!(!report.is_valid);
        assert_eq!(
            report.errors,
            vec![ValidationError::MissingRequiredFields {
                fields: vec!["CloseTime".into()]
            }]
        );
        // Absent header does not also produce per-row warnings.
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn bad_number_and_date_warn() {
        let set = parse("Game,CloseTime,Pot\nG1,tomorrow,lots\nG2,2024-02-30,1e3\n").unwrap();
        let report = validate("draws", &set, &draws_schema());
        assert!(report.is_valid);
        let rows: Vec<usize> = report.warnings.iter().map(RowWarning::row).collect();
        assert_eq!(rows, vec![1, 1, 2]);
        assert_eq!(
            report.warnings[0].to_string(),
            "Row 1: \"Pot\" should be a number, got \"lots\""
        );
        assert_eq!(
            report.warnings[2].to_string(),
            "Row 2: \"CloseTime\" should be a valid date, got \"2024-02-30\""
        );
    }

    #[test]
    fn report_serializes_messages() {
        let set = parse("Game\nG1\n").unwrap();
        let report = validate("draws", &set, &draws_schema());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["is_valid"], false);
        assert_eq!(json["errors"][0], "Missing required fields: CloseTime");
    }

    #[test]
    fn date_shapes() {
        assert!(is_valid_date("2024-01-01 10:00"));
        assert!(is_valid_date(" 2024-01-01 "));
        assert!(!is_valid_date("2024-01-01T10:00"));
        assert!(!is_valid_date("2024-1-1"));
        assert!(!is_valid_date("2024-01-01 25:00"));
        assert!(!is_valid_date("01/02/2024"));
    }

    #[test]
    fn number_shapes() {
        assert!(is_number("42"));
        assert!(is_number("-0.5"));
        assert!(is_number(" 7 "));
        assert!(is_number(".5"));
        assert!(is_number("1e3"));
        assert!(is_number("1,000"));
        assert!(is_number("12abc"));
        assert!(is_number("-Infinity"));
        assert!(!is_number("NaN"));
        assert!(!is_number("inf"));
        assert!(!is_number("x90"));
        assert!(!is_number("lots"));
        assert!(!is_number("."));
        assert!(!is_number("-"));
        assert!(!is_number(""));
    }

    #[test]
    fn numeric_prefix_is_not_flagged() {
        let set = parse(r#"Game,CloseTime,Pot
G1,2024-01-01,"1,000"
G2,2024-01-01,12abc
G3,2024-01-01,x90
"#)
            .unwrap();
        let report = validate("draws", &set, &draws_schema());
        assert_eq!(
            report.warnings,
            vec![RowWarning::NotANumber {
                row: 3,
                field: "Pot".into(),
                value: "x90".into()
            }]
        );
    }

    #[test]
    fn impossible_calendar_date_is_rejected() {
        assert!(!is_valid_date("2024-02-30"));
        assert!(!is_valid_date("2023-02-29 10:00"));
        assert!(is_valid_date("2024-02-29 10:00"));
    }
}
