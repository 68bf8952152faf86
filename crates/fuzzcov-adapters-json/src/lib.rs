//! JSON run record parser for fuzzcov.
//!
//! This crate is the single parsing boundary between campaign output files
//! and the validated [`Run`] type. Three record shapes are accepted:
//!
//! - Wrapped: `{"coverage_data": [{"creation_time": .., "cumulative_coverage": ..}, ..], "end_time": ..}`
//! - Bare: `[{"creation_time": .., "cumulative_coverage": ..}, ..]`, ending at the last sample
//! - Columnar: `{"creation_time": [..], "cumulative_coverage": [..], "end_time": ..}` (`end_time` optional)
//!
//! Anything else is rejected with a [`RecordError`] naming the violated rule.

use fuzzcov_types::{CoverageSample, Run, RunError};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

/// Errors that can occur while parsing a run record.
#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    /// The text is not JSON.
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    /// The document is neither an array nor an object.
    #[error("Unrecognized record shape: expected an array or an object, got {0}")]
    UnknownShape(&'static str),

    /// A required field is absent.
    #[error("Missing field '{0}'")]
    MissingField(&'static str),

    /// A field holds the wrong JSON type.
    #[error("Field '{field}' must be {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },

    /// The record has no samples at all.
    #[error("'coverage_data' is empty")]
    EmptyCoverageData,

    /// Columnar arrays disagree in length.
    #[error(
        "Column length mismatch: {times} creation_time values but {coverage} cumulative_coverage values"
    )]
    ColumnMismatch { times: usize, coverage: usize },

    /// One sample object could not be read.
    #[error("Invalid sample {index}: {reason}")]
    InvalidSample { index: usize, reason: String },

    /// The samples were read but violate a run invariant.
    #[error("{0}")]
    InvalidRun(#[from] RunError),
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse one record document into a validated run labeled `label`.
///
/// # Examples
///
/// ```
/// use fuzzcov_adapters_json::parse_record;
///
/// let text = r#"{
///     "coverage_data": [
///         {"creation_time": 0, "cumulative_coverage": 0.0},
///         {"creation_time": 5, "cumulative_coverage": 0.2}
///     ],
///     "end_time": 12
/// }"#;
///
/// let run = parse_record(text, "run1.json").unwrap();
/// assert_eq!(run.samples().len(), 2);
/// assert_eq!(run.end_time(), 12.0);
/// ```
pub fn parse_record(text: &str, label: &str) -> Result<Run, RecordError> {
    let document: Value =
        serde_json::from_str(text).map_err(|e| RecordError::InvalidJson(e.to_string()))?;

    let (samples, end_time) = match &document {
        Value::Array(items) => (parse_sample_list(items)?, None),
        Value::Object(map) if map.contains_key("coverage_data") => parse_wrapped(map)?,
        Value::Object(map) if map.contains_key("creation_time") => parse_columnar(map)?,
        Value::Object(_) => return Err(RecordError::MissingField("coverage_data")),
        other => return Err(RecordError::UnknownShape(json_type_name(other))),
    };

    if samples.is_empty() {
        return Err(RecordError::EmptyCoverageData);
    }

    Ok(Run::new(label, samples, end_time)?)
}

fn parse_wrapped(
    map: &Map<String, Value>,
) -> Result<(Vec<CoverageSample>, Option<f64>), RecordError> {
    let items = map
        .get("coverage_data")
        .and_then(Value::as_array)
        .ok_or(RecordError::InvalidField {
            field: "coverage_data",
            expected: "an array of samples",
        })?;
    let samples = parse_sample_list(items)?;
    let end_time = match map.get("end_time") {
        Some(value) => number(value, "end_time")?,
        None => return Err(RecordError::MissingField("end_time")),
    };
    Ok((samples, Some(end_time)))
}

fn parse_columnar(
    map: &Map<String, Value>,
) -> Result<(Vec<CoverageSample>, Option<f64>), RecordError> {
    let times = number_column(map, "creation_time")?;
    let coverage = number_column(map, "cumulative_coverage")?;
    if times.len() != coverage.len() {
        return Err(RecordError::ColumnMismatch {
            times: times.len(),
            coverage: coverage.len(),
        });
    }

    let samples = times
        .into_iter()
        .zip(coverage)
        .map(|(time, cumulative_coverage)| CoverageSample::new(time, cumulative_coverage))
        .collect();
    let end_time = map
        .get("end_time")
        .map(|value| number(value, "end_time"))
        .transpose()?;
    Ok((samples, end_time))
}

fn parse_sample_list(items: &[Value]) -> Result<Vec<CoverageSample>, RecordError> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            CoverageSample::deserialize(item).map_err(|e| RecordError::InvalidSample {
                index,
                reason: e.to_string(),
            })
        })
        .collect()
}

fn number_column(map: &Map<String, Value>, field: &'static str) -> Result<Vec<f64>, RecordError> {
    let items = map
        .get(field)
        .ok_or(RecordError::MissingField(field))?
        .as_array()
        .ok_or(RecordError::InvalidField {
            field,
            expected: "an array of numbers",
        })?;
    items.iter().map(|item| number(item, field)).collect()
}

fn number(value: &Value, field: &'static str) -> Result<f64, RecordError> {
    value.as_f64().ok_or(RecordError::InvalidField {
        field,
        expected: "a number",
    })
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ============================================================================
// Tests
// ============================================================================
