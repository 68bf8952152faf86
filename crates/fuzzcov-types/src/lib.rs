//! Core types and DTOs for fuzzcov.
//!
//! This crate defines the validated data model shared by every other crate:
//! runs and their coverage samples, step series, the unified time axis, the
//! series report schema, and the error code registry.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Schema and Code Constants
// ============================================================================

/// Schema identifier for the fuzzcov series report format.
pub const SCHEMA_ID: &str = "fuzzcov.series.v1";

/// Error code for path resolution that found no JSON files.
pub const CODE_NO_INPUT_FILES: &str = "fuzzcov.input.no_input_files";

/// Error code for a run record that violates the run invariants.
pub const CODE_MALFORMED_RUN: &str = "fuzzcov.input.malformed_run";

/// Error code for a CLI path that does not exist.
pub const CODE_PATH_NOT_FOUND: &str = "fuzzcov.input.path_not_found";

/// Error code for an average flag that is not `true` or `false`.
pub const CODE_INVALID_AVERAGE_FLAG: &str = "fuzzcov.cli.invalid_average_flag";

/// Error code for resampled series that disagree with the unified axis.
pub const CODE_INTERNAL_CONSISTENCY: &str = "fuzzcov.engine.internal_consistency";

/// Error code for an invalid configuration file.
pub const CODE_INVALID_CONFIG: &str = "fuzzcov.config.invalid";

/// Error code for runtime errors.
pub const CODE_RUNTIME_ERROR: &str = "tool.runtime_error";

/// Default label prefix for the averaged series.
pub const AVERAGED_LABEL_PREFIX: &str = "Averaged: ";

// ============================================================================
// Code Registry
// ============================================================================

/// Metadata for a fuzzcov error code.
#[derive(Debug, Clone, Copy)]
pub struct CodeInfo {
    pub code: &'static str,
    pub name: &'static str,
    pub short_description: &'static str,
    pub full_description: &'static str,
    pub remediation: &'static str,
}

/// Registry of all fuzzcov codes.
pub const CODE_REGISTRY: &[CodeInfo] = &[
    CodeInfo {
        code: CODE_NO_INPUT_FILES,
        name: "NoInputFiles",
        short_description: "No JSON files found",
        full_description: "None of the given paths is a JSON file or a directory containing one.",
        remediation: "Point fuzzcov at the campaign output files or the directory holding them.",
    },
    CodeInfo {
        code: CODE_MALFORMED_RUN,
        name: "MalformedRun",
        short_description: "Malformed run record",
        full_description: "A run record is missing coverage data, has mismatched columns, \
                           non-increasing times, regressing coverage, or an end time before its last sample.",
        remediation: "Regenerate the record; fuzzcov never skips a bad run because the comparison would be misleading.",
    },
    CodeInfo {
        code: CODE_PATH_NOT_FOUND,
        name: "PathNotFound",
        short_description: "Input path does not exist",
        full_description: "A path given on the command line is neither a file nor a directory.",
        remediation: "Check the path for typos.",
    },
    CodeInfo {
        code: CODE_INVALID_AVERAGE_FLAG,
        name: "InvalidAverageFlag",
        short_description: "Invalid average flag",
        full_description: "The first argument must be `true` or `false` (case-insensitive).",
        remediation: "Run `fuzzcov true <paths>` to average or `fuzzcov false <paths>` for per-run curves.",
    },
    CodeInfo {
        code: CODE_INTERNAL_CONSISTENCY,
        name: "InternalConsistency",
        short_description: "Engine consistency failure",
        full_description: "A resampled series does not have one value per unified axis point.",
        remediation: "This is a fuzzcov bug; file an issue with the input records attached.",
    },
    CodeInfo {
        code: CODE_INVALID_CONFIG,
        name: "InvalidConfig",
        short_description: "Invalid configuration",
        full_description: "fuzzcov.toml could not be read, parsed, or holds an out-of-range value.",
        remediation: "Fix the reported key or remove the file to fall back to defaults.",
    },
    CodeInfo {
        code: CODE_RUNTIME_ERROR,
        name: "RuntimeError",
        short_description: "Tool runtime error",
        full_description: "fuzzcov failed while reading inputs or writing outputs.",
        remediation: "Check file permissions and free disk space, then re-run.",
    },
];

/// Lookup code metadata by code string.
pub fn explain(code: &str) -> Option<&'static CodeInfo> {
    CODE_REGISTRY.iter().find(|info| info.code == code)
}

// ============================================================================
// Enums
// ============================================================================

/// How the runs are turned into plotted series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// One curve per run, each on its own breakpoints.
    #[default]
    PerRun,
    /// One curve: the pointwise mean on the unified axis.
    Average,
}

impl Mode {
    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::PerRun => "per_run",
            Mode::Average => "average",
        }
    }
}

// ============================================================================
// Runs
// ============================================================================

/// One recorded coverage measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoverageSample {
    /// Seconds since the campaign started.
    #[serde(rename = "creation_time")]
    pub time: f64,
    /// Covered fraction in `[0, 1]`.
    pub cumulative_coverage: f64,
}

impl CoverageSample {
    pub fn new(time: f64, cumulative_coverage: f64) -> Self {
        Self {
            time,
            cumulative_coverage,
        }
    }
}

/// Invariant violations detected while constructing a [`Run`].
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RunError {
    #[error("run has no coverage samples")]
    Empty,

    #[error("sample {index}: {field} is not a finite number")]
    NonFinite { index: usize, field: &'static str },

    #[error("sample {index}: creation_time {time} is negative")]
    NegativeTime { index: usize, time: f64 },

    #[error("sample {index}: cumulative_coverage {value} is outside [0, 1]")]
    CoverageOutOfRange { index: usize, value: f64 },

    #[error("sample {index}: creation_time {time} does not increase past {previous}")]
    NonIncreasingTime {
        index: usize,
        previous: f64,
        time: f64,
    },

    #[error("sample {index}: cumulative_coverage regresses from {previous} to {value}")]
    CoverageRegression {
        index: usize,
        previous: f64,
        value: f64,
    },

    #[error("end_time {end_time} is not a finite number")]
    NonFiniteEndTime { end_time: f64 },

    #[error("end_time {end_time} precedes the last sample time {last_time}")]
    EndBeforeLastSample { end_time: f64, last_time: f64 },
}

/// One fuzzing campaign's recorded coverage trace.
///
/// A `Run` can only be built through [`Run::new`], which checks every
/// invariant, so holders never re-validate.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    label: String,
    samples: Vec<CoverageSample>,
    end_time: f64,
}

impl Run {
    /// Build a validated run.
    ///
    /// When `end_time` is `None` the run ends at its last sample.
    pub fn new(
        label: impl Into<String>,
        samples: Vec<CoverageSample>,
        end_time: Option<f64>,
    ) -> Result<Self, RunError> {
        let mut previous: Option<&CoverageSample> = None;
        for (index, sample) in samples.iter().enumerate() {
            if !sample.time.is_finite() {
                return Err(RunError::NonFinite {
                    index,
                    field: "creation_time",
                });
            }
            if !sample.cumulative_coverage.is_finite() {
                return Err(RunError::NonFinite {
                    index,
                    field: "cumulative_coverage",
                });
            }
            if sample.time < 0.0 {
                return Err(RunError::NegativeTime {
                    index,
                    time: sample.time,
                });
            }
            if !(0.0..=1.0).contains(&sample.cumulative_coverage) {
                return Err(RunError::CoverageOutOfRange {
                    index,
                    value: sample.cumulative_coverage,
                });
            }
            if let Some(prev) = previous {
                if sample.time <= prev.time {
                    return Err(RunError::NonIncreasingTime {
                        index,
                        previous: prev.time,
                        time: sample.time,
                    });
                }
                if sample.cumulative_coverage < prev.cumulative_coverage {
                    return Err(RunError::CoverageRegression {
                        index,
                        previous: prev.cumulative_coverage,
                        value: sample.cumulative_coverage,
                    });
                }
            }
            previous = Some(sample);
        }

        let last_time = previous.map(|s| s.time).ok_or(RunError::Empty)?;
        let end_time = end_time.unwrap_or(last_time);
        if !end_time.is_finite() {
            return Err(RunError::NonFiniteEndTime { end_time });
        }
        if end_time < last_time {
            return Err(RunError::EndBeforeLastSample {
                end_time,
                last_time,
            });
        }

        Ok(Self {
            label: label.into(),
            samples,
            end_time,
        })
    }

    /// Source identifier, usually the record's file path.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Samples in strictly increasing time order. Never empty.
    pub fn samples(&self) -> &[CoverageSample] {
        &self.samples
    }

    /// Time at which the campaign terminated.
    pub fn end_time(&self) -> f64 {
        self.end_time
    }

    /// The last recorded sample. Always `Some` for a constructed run.
    pub fn last_sample(&self) -> Option<&CoverageSample> {
        self.samples.last()
    }
}

// ============================================================================
// Step Series
// ============================================================================

/// Invariant violations detected while constructing a [`StepSeries`].
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StepSeriesError {
    #[error("step series has no points")]
    Empty,

    #[error("step series has {times} times but {values} values")]
    LengthMismatch { times: usize, values: usize },

    #[error("step series time {time} at index {index} does not increase past {previous}")]
    NonIncreasing {
        index: usize,
        previous: f64,
        time: f64,
    },
}

/// A right-continuous step function: `values[i]` holds on `[times[i], times[i + 1])`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepSeries {
    times: Vec<f64>,
    values: Vec<f64>,
}

impl StepSeries {
    /// Build a step series, checking that `times` is strictly increasing and
    /// both columns have the same non-zero length.
    pub fn new(times: Vec<f64>, values: Vec<f64>) -> Result<Self, StepSeriesError> {
        if times.len() != values.len() {
            return Err(StepSeriesError::LengthMismatch {
                times: times.len(),
                values: values.len(),
            });
        }
        if times.is_empty() {
            return Err(StepSeriesError::Empty);
        }
        if let Some(index) = times.windows(2).position(|w| w[1] <= w[0]) {
            return Err(StepSeriesError::NonIncreasing {
                index: index + 1,
                previous: times[index],
                time: times[index + 1],
            });
        }
        Ok(Self { times, values })
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of breakpoints. Always at least one.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Time of the last breakpoint.
    pub fn end_time(&self) -> f64 {
        self.times.last().copied().unwrap_or_default()
    }

    /// Value of the last breakpoint.
    pub fn final_value(&self) -> f64 {
        self.values.last().copied().unwrap_or_default()
    }

    /// Evaluate the step function at `t`.
    ///
    /// Returns `values[i]` for the largest `i` with `times[i] <= t`, `0.0`
    /// before the first breakpoint, and the last value past the end.
    ///
    /// # Examples
    ///
    /// ```
    /// use fuzzcov_types::StepSeries;
    ///
    /// let series = StepSeries::new(vec![0.0, 5.0, 10.0], vec![0.0, 20.0, 50.0]).unwrap();
    /// assert_eq!(series.value_at(4.999), 0.0);
    /// assert_eq!(series.value_at(5.0), 20.0);
    /// assert_eq!(series.value_at(99.0), 50.0);
    /// ```
    pub fn value_at(&self, t: f64) -> f64 {
        match self.times.partition_point(|&time| time <= t) {
            0 => 0.0,
            n => self.values[n - 1],
        }
    }
}

/// Sorted, deduplicated union of sample times used as a common grid.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UnifiedAxis(Vec<f64>);

impl UnifiedAxis {
    /// Canonicalize arbitrary times into an axis: ascending, no duplicates.
    ///
    /// NaN never reaches this point because [`Run::new`] rejects it.
    pub fn new(mut times: Vec<f64>) -> Self {
        times.sort_by(f64::total_cmp);
        times.dedup();
        Self(times)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

/// A step series with the label shown in the chart legend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledSeries {
    pub label: String,
    pub series: StepSeries,
}

// ============================================================================
// Series Report
// ============================================================================

/// Information about the tool that generated the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    /// Name of the tool.
    pub name: String,
    /// Version of the tool.
    pub version: String,
}

impl Default for Tool {
    fn default() -> Self {
        Self {
            name: "fuzzcov".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// One plotted curve in the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesEntry {
    pub label: String,
    /// Last breakpoint time in seconds.
    pub end_time: f64,
    /// Coverage percentage at `end_time`.
    pub final_coverage_pct: f64,
    pub times: Vec<f64>,
    pub values: Vec<f64>,
}

impl From<&LabeledSeries> for SeriesEntry {
    fn from(labeled: &LabeledSeries) -> Self {
        Self {
            label: labeled.label.clone(),
            end_time: labeled.series.end_time(),
            final_coverage_pct: labeled.series.final_value(),
            times: labeled.series.times().to_vec(),
            values: labeled.series.values().to_vec(),
        }
    }
}

/// Machine-readable description of one fuzzcov invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesReport {
    /// Schema identifier.
    pub schema: String,
    /// Tool information.
    pub tool: Tool,
    /// ISO 8601 timestamp of report generation.
    pub generated_at: String,
    /// Whether runs were averaged.
    pub mode: Mode,
    /// Run labels in load order.
    pub inputs: Vec<String>,
    /// Plotted curves.
    pub series: Vec<SeriesEntry>,
}

impl Default for SeriesReport {
    fn default() -> Self {
        Self {
            schema: SCHEMA_ID.to_string(),
            tool: Tool::default(),
            generated_at: String::new(),
            mode: Mode::PerRun,
            inputs: Vec::new(),
            series: Vec::new(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
