//! Application orchestration for fuzzcov.
//!
//! This crate provides the high-level `plot` function that runs the whole
//! pipeline:
//!
//! 1. Parse every record into a validated run (failing on the first bad one)
//! 2. Build per-run or averaged step series
//! 3. Render the chart through a [`ChartRenderer`]
//! 4. Build the Markdown summary and the `fuzzcov.series.v1` report
//!
//! # Example
//!
//! ```rust,ignore
//! use fuzzcov_app::{plot, PlotRequest};
//! use fuzzcov_ports::RecordInput;
//! use fuzzcov_types::Mode;
//!
//! let request = PlotRequest {
//!     records: vec![RecordInput { label: "run.json".into(), text: "...".into() }],
//!     mode: Mode::Average,
//!     ..Default::default()
//! };
//!
//! let result = plot(request)?;
//! std::fs::write("coveragePlot.svg", result.chart)?;
//! ```

use std::path::PathBuf;

use fuzzcov_adapters_json::{RecordError, parse_record};
use fuzzcov_config::should_include_path;
use fuzzcov_domain::{EngineError, build_series};
use fuzzcov_ports::{ChartOptions, ChartRenderer, Clock, RecordInput, RunSource, SystemClock};
use fuzzcov_render::{DEFAULT_MAX_ROWS, SvgChartRenderer, render_markdown};
use fuzzcov_types::{
    CODE_INTERNAL_CONSISTENCY, CODE_MALFORMED_RUN, CODE_NO_INPUT_FILES, CODE_RUNTIME_ERROR,
    LabeledSeries, Mode, Run, SeriesEntry, SeriesReport,
};
use thiserror::Error;
use tracing::{debug, error, info};

// ============================================================================
// Request and Result Types
// ============================================================================

/// Request for a plot operation.
#[derive(Debug, Clone)]
pub struct PlotRequest {
    /// Record documents in load order.
    pub records: Vec<RecordInput>,
    /// Per-run curves or one averaged curve.
    pub mode: Mode,
    /// Chart cosmetics.
    pub chart: ChartOptions,
    /// Maximum number of rows in the Markdown summary.
    pub max_summary_rows: usize,
}

impl Default for PlotRequest {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            mode: Mode::PerRun,
            chart: ChartOptions::default(),
            max_summary_rows: DEFAULT_MAX_ROWS,
        }
    }
}

/// Result of a plot operation.
#[derive(Debug, Clone)]
pub struct PlotResult {
    /// The plotted series, in legend order.
    pub series: Vec<LabeledSeries>,
    /// Encoded chart artifact.
    pub chart: String,
    /// Markdown summary of the plotted series.
    pub markdown: String,
    /// Machine-readable report.
    pub report: SeriesReport,
}

// ============================================================================
// Errors
// ============================================================================

/// Errors that can occur during the plot operation.
#[derive(Debug, Error)]
pub enum AppError {
    /// Path resolution found nothing to load.
    #[error("No JSON files found within provided paths: {searched}")]
    NoInputFiles { searched: String },

    /// A record failed validation; the whole comparison is abandoned.
    #[error("Malformed run '{label}': {source}")]
    MalformedRun {
        label: String,
        #[source]
        source: RecordError,
    },

    /// The engine rejected its input or detected an internal defect.
    #[error("{0}")]
    Engine(#[from] EngineError),

    /// Locating or reading records failed.
    #[error("{0}")]
    Source(String),

    /// The renderer failed.
    #[error("{0}")]
    Render(String),

    /// The report could not be serialized.
    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl AppError {
    /// Registry code describing this error.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NoInputFiles { .. } | AppError::Engine(EngineError::NoRuns) => {
                CODE_NO_INPUT_FILES
            }
            AppError::MalformedRun { .. } => CODE_MALFORMED_RUN,
            AppError::Engine(
                EngineError::InvalidSeries { .. }
                | EngineError::InternalConsistency { .. }
                | EngineError::InvalidAggregate(_),
            ) => CODE_INTERNAL_CONSISTENCY,
            AppError::Source(_) | AppError::Render(_) | AppError::Serialize(_) => {
                CODE_RUNTIME_ERROR
            }
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Resolve `paths` through `source`, drop excluded files, and read the rest.
///
/// Fails with [`AppError::NoInputFiles`] when nothing is left to load.
pub fn load_records<S: RunSource>(
    source: &S,
    paths: &[PathBuf],
    exclude_patterns: &[String],
) -> Result<Vec<RecordInput>, AppError> {
    let resolved = source.resolve(paths).map_err(AppError::Source)?;
    let total = resolved.len();
    let files: Vec<PathBuf> = resolved
        .into_iter()
        .filter(|path| should_include_path(path, exclude_patterns))
        .collect();
    if files.len() < total {
        debug!(excluded = total - files.len(), "skipped excluded record files");
    }

    if files.is_empty() {
        let searched = paths
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        return Err(AppError::NoInputFiles { searched });
    }

    files
        .iter()
        .map(|path| {
            let text = source.read(path).map_err(AppError::Source)?;
            Ok(RecordInput {
                label: path.display().to_string(),
                text,
            })
        })
        .collect()
}

/// Parse every record, stopping at the first malformed one.
pub fn parse_runs(records: &[RecordInput]) -> Result<Vec<Run>, AppError> {
    records
        .iter()
        .map(|record| {
            let run = parse_record(&record.text, &record.label).map_err(|source| {
                AppError::MalformedRun {
                    label: record.label.clone(),
                    source,
                }
            })?;
            debug!(
                label = run.label(),
                samples = run.samples().len(),
                end_time = run.end_time(),
                "loaded run"
            );
            Ok(run)
        })
        .collect()
}

// ============================================================================
// Main Plot Function
// ============================================================================

/// Run the pipeline with the system clock and the SVG renderer.
pub fn plot(request: PlotRequest) -> Result<PlotResult, AppError> {
    plot_with(request, &SystemClock, &SvgChartRenderer)
}

/// Run the pipeline with a custom clock and renderer.
///
/// This allows for deterministic testing with fixed timestamps.
pub fn plot_with<C: Clock, R: ChartRenderer>(
    request: PlotRequest,
    clock: &C,
    renderer: &R,
) -> Result<PlotResult, AppError> {
    if request.records.is_empty() {
        return Err(AppError::NoInputFiles {
            searched: "<none>".to_string(),
        });
    }

    let runs = parse_runs(&request.records)?;
    let series = build_series(&runs, request.mode).inspect_err(|e| {
        if matches!(
            e,
            EngineError::InvalidSeries { .. }
                | EngineError::InternalConsistency { .. }
                | EngineError::InvalidAggregate(_)
        ) {
            error!(error = %e, "engine consistency check failed");
        }
    })?;

    let chart = renderer
        .render(&series, &request.chart)
        .map_err(AppError::Render)?;
    let markdown = render_markdown(
        &series,
        request.mode,
        runs.len(),
        &request.chart.title,
        request.max_summary_rows,
    );
    let report = build_report(&runs, &series, request.mode, clock);

    info!(
        mode = request.mode.as_str(),
        runs = runs.len(),
        series = series.len(),
        "built coverage chart"
    );

    Ok(PlotResult {
        series,
        chart,
        markdown,
        report,
    })
}

/// Build the `fuzzcov.series.v1` report for one invocation.
pub fn build_report<C: Clock>(
    runs: &[Run],
    series: &[LabeledSeries],
    mode: Mode,
    clock: &C,
) -> SeriesReport {
    SeriesReport {
        generated_at: clock.now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        mode,
        inputs: runs.iter().map(|run| run.label().to_string()).collect(),
        series: series.iter().map(SeriesEntry::from).collect(),
        ..SeriesReport::default()
    }
}

/// Serialize a report as pretty JSON with a trailing newline.
pub fn render_report_json(report: &SeriesReport) -> Result<String, AppError> {
    let mut json = serde_json::to_string_pretty(report)?;
    json.push('\n');
    Ok(json)
}

// ============================================================================
// Tests
// ============================================================================
