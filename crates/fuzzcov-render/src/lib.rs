//! Rendering utilities for fuzzcov.
//!
//! This crate turns labeled step series into output artifacts:
//! - An SVG chart drawn with `plotters` (the [`SvgChartRenderer`] port adapter)
//! - A Markdown summary table for CI job summaries and PR comments
//!
//! # Example
//!
//! ```rust
//! use fuzzcov_ports::ChartOptions;
//! use fuzzcov_render::{render_markdown, render_svg};
//! use fuzzcov_types::{LabeledSeries, Mode, StepSeries};
//!
//! let series = vec![LabeledSeries {
//!     label: "run.json".to_string(),
//!     series: StepSeries::new(vec![0.0, 5.0], vec![10.0, 40.0]).unwrap(),
//! }];
//! let svg = render_svg(&series, &ChartOptions::default()).unwrap();
//! let markdown = render_markdown(&series, Mode::PerRun, 1, "Coverage Over Time", 10);
//! assert!(svg.contains("<svg"));
//! assert!(markdown.contains("run.json"));
//! ```

use fuzzcov_ports::{ChartOptions, ChartRenderer};
use fuzzcov_types::{LabeledSeries, Mode, StepSeries};
use plotters::prelude::*;
use thiserror::Error;

/// Default maximum number of series rows in the Markdown table.
pub const DEFAULT_MAX_ROWS: usize = 20;

/// X-axis caption.
pub const X_AXIS_LABEL: &str = "Seconds";

/// Y-axis caption.
pub const Y_AXIS_LABEL: &str = "Cumulative coverage %";

/// Errors that can occur while rendering.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    /// Nothing to draw.
    #[error("No series to render")]
    NoSeries,

    /// Options the chart cannot be drawn with.
    #[error("Invalid chart options: {0}")]
    InvalidOptions(String),

    /// The drawing backend failed.
    #[error("Failed to draw chart: {0}")]
    Draw(String),
}

fn draw_error(e: impl std::fmt::Display) -> RenderError {
    RenderError::Draw(e.to_string())
}

// ============================================================================
// Chart
// ============================================================================

/// Polyline vertices for a right-continuous step curve.
///
/// Each value is held horizontally until the next breakpoint, where the
/// curve jumps vertically.
///
/// # Examples
///
/// ```rust
/// use fuzzcov_render::step_points;
/// use fuzzcov_types::StepSeries;
///
/// let series = StepSeries::new(vec![0.0, 5.0], vec![0.0, 20.0]).unwrap();
/// assert_eq!(step_points(&series), vec![(0.0, 0.0), (5.0, 0.0), (5.0, 20.0)]);
/// ```
pub fn step_points(series: &StepSeries) -> Vec<(f64, f64)> {
    let mut points = Vec::with_capacity(series.len() * 2);
    let mut held: Option<f64> = None;
    for (&time, &value) in series.times().iter().zip(series.values()) {
        if let Some(previous) = held {
            points.push((time, previous));
        }
        points.push((time, value));
        held = Some(value);
    }
    points
}

/// Upper bound of the x axis: the latest breakpoint of any series.
fn x_axis_end(series: &[LabeledSeries]) -> f64 {
    let end = series
        .iter()
        .map(|labeled| labeled.series.end_time())
        .fold(0.0f64, f64::max);
    if end > 0.0 { end } else { 1.0 }
}

/// Render every series as a step curve on one SVG chart.
///
/// The y axis spans 0-100 percent with a tick every `y_tick_step` points;
/// the x axis spans 0 to the latest end time in seconds.
pub fn render_svg(series: &[LabeledSeries], options: &ChartOptions) -> Result<String, RenderError> {
    if series.is_empty() {
        return Err(RenderError::NoSeries);
    }
    if options.width == 0 || options.height == 0 {
        return Err(RenderError::InvalidOptions(
            "width and height must be positive".to_string(),
        ));
    }
    if options.y_tick_step == 0 || options.y_tick_step > 100 {
        return Err(RenderError::InvalidOptions(format!(
            "y_tick_step must be between 1 and 100, got {}",
            options.y_tick_step
        )));
    }

    let x_end = x_axis_end(series);
    let y_labels = (100 / options.y_tick_step) as usize + 1;
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (options.width, options.height))
            .into_drawing_area();
        root.fill(&WHITE).map_err(draw_error)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(&options.title, ("sans-serif", 28))
            .margin(16)
            .x_label_area_size(48)
            .y_label_area_size(56)
            .build_cartesian_2d(0.0f64..x_end, 0.0f64..100.0f64)
            .map_err(draw_error)?;

        chart
            .configure_mesh()
            .y_labels(y_labels)
            .y_label_formatter(&|v: &f64| format!("{v:.0}"))
            .x_desc(X_AXIS_LABEL)
            .y_desc(Y_AXIS_LABEL)
            .draw()
            .map_err(draw_error)?;

        for (index, labeled) in series.iter().enumerate() {
            let style = Palette99::pick(index).stroke_width(2);
            chart
                .draw_series(LineSeries::new(step_points(&labeled.series), style))
                .map_err(draw_error)?
                .label(labeled.label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::LowerRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(draw_error)?;

        root.present().map_err(draw_error)?;
    }
    Ok(svg)
}

/// [`ChartRenderer`] that produces SVG documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct SvgChartRenderer;

impl ChartRenderer for SvgChartRenderer {
    fn render(&self, series: &[LabeledSeries], options: &ChartOptions) -> Result<String, String> {
        render_svg(series, options).map_err(|e| e.to_string())
    }
}

// ============================================================================
// Markdown
// ============================================================================

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

/// Renders a Markdown summary of the plotted series.
///
/// # Example Output
///
/// ```markdown
/// ## fuzzcov: Coverage Over Time
///
/// - **Mode**: average
/// - **Runs**: 2
///
/// | Series | Points | End time (s) | Final coverage |
/// |--------|--------|--------------|----------------|
/// | Averaged: a.json, b.json | 3 | 20.00 | 100.0% |
/// ```
pub fn render_markdown(
    series: &[LabeledSeries],
    mode: Mode,
    run_count: usize,
    title: &str,
    max_rows: usize,
) -> String {
    let mut output = String::new();

    output.push_str(&format!("## fuzzcov: {}\n\n", title));
    output.push_str(&format!("- **Mode**: {}\n", mode.as_str()));
    output.push_str(&format!("- **Runs**: {}\n", run_count));

    if series.is_empty() {
        return output;
    }

    output.push_str("\n| Series | Points | End time (s) | Final coverage |\n");
    output.push_str("|--------|--------|--------------|----------------|\n");

    for labeled in series.iter().take(max_rows) {
        output.push_str(&format!(
            "| {} | {} | {:.2} | {:.1}% |\n",
            escape_cell(&labeled.label),
            labeled.series.len(),
            labeled.series.end_time(),
            labeled.series.final_value()
        ));
    }

    if series.len() > max_rows {
        output.push('\n');
        output.push_str(&format!(
            "*Showing {} of {} series*\n",
            max_rows,
            series.len()
        ));
    }

    output
}

// ============================================================================
// Tests
// ============================================================================
