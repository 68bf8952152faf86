//! Shared port traits and boundary DTOs for fuzzcov's hexagonal architecture.

use std::path::{Path, PathBuf};

use fuzzcov_types::LabeledSeries;

/// Raw record text paired with the label its run will carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordInput {
    /// Source identifier, usually the file path.
    pub label: String,
    /// Unparsed JSON document.
    pub text: String,
}

/// Cosmetic chart settings passed to the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartOptions {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Spacing of the y-axis ticks in percentage points.
    pub y_tick_step: u32,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            title: "Coverage Over Time".to_string(),
            width: 1024,
            height: 768,
            y_tick_step: 10,
        }
    }
}

/// Port for locating and reading run records.
pub trait RunSource {
    /// Expand files and directories into the ordered list of record files.
    fn resolve(&self, paths: &[PathBuf]) -> Result<Vec<PathBuf>, String>;

    /// Read one record file.
    fn read(&self, path: &Path) -> Result<String, String>;
}

/// Port for turning labeled step series into a chart artifact.
pub trait ChartRenderer {
    /// Render every series onto one chart and return the encoded artifact.
    fn render(&self, series: &[LabeledSeries], options: &ChartOptions) -> Result<String, String>;
}

/// Port for obtaining the current UTC time.
pub trait Clock {
    /// Returns the current time in UTC.
    fn now(&self) -> chrono::DateTime<chrono::Utc>;
}

/// Clock backed by the system time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> chrono::DateTime<chrono::Utc> {
        chrono::Utc::now()
    }
}
