//! Configuration parsing and management for fuzzcov.
//!
//! This crate provides:
//! - Configuration types (`Config`, `ChartConfig`, `PathConfig`)
//! - TOML parsing and validation
//! - Discovery of `fuzzcov.toml` in the current directory and its parents
//! - Precedence handling (CLI > config file > defaults)

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name searched for by [`discover_config`].
pub const CONFIG_FILE_NAME: &str = "fuzzcov.toml";

/// Default chart output path.
pub const DEFAULT_OUTPUT: &str = "coveragePlot.svg";

/// Default chart title.
pub const DEFAULT_TITLE: &str = "Coverage Over Time";

// ============================================================================
// Errors
// ============================================================================

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value.
    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

// ============================================================================
// Configuration Types
// ============================================================================

/// Chart appearance settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChartConfig {
    /// Chart width in pixels.
    #[serde(default)]
    pub width: Option<u32>,
    /// Chart height in pixels.
    #[serde(default)]
    pub height: Option<u32>,
    /// Spacing of y-axis ticks in percentage points.
    #[serde(default)]
    pub y_tick_step: Option<u32>,
}

/// Path filtering configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathConfig {
    /// Glob patterns for discovered record files to skip.
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Full configuration for fuzzcov.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Chart output path.
    #[serde(default)]
    pub output: Option<String>,

    /// Chart title.
    #[serde(default)]
    pub title: Option<String>,

    /// Chart appearance.
    #[serde(default)]
    pub chart: ChartConfig,

    /// Path filtering configuration.
    #[serde(default)]
    pub paths: PathConfig,
}

// ============================================================================
// Effective Configuration
// ============================================================================

/// Effective configuration with all values resolved.
///
/// This represents the final configuration after applying:
/// 1. Built-in defaults
/// 2. Config file values
/// 3. CLI overrides
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveConfig {
    pub output: PathBuf,
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub y_tick_step: u32,
    pub exclude_patterns: Vec<String>,
}

impl Default for EffectiveConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from(DEFAULT_OUTPUT),
            title: DEFAULT_TITLE.to_string(),
            width: 1024,
            height: 768,
            y_tick_step: 10,
            exclude_patterns: vec![],
        }
    }
}

// ============================================================================
// Configuration Loading
// ============================================================================

/// Load configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Load configuration from a TOML string.
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Validate configuration values.
fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.chart.width == Some(0) || config.chart.height == Some(0) {
        return Err(ConfigError::InvalidValue(
            "chart width and height must be positive".to_string(),
        ));
    }
    if let Some(step) = config.chart.y_tick_step
        && !(1..=100).contains(&step)
    {
        return Err(ConfigError::InvalidValue(format!(
            "chart.y_tick_step must be between 1 and 100, got {}",
            step
        )));
    }
    if let Some(output) = &config.output
        && output.trim().is_empty()
    {
        return Err(ConfigError::InvalidValue(
            "output must not be empty".to_string(),
        ));
    }
    for pattern in &config.paths.exclude {
        glob::Pattern::new(pattern).map_err(|e| {
            ConfigError::InvalidValue(format!("invalid exclude pattern '{}': {}", pattern, e))
        })?;
    }
    Ok(())
}

/// Try to find and load configuration from the standard location.
///
/// Searches for `fuzzcov.toml` in `start` and its parent directories. A file
/// that exists but fails to load is reported rather than skipped.
pub fn discover_config_from(start: &Path) -> Result<Option<(PathBuf, Config)>, ConfigError> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.is_file() {
            let config = load_config(&config_path)?;
            return Ok(Some((config_path, config)));
        }

        if !current.pop() {
            return Ok(None);
        }
    }
}

/// [`discover_config_from`] starting at the current directory.
pub fn discover_config() -> Result<Option<(PathBuf, Config)>, ConfigError> {
    let cwd = std::env::current_dir()?;
    discover_config_from(&cwd)
}

// ============================================================================
// Precedence Resolution
// ============================================================================

/// CLI override options.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub output: Option<PathBuf>,
    pub title: Option<String>,
}

/// Resolve effective configuration from defaults, config file, and CLI overrides.
///
/// Precedence: CLI > config file > defaults
pub fn resolve_config(config: Option<&Config>, cli: &CliOverrides) -> EffectiveConfig {
    let mut effective = EffectiveConfig::default();

    if let Some(config) = config {
        if let Some(output) = &config.output {
            effective.output = PathBuf::from(output);
        }
        if let Some(title) = &config.title {
            effective.title = title.clone();
        }
        if let Some(width) = config.chart.width {
            effective.width = width;
        }
        if let Some(height) = config.chart.height {
            effective.height = height;
        }
        if let Some(step) = config.chart.y_tick_step {
            effective.y_tick_step = step;
        }
        effective.exclude_patterns = config.paths.exclude.clone();
    }

    if let Some(output) = &cli.output {
        effective.output = output.clone();
    }
    if let Some(title) = &cli.title {
        effective.title = title.clone();
    }

    effective
}

// ============================================================================
// Path Filtering
// ============================================================================

/// Check if a path matches any of the given glob patterns.
pub fn matches_any_pattern(path: &str, patterns: &[String]) -> bool {
    for pattern in patterns {
        if let Ok(glob_pattern) = glob::Pattern::new(pattern)
            && glob_pattern.matches(path)
        {
            return true;
        }
    }
    false
}

/// Returns `true` if a discovered record file should be loaded.
///
/// Paths are compared with forward slashes so patterns work on every platform.
pub fn should_include_path(path: &Path, exclude_patterns: &[String]) -> bool {
    let normalized = path.to_string_lossy().replace('\\', "/");
    !matches_any_pattern(&normalized, exclude_patterns)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_minimal_config() {
        let config = parse_config("").unwrap();
        assert!(config.output.is_none());
        assert!(config.title.is_none());
        assert!(config.paths.exclude.is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let content = r#"
output = "out/plot.svg"
title = "Nightly campaigns"

[chart]
width = 800
height = 600
y_tick_step = 20

[paths]
exclude = ["**/tmp/**", "*.partial.json"]
"#;
        let config = parse_config(content).unwrap();
        assert_eq!(config.output.as_deref(), Some("out/plot.svg"));
        assert_eq!(config.title.as_deref(), Some("Nightly campaigns"));
        assert_eq!(config.chart.width, Some(800));
        assert_eq!(config.chart.height, Some(600));
        assert_eq!(config.chart.y_tick_step, Some(20));
        assert_eq!(config.paths.exclude.len(), 2);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        assert!(matches!(
            parse_config("colour = \"red\""),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_invalid_dimensions() {
        let result = parse_config("[chart]\nwidth = 0\n");
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_invalid_tick_step() {
        let result = parse_config("[chart]\ny_tick_step = 101\n");
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
        let result = parse_config("[chart]\ny_tick_step = 0\n");
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_invalid_exclude_pattern() {
        let result = parse_config("[paths]\nexclude = [\"[\"]\n");
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_empty_output_is_rejected() {
        let result = parse_config("output = \"  \"\n");
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_resolve_config_no_config() {
        let effective = resolve_config(None, &CliOverrides::default());
        assert_eq!(effective, EffectiveConfig::default());
        assert_eq!(effective.output, PathBuf::from("coveragePlot.svg"));
        assert_eq!(effective.title, "Coverage Over Time");
        assert_eq!(effective.y_tick_step, 10);
    }

    #[test]
    fn test_resolve_config_file_values() {
        let config = parse_config("title = \"From file\"\n[chart]\nheight = 400\n").unwrap();
        let effective = resolve_config(Some(&config), &CliOverrides::default());
        assert_eq!(effective.title, "From file");
        assert_eq!(effective.height, 400);
        assert_eq!(effective.width, 1024);
    }

    #[test]
    fn test_resolve_config_cli_overrides() {
        let config = parse_config("output = \"file.svg\"\ntitle = \"From file\"\n").unwrap();
        let cli = CliOverrides {
            output: Some(PathBuf::from("cli.svg")),
            title: Some("From CLI".to_string()),
        };
        let effective = resolve_config(Some(&config), &cli);
        assert_eq!(effective.output, PathBuf::from("cli.svg"));
        assert_eq!(effective.title, "From CLI");
    }

    #[test]
    fn test_matches_any_pattern() {
        let patterns = vec!["**/tmp/**".to_string(), "*.bak.json".to_string()];
        assert!(matches_any_pattern("runs/tmp/a.json", &patterns));
        assert!(matches_any_pattern("old.bak.json", &patterns));
        assert!(!matches_any_pattern("runs/a.json", &patterns));
    }

    #[test]
    fn test_should_include_path() {
        let patterns = vec!["**/skip/**".to_string()];
        assert!(should_include_path(Path::new("runs/a.json"), &patterns));
        assert!(!should_include_path(Path::new("runs/skip/a.json"), &patterns));
        assert!(should_include_path(Path::new("runs/a.json"), &[]));
    }

    #[test]
    fn test_discover_config_walks_up() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(temp.path().join(CONFIG_FILE_NAME), "title = \"Found\"\n").unwrap();

        let (path, config) = discover_config_from(&nested).unwrap().expect("config found");
        assert_eq!(path, temp.path().join(CONFIG_FILE_NAME));
        assert_eq!(config.title.as_deref(), Some("Found"));
    }

    #[test]
    fn test_discover_config_reports_broken_file() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(CONFIG_FILE_NAME), "[chart]\nwidth = 0\n").unwrap();
        assert!(discover_config_from(temp.path()).is_err());
    }
}
