//! fuzzcov plots cumulative coverage over time for one or more fuzzing runs,
//! either as one step curve per run or as a single curve averaged over a
//! shared time axis.

use clap::Parser;
use fuzzcov_adapters_fs::{FsRunSource, SourceError, ensure_paths_exist};
use fuzzcov_app::{AppError, PlotRequest, load_records, plot, render_report_json};
use fuzzcov_config::{
    CliOverrides, ConfigError, EffectiveConfig, discover_config, load_config, resolve_config,
};
use fuzzcov_ports::ChartOptions;
use fuzzcov_render::DEFAULT_MAX_ROWS;
use fuzzcov_types::{
    CODE_INVALID_AVERAGE_FLAG, CODE_INVALID_CONFIG, CODE_PATH_NOT_FOUND, CODE_RUNTIME_ERROR, Mode,
    explain,
};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Plot cumulative fuzzing coverage over time for one or more runs.
#[derive(Debug, Parser)]
#[command(name = "fuzzcov")]
#[command(about = "Plot cumulative fuzzing coverage over time for one or more runs.")]
#[command(version)]
struct Cli {
    /// Average all runs into one curve (true) or plot each run (false)
    #[arg(value_name = "AVERAGE", required_unless_present = "explain")]
    average: Option<String>,

    /// Record files (.json) or directories searched recursively
    #[arg(value_name = "PATH", required_unless_present = "explain")]
    paths: Vec<PathBuf>,

    /// Output path for the SVG chart (overrides config file)
    #[arg(long)]
    out: Option<PathBuf>,

    /// Chart title (overrides config file)
    #[arg(long)]
    title: Option<String>,

    /// Output path for a Markdown summary table
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Output path for the JSON series report
    #[arg(long)]
    report: Option<PathBuf>,

    /// Path to config file (default: auto-discover fuzzcov.toml)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Explain an error code and exit
    #[arg(long, value_name = "CODE")]
    explain: Option<String>,

    /// Log debug output to stderr
    #[arg(long, short = 'v')]
    verbose: bool,
}

/// CLI errors
#[derive(Debug, Error)]
enum CliError {
    #[error("Invalid average flag '{0}': expected 'true' or 'false'")]
    InvalidAverageFlag(String),

    #[error("{0}")]
    Source(#[from] SourceError),

    #[error("Failed to load config: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to write file '{path}': {source}")]
    FileWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create directory '{path}': {source}")]
    DirCreate {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    App(#[from] AppError),
}

impl CliError {
    fn code(&self) -> &'static str {
        match self {
            CliError::InvalidAverageFlag(_) => CODE_INVALID_AVERAGE_FLAG,
            CliError::Source(SourceError::PathNotFound(_)) => CODE_PATH_NOT_FOUND,
            CliError::Config(_) => CODE_INVALID_CONFIG,
            CliError::App(err) => err.code(),
            CliError::Source(_) | CliError::FileWrite { .. } | CliError::DirCreate { .. } => {
                CODE_RUNTIME_ERROR
            }
        }
    }
}

/// Exit codes:
/// - 0: Chart written (or code explained)
/// - 1: Any error
/// - 2: Usage error (reported by clap)
const EXIT_CODE_ERROR: i32 = 1;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            debug!(code = e.code(), "run failed");
            eprintln!("error: {}", e);
            EXIT_CODE_ERROR
        }
    };
    std::process::exit(exit_code);
}

/// Install the stderr subscriber. `RUST_LOG` takes precedence over `--verbose`.
fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn run(cli: Cli) -> Result<i32, CliError> {
    if let Some(code) = &cli.explain {
        return Ok(run_explain(code));
    }

    let mode = parse_average_flag(cli.average.as_deref().unwrap_or_default())?;

    // Every path must exist before any file is opened.
    ensure_paths_exist(&cli.paths)?;

    let loaded_config = match &cli.config {
        Some(path) => Some(load_config(path)?),
        None => discover_config()?.map(|(path, config)| {
            debug!(path = %path.display(), "discovered config");
            config
        }),
    };
    let effective = resolve_config(
        loaded_config.as_ref(),
        &CliOverrides {
            output: cli.out.clone(),
            title: cli.title.clone(),
        },
    );

    let records = load_records(&FsRunSource::new(), &cli.paths, &effective.exclude_patterns)?;
    let result = plot(PlotRequest {
        records,
        mode,
        chart: chart_options(&effective),
        max_summary_rows: DEFAULT_MAX_ROWS,
    })?;

    write_output(&effective.output, &result.chart)?;
    info!(path = %effective.output.display(), series = result.series.len(), "wrote chart");

    if let Some(path) = &cli.summary {
        write_output(path, &result.markdown)?;
        info!(path = %path.display(), "wrote summary");
    }
    if let Some(path) = &cli.report {
        write_output(path, &render_report_json(&result.report)?)?;
        info!(path = %path.display(), "wrote report");
    }

    println!("{}", effective.output.display());
    Ok(0)
}

fn run_explain(code: &str) -> i32 {
    if let Some(info) = explain(code) {
        println!("Code: {}", info.code);
        println!("Name: {}", info.name);
        println!("Meaning: {}", info.full_description);
        println!("Remediation: {}", info.remediation);
        0
    } else {
        eprintln!("Unknown code: {code}");
        EXIT_CODE_ERROR
    }
}

/// Parse the positional average flag, ignoring case.
fn parse_average_flag(value: &str) -> Result<Mode, CliError> {
    if value.eq_ignore_ascii_case("true") {
        Ok(Mode::Average)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(Mode::PerRun)
    } else {
        Err(CliError::InvalidAverageFlag(value.to_string()))
    }
}

fn chart_options(effective: &EffectiveConfig) -> ChartOptions {
    ChartOptions {
        title: effective.title.clone(),
        width: effective.width,
        height: effective.height,
        y_tick_step: effective.y_tick_step,
    }
}

fn write_output(path: &Path, content: &str) -> Result<(), CliError> {
    ensure_parent_dir(path)?;
    fs::write(path, content).map_err(|e| CliError::FileWrite {
        path: path.display().to_string(),
        source: e,
    })
}

/// Ensure the parent directory of a path exists
fn ensure_parent_dir(path: &Path) -> Result<(), CliError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| CliError::DirCreate {
            path: parent.display().to_string(),
            source: e,
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["fuzzcov", "true", "runs", "extra.json"]).unwrap();
        assert_eq!(cli.average.as_deref(), Some("true"));
        assert_eq!(
            cli.paths,
            vec![PathBuf::from("runs"), PathBuf::from("extra.json")]
        );
        assert!(cli.out.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_cli_requires_paths() {
        assert!(Cli::try_parse_from(["fuzzcov", "true"]).is_err());
        assert!(Cli::try_parse_from(["fuzzcov"]).is_err());
    }

    #[test]
    fn test_cli_explain_needs_no_positionals() {
        let cli = Cli::try_parse_from(["fuzzcov", "--explain", "fuzzcov.input.malformed_run"])
            .unwrap();
        assert_eq!(cli.explain.as_deref(), Some("fuzzcov.input.malformed_run"));
        assert!(cli.paths.is_empty());
    }

    #[test]
    fn test_parse_average_flag_ignores_case() {
        assert_eq!(parse_average_flag("true").unwrap(), Mode::Average);
        assert_eq!(parse_average_flag("TRUE").unwrap(), Mode::Average);
        assert_eq!(parse_average_flag("False").unwrap(), Mode::PerRun);
    }

    #[test]
    fn test_parse_average_flag_rejects_other_values() {
        for value in ["yes", "1", "", "truee"] {
            let err = parse_average_flag(value).unwrap_err();
            assert_eq!(err.code(), CODE_INVALID_AVERAGE_FLAG);
        }
    }

    #[test]
    fn test_missing_path_code() {
        let err = CliError::from(SourceError::PathNotFound(PathBuf::from("gone")));
        assert_eq!(err.code(), CODE_PATH_NOT_FOUND);
        assert_eq!(err.to_string(), "Input path does not exist: gone");
    }

    #[test]
    fn test_chart_options_follow_effective_config() {
        let effective = EffectiveConfig {
            title: "Nightly".to_string(),
            width: 640,
            ..EffectiveConfig::default()
        };
        let options = chart_options(&effective);
        assert_eq!(options.title, "Nightly");
        assert_eq!(options.width, 640);
        assert_eq!(options.height, 768);
        assert_eq!(options.y_tick_step, 10);
    }

    #[test]
    fn test_ensure_parent_dir_creates_nested_dirs() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("a/b/chart.svg");
        ensure_parent_dir(&path).unwrap();
        assert!(temp.path().join("a/b").is_dir());
        ensure_parent_dir(Path::new("chart.svg")).unwrap();
    }
}
