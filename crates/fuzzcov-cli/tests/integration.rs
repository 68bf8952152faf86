//! Integration tests for the fuzzcov CLI.
//!
//! These tests exercise the CLI as a subprocess with fixtures written into a
//! temporary directory, verifying exit codes, output files, and error handling.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Get a Command for the fuzzcov binary.
fn fuzzcov() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_fuzzcov"));
    cmd.env_remove("RUST_LOG");
    cmd
}

const RUN_A: &str = r#"{
  "coverage_data": [
    {"creation_time": 0, "cumulative_coverage": 0.0},
    {"creation_time": 10, "cumulative_coverage": 1.0}
  ],
  "end_time": 10
}"#;

const RUN_B: &str = r#"{
  "coverage_data": [
    {"creation_time": 0, "cumulative_coverage": 0.0},
    {"creation_time": 10, "cumulative_coverage": 0.0},
    {"creation_time": 20, "cumulative_coverage": 1.0}
  ],
  "end_time": 20
}"#;

fn write(dir: &Path, rel: &str, content: &str) {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// Temp dir with `runs/a.json` and `runs/nested/b.json`.
fn campaign() -> TempDir {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "runs/a.json", RUN_A);
    write(temp.path(), "runs/nested/b.json", RUN_B);
    temp
}

// ============================================================================
// Help and Explain Tests
// ============================================================================

#[test]
fn test_help_displays_usage() {
    fuzzcov()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("fuzzcov"))
        .stdout(predicate::str::contains("--out"))
        .stdout(predicate::str::contains("--summary"))
        .stdout(predicate::str::contains("--report"));
}

#[test]
fn test_explain_outputs_code_info() {
    fuzzcov()
        .args(["--explain", "fuzzcov.input.malformed_run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fuzzcov.input.malformed_run"))
        .stdout(predicate::str::contains("Remediation"));
}

#[test]
fn test_explain_unknown_code_fails() {
    fuzzcov()
        .args(["--explain", "fuzzcov.nope"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unknown code"));
}

#[test]
fn test_missing_positionals_is_usage_error() {
    fuzzcov().assert().code(2);
}

// ============================================================================
// Plotting Tests
// ============================================================================

#[test]
fn test_average_writes_chart_to_default_output() {
    let temp = campaign();

    fuzzcov()
        .current_dir(temp.path())
        .args(["true", "runs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("coveragePlot.svg"));

    let svg = fs::read_to_string(temp.path().join("coveragePlot.svg")).unwrap();
    assert!(svg.contains("<svg"));
    assert!(svg.contains("Coverage Over Time"));
    assert!(svg.contains("Averaged: "));
}

#[test]
fn test_per_run_labels_each_file() {
    let temp = campaign();

    fuzzcov()
        .current_dir(temp.path())
        .args(["FALSE", "runs", "--out", "out/chart.svg", "--title", "Nightly"])
        .assert()
        .success();

    let svg = fs::read_to_string(temp.path().join("out/chart.svg")).unwrap();
    assert!(svg.contains("Nightly"));
    assert!(svg.contains("a.json"));
    assert!(svg.contains("b.json"));
    assert!(!svg.contains("Averaged: "));
}

#[test]
fn test_report_and_summary_outputs() {
    let temp = campaign();

    fuzzcov()
        .current_dir(temp.path())
        .args([
            "true",
            "runs",
            "--report",
            "artifacts/report.json",
            "--summary",
            "artifacts/summary.md",
        ])
        .assert()
        .success();

    let report = fs::read_to_string(temp.path().join("artifacts/report.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&report).unwrap();
    assert_eq!(json["schema"], "fuzzcov.series.v1");
    assert_eq!(json["mode"], "average");
    assert_eq!(json["inputs"].as_array().unwrap().len(), 2);
    assert_eq!(json["series"][0]["times"], serde_json::json!([0.0, 10.0, 20.0]));
    assert_eq!(json["series"][0]["values"], serde_json::json!([0.0, 50.0, 100.0]));

    let summary = fs::read_to_string(temp.path().join("artifacts/summary.md")).unwrap();
    assert!(summary.contains("- **Mode**: average"));
    assert!(summary.contains("- **Runs**: 2"));
}

#[test]
fn test_config_file_sets_output_and_excludes() {
    let temp = campaign();
    write(temp.path(), "runs/tmp/broken.json", "not json");
    write(
        temp.path(),
        "fuzzcov.toml",
        r#"
output = "from-config.svg"
title = "Configured"

[paths]
exclude = ["**/tmp/**"]
"#,
    );

    fuzzcov()
        .current_dir(temp.path())
        .args(["false", "runs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("from-config.svg"));

    let svg = fs::read_to_string(temp.path().join("from-config.svg")).unwrap();
    assert!(svg.contains("Configured"));
}

#[test]
fn test_invalid_config_fails() {
    let temp = campaign();
    write(temp.path(), "bad.toml", "[chart]\ny_tick_step = 0\n");

    fuzzcov()
        .current_dir(temp.path())
        .args(["true", "runs", "--config", "bad.toml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to load config"));
}

// ============================================================================
// Error Handling Tests
// ============================================================================

#[test]
fn test_invalid_average_flag_fails() {
    let temp = campaign();

    fuzzcov()
        .current_dir(temp.path())
        .args(["maybe", "runs"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid average flag 'maybe'"));

    assert!(!temp.path().join("coveragePlot.svg").exists());
}

#[test]
fn test_missing_path_fails_before_reading() {
    let temp = campaign();
    write(temp.path(), "broken.json", "not json");

    fuzzcov()
        .current_dir(temp.path())
        .args(["true", "broken.json", "missing"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Input path does not exist: missing"));
}

#[test]
fn test_directory_without_json_fails() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "empty/notes.txt", "nothing here");

    fuzzcov()
        .current_dir(temp.path())
        .args(["true", "empty"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No JSON files found"));
}

#[test]
fn test_malformed_run_names_the_file() {
    let temp = campaign();
    write(
        temp.path(),
        "runs/z_bad.json",
        r#"{"coverage_data": [{"creation_time": 5, "cumulative_coverage": 0.1},
                              {"creation_time": 2, "cumulative_coverage": 0.2}],
            "end_time": 5}"#,
    );

    fuzzcov()
        .current_dir(temp.path())
        .args(["true", "runs"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("z_bad.json"));

    assert!(!temp.path().join("coveragePlot.svg").exists());
}

#[test]
fn test_verbose_logs_loaded_runs() {
    let temp = campaign();

    fuzzcov()
        .current_dir(temp.path())
        .args(["true", "runs", "--verbose"])
        .assert()
        .success()
        .stderr(predicate::str::contains("loaded run"));
}
