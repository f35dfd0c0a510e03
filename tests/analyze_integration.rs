/// Integration tests for the hydrograph statistics pipeline
///
/// These tests drive the library end to end against the files in
/// `tests/data/`:
/// 1. Delimited and USGS RDB hydrographs with the same readings agree
/// 2. Results are written to an output locator with a trailing newline
/// 3. Configuration files and event payloads drive a run
/// 4. Partial failures produce error records and the partial exit code
///
/// Only local storage is exercised; network backends need live services.
///
/// Run with: cargo test --test analyze_integration

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use hydrograph_stats::cli::{self, Cli, EXIT_FATAL, EXIT_OK, EXIT_PARTIAL};
use hydrograph_stats::model::SeriesOutcome;
use hydrograph_stats::storage::StorageSettings;

fn data_file(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
        .to_string_lossy()
        .to_string()
}

/// Fresh scratch directory per test.
fn scratch_dir(test: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("hydrograph_stats_{}_{}", test, std::process::id()));
    fs::remove_dir_all(&dir).ok();
    fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

fn run(args: &[&str]) -> Result<hydrograph_stats::runner::RunReport, hydrograph_stats::error::AppError> {
    let mut argv = vec!["hydrograph_stats"];
    argv.extend_from_slice(args);
    cli::run(&Cli::parse_from(argv), StorageSettings::default())
}

fn parsed_document(bytes: &[u8]) -> Vec<serde_json::Value> {
    serde_json::from_slice::<serde_json::Value>(bytes)
        .expect("document should be JSON")
        .as_array()
        .expect("document should be an array")
        .clone()
}

fn assert_close(actual: &serde_json::Value, expected: f64) {
    let actual = actual.as_f64().expect("numeric field");
    assert!((actual - expected).abs() < 1e-6, "expected {expected}, got {actual}");
}

// ---------------------------------------------------------------------------
// Single hydrographs
// ---------------------------------------------------------------------------

#[test]
fn test_delimited_hydrograph() {
    let csv = data_file("hydrograph.csv");
    let report = run(&[csv.as_str()]).expect("run should succeed");
    assert!(!report.is_partial());

    let records = parsed_document(&report.document);
    assert_eq!(records.len(), 1);
    let r = &records[0];

    assert_close(&r["max"], 47300.0);
    assert_eq!(r["max_datetime"], "2021-01-14T01:00:00");
    assert_close(&r["min"], 14800.0);
    assert_eq!(r["min_datetime"], "2021-01-13T20:00:00");
    assert_close(&r["avg"], 36656.25);
    assert_eq!(r["duration"], "3H");
    assert_close(&r["duration_max"], 141550.0 / 3.0);
    assert_eq!(r["duration_max_datetime"], "2021-01-14T02:00:00");
    assert_close(&r["duration_min"], 14800.0);
    assert_eq!(r["duration_min_datetime"], "2021-01-13T20:00:00");
    assert_eq!(r["hydrograph"], csv.as_str());
}

#[test]
fn test_usgs_rdb_hydrograph_matches_delimited() {
    let report = run(&[data_file("hydrograph.txt").as_str(), "--usgs-rdb"]).expect("run should succeed");
    let records = parsed_document(&report.document);
    let r = &records[0];

    assert_close(&r["max"], 47300.0);
    assert_eq!(r["max_datetime"], "2021-01-14T01:00:00-06:00");
    assert_close(&r["min"], 14800.0);
    assert_close(&r["avg"], 36656.25);
    assert_close(&r["duration_max"], 141550.0 / 3.0);
    assert_eq!(r["duration_max_datetime"], "2021-01-14T02:00:00-06:00");
}

#[test]
fn test_custom_separator_and_columns() {
    let report = run(&[
        data_file("hydrograph_semicolon.csv").as_str(),
        "--sep",
        ";",
        "--col-idx-dt",
        "1",
        "--col-idx-q",
        "2",
        "--duration",
        "2 hours",
    ])
    .expect("run should succeed");

    let records = parsed_document(&report.document);
    let r = &records[0];
    assert_close(&r["max"], 9.4477);
    assert_eq!(r["max_datetime"], "2019-04-02T02:00:00");
    assert_eq!(r["duration"], "2 hours");
    assert_close(&r["duration_max"], (6.25 + 9.4477) / 2.0);
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[test]
fn test_pretty_output_written_with_newline() {
    let dir = scratch_dir("pretty_out");
    let out = dir.join("results").join("stats.json").to_string_lossy().to_string();

    let report = run(&[data_file("hydrograph.csv").as_str(), "--pretty-print", "--out", out.as_str()]).expect("run should succeed");

    let written = fs::read(&out).expect("results file should exist");
    assert_eq!(written.last(), Some(&b'\n'));
    assert_eq!(&written[..written.len() - 1], report.document.as_slice());
    assert!(String::from_utf8_lossy(&written).starts_with("[\n  {\n"));

    fs::remove_dir_all(&dir).ok();
}

// ---------------------------------------------------------------------------
// Configuration and payload driven runs
// ---------------------------------------------------------------------------

#[test]
fn test_config_file_with_partial_failure() {
    let dir = scratch_dir("config_partial");
    let config = dir.join("config.yml");
    let missing = dir.join("missing.csv").to_string_lossy().to_string();
    fs::write(
        &config,
        format!(
            "hydrographs:\n  - {}\n  - {}\n  - {}\nduration: 90min\nworkers: 2\n",
            data_file("hydrograph.csv"),
            missing,
            data_file("hydrograph.csv"),
        ),
    )
    .unwrap();

    // Flags are ignored once a configuration file is given
    let result = run(&["--config", &*config.to_string_lossy(), "--duration", "1D"]);
    assert_eq!(cli::exit_code(&result), EXIT_PARTIAL);

    let report = result.unwrap();
    assert_eq!(report.failures(), 1);
    assert!(matches!(report.outcomes[1], SeriesOutcome::Failed(_)));

    let records = parsed_document(&report.document);
    assert_eq!(records.len(), 3);
    assert_eq!(records[0]["duration"], "90min");
    assert_eq!(records[1]["hydrograph"], missing.as_str());
    assert!(records[1]["error"].as_str().unwrap().contains("I/O error"));
    assert_eq!(records[2]["hydrograph"], data_file("hydrograph.csv").as_str());

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_toml_config_file() {
    let dir = scratch_dir("toml_config");
    let config = dir.join("config.toml");
    fs::write(
        &config,
        format!("hydrographs = [\"{}\"]\nusgs_rdb = true\n", data_file("hydrograph.txt")),
    )
    .unwrap();

    let result = run(&["--config", &*config.to_string_lossy()]);
    assert_eq!(cli::exit_code(&result), EXIT_OK);
    let records = parsed_document(&result.unwrap().document);
    assert_eq!(records[0]["max_datetime"], "2021-01-14T01:00:00-06:00");

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_payload_run_writes_required_output() {
    let dir = scratch_dir("payload");
    let config = dir.join("config.yml");
    fs::write(&config, "duration: 3H\npretty_print: false\n").unwrap();

    let event_dir = dir.join("realization_0").join("event_7");
    let payload = dir.join("payload.yml");
    fs::write(
        &payload,
        format!(
            "target_plugin: hydrograph_stats\n\
             model_configuration:\n  model_configuration_paths:\n    - {config}\n\
             model_links:\n  linked_inputs:\n\
             \x20   - name: hsm1\n      parameter: flow\n      format: csv\n      source: {csv}\n\
             \x20   - name: gauge\n      parameter: flow\n      format: rdb\n\
             \x20     resource_info:\n        root: {data_dir}\n        path: hydrograph.txt\n\
             \x20 required_outputs:\n    - name: results-wat.json\n\
             event_config:\n  output_destination: {out}\n\
             \x20 realization:\n    index: 0\n    seed: 1234\n\
             \x20 event:\n    index: 7\n    seed: 5678\n",
            config = config.to_string_lossy(),
            csv = data_file("hydrograph.csv"),
            data_dir = PathBuf::from(data_file("hydrograph.txt")).parent().unwrap().to_string_lossy(),
            out = event_dir.to_string_lossy(),
        ),
    )
    .unwrap();

    let result = run(&["--payload", &*payload.to_string_lossy()]);
    assert_eq!(cli::exit_code(&result), EXIT_OK, "run failed: {:?}", result.as_ref().err());

    let written = fs::read(event_dir.join("results-wat.json")).expect("required output should be written");
    let records = parsed_document(&written[..written.len() - 1]);
    assert_eq!(records.len(), 2);
    assert_close(&records[0]["max"], 47300.0);
    assert_eq!(records[0]["max_datetime"], "2021-01-14T01:00:00");
    assert_eq!(records[1]["max_datetime"], "2021-01-14T01:00:00-06:00");

    fs::remove_dir_all(&dir).ok();
}

// ---------------------------------------------------------------------------
// Fatal errors
// ---------------------------------------------------------------------------

#[test]
fn test_unknown_config_key_is_fatal() {
    let dir = scratch_dir("bad_config");
    let config = dir.join("config.yml");
    fs::write(&config, "hydrographs: []\ndurration: 3H\n").unwrap();

    let result = run(&["--config", &*config.to_string_lossy()]);
    assert_eq!(cli::exit_code(&result), EXIT_FATAL);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_no_hydrographs_is_fatal() {
    assert_eq!(cli::exit_code(&run(&[])), EXIT_FATAL);
}

#[test]
fn test_fail_fast_is_fatal() {
    let result = run(&[data_file("hydrograph.csv").as_str(), "does/not/exist.csv", "--fail-fast"]);
    assert_eq!(cli::exit_code(&result), EXIT_FATAL);
}

#[test]
fn test_bad_duration_is_fatal() {
    let result = run(&[data_file("hydrograph.csv").as_str(), "--duration", "3 fortnights"]);
    assert_eq!(cli::exit_code(&result), EXIT_FATAL);
}
