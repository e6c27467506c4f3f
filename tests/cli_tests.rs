// CLI behaviour: analyze and aggregate subcommands

mod utils;

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;
use utils::{four_thread_outage, steady_workers, ResultDirFixture};

const METRICS_HEADER: &str =
    "rto,rpo,recovery_time_factor,total_performance_factor,absorption_factor,recovery_factor";

fn recuperar() -> Command {
    Command::cargo_bin("recuperar").unwrap()
}

// ============================================================================
// analyze
// ============================================================================

#[test]
fn test_analyze_writes_metrics() {
    let tmp = TempDir::new().unwrap();
    four_thread_outage().write(tmp.path());

    recuperar()
        .arg("analyze")
        .arg("--resultdir")
        .arg(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("RTO:"))
        .stdout(predicate::str::contains("5000.000 ms"));

    let metrics = fs::read_to_string(tmp.path().join("data/metrics.csv")).unwrap();
    let mut lines = metrics.lines();
    assert_eq!(lines.next(), Some(METRICS_HEADER));
    assert!(lines.next().unwrap().starts_with("5000,0,"));

    let steady = fs::read_to_string(tmp.path().join("data/steady_state.csv")).unwrap();
    assert_eq!(steady.lines().count(), 2);
}

#[test]
fn test_analyze_csv_format() {
    let tmp = TempDir::new().unwrap();
    four_thread_outage().write(tmp.path());

    recuperar()
        .args(["analyze", "--format", "csv", "--resultdir"])
        .arg(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::starts_with(METRICS_HEADER));
}

#[test]
fn test_analyze_json_format() {
    let tmp = TempDir::new().unwrap();
    four_thread_outage().write(tmp.path());

    let output = recuperar()
        .args(["analyze", "--format", "json", "--resultdir"])
        .arg(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["metrics"]["rto"], 5000.0);
    assert_eq!(json["rto"]["thread_count"], 4);
    assert_eq!(json["rto"]["longest_gap_ms"], 5000);
}

#[test]
fn test_analyze_no_write() {
    let tmp = TempDir::new().unwrap();
    four_thread_outage().write(tmp.path());

    recuperar()
        .args(["analyze", "--no-write", "--resultdir"])
        .arg(tmp.path())
        .assert()
        .success();

    assert!(!tmp.path().join("data/metrics.csv").exists());
}

#[test]
fn test_analyze_without_fault_writes_sentinels() {
    let tmp = TempDir::new().unwrap();
    ResultDirFixture::new(0, 0, 1)
        .with_trace(steady_workers(2, 0, 60_000, None))
        .write(tmp.path());

    recuperar()
        .args(["analyze", "--resultdir"])
        .arg(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("n/a"));

    let metrics = fs::read_to_string(tmp.path().join("data/metrics.csv")).unwrap();
    assert_eq!(metrics.lines().nth(1), Some("-1,-1,-1,-1,-1,-1"));
}

#[test]
fn test_analyze_missing_resultdir_fails() {
    let tmp = TempDir::new().unwrap();

    recuperar()
        .args(["analyze", "--resultdir"])
        .arg(tmp.path().join("nope"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("runInfo.csv"));
}

#[test]
fn test_analyze_with_config_file() {
    let tmp = TempDir::new().unwrap();
    ResultDirFixture::new(0, 0, 1)
        .with_fault(1_000, 1_500)
        .with_trace(steady_workers(2, 0, 60_000, Some((1_000, 2_500))))
        .write(tmp.path());
    let config = tmp.path().join("analysis.toml");
    fs::write(&config, "stall_floor_ms = 1000\n").unwrap();

    recuperar()
        .args(["analyze", "--format", "csv", "--resultdir"])
        .arg(tmp.path())
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("\n1500,"));
}

#[test]
fn test_analyze_rejects_invalid_config() {
    let tmp = TempDir::new().unwrap();
    four_thread_outage().write(tmp.path());
    let config = tmp.path().join("analysis.toml");
    fs::write(&config, "smoothing_window = 2\nsmoothing_order = 2\n").unwrap();

    recuperar()
        .args(["analyze", "--resultdir"])
        .arg(tmp.path())
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("config"));
}

// ============================================================================
// aggregate
// ============================================================================

#[test]
fn test_aggregate_runs() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    for dir in [&first, &second] {
        four_thread_outage().write(dir.path());
        recuperar()
            .args(["analyze", "--resultdir"])
            .arg(dir.path())
            .assert()
            .success();
    }

    recuperar()
        .args(["aggregate", "--format", "csv"])
        .arg(first.path())
        .arg(second.path())
        .assert()
        .success()
        .stdout(predicate::str::starts_with("metric,samples,mean,trimmed_mean"))
        .stdout(predicate::str::contains("rto,2,5000,5000"));
}

#[test]
fn test_aggregate_without_metrics_fails() {
    let tmp = TempDir::new().unwrap();

    recuperar()
        .arg("aggregate")
        .arg(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("metrics.csv"));
}

#[test]
fn test_version_flag() {
    recuperar()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("recuperar"));
}
