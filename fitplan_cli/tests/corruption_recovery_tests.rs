//! Corruption recovery tests for the fitplan binary.
//!
//! These tests verify the system can handle:
//! - A corrupted store document
//! - Malformed values under individual keys
//! - Missing files and directories

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn cli(data_dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fitplan"));
    cmd.env("XDG_CONFIG_HOME", data_dir.join("config"))
        .arg("--data-dir")
        .arg(data_dir);
    cmd
}

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

fn write_store(data_dir: &Path, entries: serde_json::Value) {
    fs::write(data_dir.join("store.json"), entries.to_string()).expect("Failed to write store");
}

#[test]
fn test_corrupted_store_file() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    fs::write(data_dir.join("store.json"), "{ invalid json }}}}").unwrap();

    cli(data_dir)
        .args(["onboard", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Step 1/14"));

    // The next write replaces the broken document
    cli(data_dir)
        .args(["course", "toggle", "3"])
        .assert()
        .success();
    let raw = fs::read_to_string(data_dir.join("store.json")).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&raw).expect("store should be valid JSON");
    assert!(parsed.get("progress").is_some());
}

#[test]
fn test_malformed_onboarding_value() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    write_store(
        data_dir,
        serde_json::json!({ "cal.onboarding.v1": "{\"step\": \"seven\"" }),
    );

    cli(data_dir)
        .args(["onboard", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Step 1/14"));
}

#[test]
fn test_out_of_range_step_is_clamped_on_load() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    write_store(
        data_dir,
        serde_json::json!({ "cal.onboarding.v1": "{\"step\": 40, \"locale\": \"en\"}" }),
    );

    cli(data_dir)
        .args(["onboard", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Step 14/14"));
}

#[test]
fn test_malformed_log_rows() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    write_store(
        data_dir,
        serde_json::json!({
            "log_2025-06-02_1_0": "[{\"kg\": 50",
            "log_2025-06-02_1_1": "[{\"kg\":\"40\",\"reps\":\"12\"}]",
            "program_days": "not json either",
        }),
    );

    cli(data_dir)
        .args(["day", "--date", "2025-06-02"])
        .assert()
        .success()
        .stdout(predicate::str::contains("total sets 1"))
        .stdout(predicate::str::contains("0. Exercise 1: 0 set(s)"));

    cli(data_dir)
        .args(["log", "show", "--date", "2025-06-02", "--day", "1", "--exercise", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1. - kg × -"));
}

#[test]
fn test_malformed_timer_state() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    write_store(
        data_dir,
        serde_json::json!({ "timer_rem": "soon", "timer_running": "1" }),
    );

    cli(data_dir)
        .args(["timer", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Timer 0:00 (stopped)"));
}

#[test]
fn test_missing_data_directory_is_created_on_write() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("does/not/exist");

    cli(&data_dir)
        .args(["streaks"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Current streak: 0"));
    assert!(!data_dir.join("store.json").exists(), "reads never create the store");

    cli(&data_dir)
        .args(["program", "select", "--level", "intermediate", "--track", "home"])
        .assert()
        .success();
    assert!(data_dir.join("store.json").exists());
}
