//! Integration tests for the fitplan binary.
//!
//! These tests verify end-to-end behavior including:
//! - The onboarding walkthrough and plan output
//! - Program selection and set logging
//! - Calendar, streak and day summaries
//! - Quick tools, rest timer and course progress

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create a test data directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Helper to get the CLI bound to a data directory, with config isolated
fn cli(data_dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fitplan"));
    cmd.env("XDG_CONFIG_HOME", data_dir.join("config"))
        .arg("--data-dir")
        .arg(data_dir);
    cmd
}

fn run(data_dir: &Path, args: &[&str]) {
    cli(data_dir).args(args).assert().success();
}

fn read_store(data_dir: &Path) -> serde_json::Value {
    let raw = fs::read_to_string(data_dir.join("store.json")).expect("Failed to read store");
    serde_json::from_str(&raw).expect("store.json is not valid JSON")
}

#[test]
fn test_cli_help() {
    Command::new(assert_cmd::cargo::cargo_bin!("fitplan"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Nutrition plan and workout log"));
}

#[test]
fn test_fresh_onboarding_blocks_on_first_step() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path())
        .args(["onboard", "advance"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Step 1 is incomplete"));

    cli(temp_dir.path())
        .args(["onboard", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Step 1/14"));
}

#[test]
fn test_onboarding_walkthrough_saves_profile() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    for (field, value) in [
        ("locale", "en"),
        ("gender", "female"),
        ("birth", "1995-01-01"),
        ("height", "165"),
        ("weight", "70"),
        ("goal", "lose"),
        ("desired-weight", "65"),
        ("speed", "0.5"),
        ("activity", "3-5"),
        ("diet", "classic"),
    ] {
        run(dir, &["onboard", "set", field, value]);
    }

    for expected in 2..=13 {
        cli(dir)
            .args(["onboard", "advance"])
            .assert()
            .success()
            .stdout(predicate::str::contains(format!("Step {}/14", expected)));
    }

    // Entering the loading step computed the plan
    let store = read_store(dir);
    let onboarding: serde_json::Value =
        serde_json::from_str(store["cal.onboarding.v1"].as_str().unwrap()).unwrap();
    assert_eq!(onboarding["lastPlan"]["protein_g"], 154.0);
    assert_eq!(onboarding["lastPlan"]["fat_g"], 56.0);

    cli(dir)
        .args(["onboard", "advance"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Step 14/14: Congratulations"));

    cli(dir)
        .args(["onboard", "advance"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Profile saved"));

    let store = read_store(dir);
    let profile: serde_json::Value =
        serde_json::from_str(store["cal.profile.v1"].as_str().unwrap()).unwrap();
    assert_eq!(profile["step"], 14);
    assert_eq!(profile["goal"], "lose");
    assert!(profile["lastPlan"]["targetDateISO"].is_string());
}

#[test]
fn test_onboarding_plan_and_overrides() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    run(dir, &["onboard", "set", "weight", "70"]);
    run(dir, &["onboard", "set", "goal", "lose"]);

    cli(dir)
        .args(["onboard", "plan"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Protein: 154 g"))
        .stdout(predicate::str::contains("Fat:     56 g"));

    run(dir, &["onboard", "set", "protein_g", "120"]);
    cli(dir)
        .args(["onboard", "plan"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Protein: 120 g"));

    run(dir, &["onboard", "set", "protein_g", "none"]);
    cli(dir)
        .args(["onboard", "plan"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Protein: 154 g"));
}

#[test]
fn test_onboarding_imperial_input_is_stored_metric() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    run(dir, &["onboard", "set", "units", "imperial"]);
    run(dir, &["onboard", "set", "weight", "150"]);
    run(dir, &["onboard", "set", "height", "5'7"]);

    let store = read_store(dir);
    let state: serde_json::Value =
        serde_json::from_str(store["cal.onboarding.v1"].as_str().unwrap()).unwrap();
    assert_eq!(state["weightKg"], 68.0);
    assert_eq!(state["heightCm"], 170.0);
}

#[test]
fn test_onboarding_rejects_unknown_field() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path())
        .args(["onboard", "set", "shoe-size", "42"])
        .assert()
        .failure();
}

#[test]
fn test_onboarding_rejects_non_finite_numbers() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    run(dir, &["onboard", "set", "gender", "male"]);
    for value in ["inf", "NaN", "-infinity"] {
        cli(dir)
            .args(["onboard", "set", "weight", value])
            .assert()
            .failure();
    }

    let store = read_store(dir);
    let state: serde_json::Value =
        serde_json::from_str(store["cal.onboarding.v1"].as_str().unwrap()).unwrap();
    assert_eq!(state["gender"], "male");
    assert_eq!(state["weightKg"], 68.0);
}

#[test]
fn test_onboarding_go_clamps() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path())
        .args(["onboard", "go", "99"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Step 14/14"));

    cli(temp_dir.path())
        .args(["onboard", "go", "-3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Step 1/14"));
}

#[test]
fn test_program_select_and_show() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    cli(dir)
        .args(["program", "select", "--level", "advanced", "--track", "gym"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Active program: advanced / gym"));

    cli(dir)
        .args(["program", "show", "--day", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Barbell bench press"))
        .stdout(predicate::str::contains("(16 sets)"));

    let store = read_store(dir);
    let sets: serde_json::Value =
        serde_json::from_str(store["program_sets"].as_str().unwrap()).unwrap();
    assert_eq!(sets["2"], serde_json::json!([4, 4, 4, 4, 0]));
}

#[test]
fn test_program_show_defaults_to_beginner_gym() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path())
        .args(["program", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("beginner / gym"));

    cli(temp_dir.path())
        .args(["program", "show", "--day", "4"])
        .assert()
        .failure();
}

#[test]
fn test_log_add_show_and_day_summary() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    run(dir, &["program", "select", "--level", "beginner", "--track", "gym"]);
    for (kg, reps) in [("50", "10"), ("52", "8")] {
        run(
            dir,
            &[
                "log", "add", "--date", "2025-06-02", "--exercise", "0", "--kg", kg, "--reps", reps,
            ],
        );
    }

    cli(dir)
        .args(["log", "show", "--date", "2025-06-02", "--day", "1", "--exercise", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1. 50 kg × 10"))
        .stdout(predicate::str::contains("2. 52 kg × 8"));

    cli(dir)
        .args(["day", "--date", "2025-06-02"])
        .assert()
        .success()
        .stdout(predicate::str::contains("program day 1 - total sets 2"))
        .stdout(predicate::str::contains("Group A: 2/6 (Partial)"))
        .stdout(predicate::str::contains("last 52 kg × 8"));

    let store = read_store(dir);
    assert!(store.get("log_2025-06-02_1_0").is_some());
}

#[test]
fn test_log_requires_day_on_rest_days() {
    let temp_dir = setup_test_dir();

    // 2025-06-03 is a Tuesday
    cli(temp_dir.path())
        .args([
            "log", "add", "--date", "2025-06-03", "--exercise", "0", "--kg", "20", "--reps", "5",
        ])
        .assert()
        .failure();

    cli(temp_dir.path())
        .args(["day", "--date", "2025-06-03"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rest day"));
}

#[test]
fn test_variant_title_shows_in_day_summary() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    run(dir, &["program", "select", "--level", "beginner", "--track", "gym"]);
    run(dir, &["log", "variant", "--day", "2", "--exercise", "1", "Chin-up"]);

    // 2025-06-04 is a Wednesday
    cli(dir)
        .args(["day", "--date", "2025-06-04"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1. Chin-up: 0 set(s)"));
}

#[test]
fn test_calendar_and_streaks() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    run(dir, &["program", "select", "--level", "beginner", "--track", "home"]);
    for exercise in ["0", "1", "2"] {
        for _ in 0..2 {
            run(
                dir,
                &[
                    "log", "add", "--date", "2025-06-04", "--exercise", exercise, "--kg", "0",
                    "--reps", "15",
                ],
            );
        }
    }
    run(
        dir,
        &["log", "add", "--date", "2025-06-06", "--exercise", "0", "--kg", "0", "--reps", "15"],
    );

    cli(dir)
        .args(["calendar", "--month", "2025-06"])
        .assert()
        .success()
        .stdout(predicate::str::contains("  4#"))
        .stdout(predicate::str::contains("  6+"))
        .stdout(predicate::str::contains("Training days: 2"));

    cli(dir)
        .args(["calendar", "--month", "2025-13"])
        .assert()
        .failure();

    cli(dir)
        .args(["streaks", "--window", "30"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Current streak: 0"));
}

#[test]
fn test_tools() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    cli(dir)
        .args(["tools", "one-rep-max", "--weight", "100", "--reps", "10"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1RM: 133 kg"));

    cli(dir)
        .args([
            "tools", "tdee", "--gender", "male", "--height", "180", "--weight", "80", "--age",
            "30", "--save",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("TDEE: 2759 kcal/day"));

    let store = read_store(dir);
    assert!(store.get("calorie_profile").is_some());

    cli(dir)
        .args(["tools", "profile"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Calorie profile"))
        .stdout(predicate::str::contains("180 cm, 80 kg"))
        .stdout(predicate::str::contains("TDEE: 2759 kcal/day"));
}

#[test]
fn test_tools_profile_follows_onboarding_locale() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    cli(dir)
        .args(["tools", "profile"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No saved calorie profile"));

    run(dir, &["onboard", "set", "locale", "uk"]);
    run(dir, &["onboard", "save"]);
    cli(dir)
        .args(["tools", "profile"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Профіль калорій не збережено"));
}

#[test]
fn test_rest_timer() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    cli(dir)
        .args(["timer", "start", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Timer 2:00 (running)"));

    cli(dir)
        .args(["timer", "tick", "--seconds", "45"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Timer 1:15 (running)"));

    cli(dir)
        .args(["timer", "tick", "--seconds", "200"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Rest is over"))
        .stdout(predicate::str::contains("Timer 0:00 (stopped)"));

    cli(dir).args(["timer", "start", "6"]).assert().failure();
}

#[test]
fn test_course_progress() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    cli(dir)
        .args(["course", "toggle", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Day 1 marked done"))
        .stdout(predicate::str::contains("Course: 5% (1/21 days)"));

    cli(dir)
        .args(["course", "toggle", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Course: 0% (0/21 days)"));
}
