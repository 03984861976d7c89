//! CLI integration tests using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn adaptest() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("adaptest").unwrap()
}

/// Run `init` in a fresh directory and return it.
fn init_workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    adaptest()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();
    dir
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    adaptest()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created adaptest.toml"))
        .stdout(predicate::str::contains("Created banks/example.toml"));

    assert!(dir.path().join("adaptest.toml").exists());
    assert!(dir.path().join("banks/example.toml").exists());
}

#[test]
fn init_skips_existing_files() {
    let dir = init_workspace();

    adaptest()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn validate_generated_workspace() {
    let dir = init_workspace();

    adaptest()
        .current_dir(dir.path())
        .arg("validate")
        .arg("--bank")
        .arg("banks/example.toml")
        .arg("--config")
        .arg("adaptest.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("Bank OK: 16 items"))
        .stdout(predicate::str::contains("Management of Care"))
        .stdout(predicate::str::contains("All checks passed"));
}

#[test]
fn validate_bank_directory() {
    let dir = init_workspace();

    adaptest()
        .current_dir(dir.path())
        .arg("validate")
        .arg("--bank")
        .arg("banks")
        .assert()
        .success()
        .stdout(predicate::str::contains("Bank OK: 16 items"));
}

#[test]
fn validate_nonexistent_bank_fails() {
    adaptest()
        .arg("validate")
        .arg("--bank")
        .arg("nonexistent.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn simulate_runs_a_seeded_candidate() {
    let dir = init_workspace();

    adaptest()
        .current_dir(dir.path())
        .arg("simulate")
        .arg("--bank")
        .arg("banks/example.toml")
        .arg("--config")
        .arg("adaptest.toml")
        .arg("--ability")
        .arg("1.5")
        .arg("--seed")
        .arg("42")
        .assert()
        .success()
        .stdout(predicate::str::contains("candidate-1"))
        .stdout(predicate::str::contains("Outcome"));
}

#[test]
fn simulate_is_deterministic_under_a_fixed_seed() {
    let dir = init_workspace();

    let run = || {
        adaptest()
            .current_dir(dir.path())
            .arg("simulate")
            .arg("--bank")
            .arg("banks/example.toml")
            .arg("--config")
            .arg("adaptest.toml")
            .arg("--candidates")
            .arg("3")
            .arg("--seed")
            .arg("1234")
            .output()
            .unwrap()
    };

    let first = run();
    let second = run();
    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn simulate_rejects_unknown_format() {
    let dir = init_workspace();

    adaptest()
        .current_dir(dir.path())
        .arg("simulate")
        .arg("--bank")
        .arg("banks/example.toml")
        .arg("--format")
        .arg("pdf")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown report format"));
}

#[test]
fn simulate_writes_reports_that_render() {
    let dir = init_workspace();

    adaptest()
        .current_dir(dir.path())
        .arg("simulate")
        .arg("--bank")
        .arg("banks/example.toml")
        .arg("--config")
        .arg("adaptest.toml")
        .arg("--seed")
        .arg("7")
        .arg("--output")
        .arg("reports")
        .arg("--format")
        .arg("all")
        .assert()
        .success();

    assert!(dir.path().join("reports/candidate-1.json").exists());
    assert!(dir.path().join("reports/candidate-1.md").exists());
    assert!(dir.path().join("reports/candidate-1.html").exists());

    adaptest()
        .current_dir(dir.path())
        .arg("report")
        .arg("--input")
        .arg("reports/candidate-1.json")
        .assert()
        .success()
        .stdout(predicate::str::contains("# Exam Report"));

    adaptest()
        .current_dir(dir.path())
        .arg("report")
        .arg("--input")
        .arg("reports/candidate-1.json")
        .arg("--format")
        .arg("html")
        .arg("--output")
        .arg("reports/rendered.html")
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote"));

    let html = std::fs::read_to_string(dir.path().join("reports/rendered.html")).unwrap();
    assert!(html.contains("<!DOCTYPE html>"));
}

#[test]
fn report_on_missing_file_fails() {
    adaptest()
        .arg("report")
        .arg("--input")
        .arg("nope.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}
