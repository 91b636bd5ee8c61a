//! E2E CLI tests for forecasting commands:
//! - `plancast init` skeleton and re-init guard
//! - `plancast simulate` determinism, persistence and error codes
//! - `plancast plan` critical path
//! - `plancast progress` templated checkpoints
//!
//! Each test runs the `plancast` binary as a subprocess in a temp directory.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test Harness
// ---------------------------------------------------------------------------

fn plancast(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("plancast"));
    cmd.current_dir(dir);
    cmd.env("PLANCAST_LOG", "error");
    cmd.env_remove("FORMAT");
    cmd
}

const PLAN: &str = r#"{
    "project": {"id": "gearbox", "name": "Gearbox", "start_date": "2026-01-05T00:00:00Z"},
    "work_items": [
        {"id": "spec", "estimated_hours": 8, "task_type": "design", "role_type": "engineer"},
        {"id": "cad", "estimated_hours": 24, "dependencies": ["spec"], "task_type": "cad", "role_type": "engineer"},
        {"id": "fea", "estimated_hours": 16, "dependencies": ["spec"], "task_type": "analysis", "role_type": "analyst"},
        {"id": "review", "estimated_hours": 4, "dependencies": ["cad", "fea"], "task_type": "review", "role_type": "lead"}
    ]
}"#;

const CYCLIC_PLAN: &str = r#"{
    "project": {"id": "loop", "start_date": "2026-01-05T00:00:00Z"},
    "work_items": [
        {"id": "a", "estimated_hours": 1, "dependencies": ["b"]},
        {"id": "b", "estimated_hours": 1, "dependencies": ["a"]}
    ]
}"#;

fn setup(plan: &str) -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(dir.path().join("plan.json"), plan).expect("write plan");
    dir
}

fn json_stdout(cmd: &mut Command) -> Value {
    let output = cmd.output().expect("command should not crash");
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be valid JSON")
}

fn json_stderr_code(cmd: &mut Command) -> String {
    let output = cmd.output().expect("command should not crash");
    assert!(!output.status.success(), "command unexpectedly succeeded");
    let json: Value = serde_json::from_slice(&output.stderr).expect("stderr should be valid JSON");
    json["error"]["error_code"]
        .as_str()
        .expect("error_code field")
        .to_string()
}

// ---------------------------------------------------------------------------
// init
// ---------------------------------------------------------------------------

#[test]
fn init_creates_config_and_refuses_reinit() {
    let dir = setup(PLAN);
    plancast(dir.path()).args(["init"]).assert().success();
    assert!(dir.path().join(".plancast/config.toml").exists());

    plancast(dir.path())
        .args(["init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    plancast(dir.path()).args(["init", "--force"]).assert().success();
}

// ---------------------------------------------------------------------------
// simulate
// ---------------------------------------------------------------------------

#[test]
fn simulate_with_seed_is_reproducible() {
    let dir = setup(PLAN);
    let args = [
        "simulate", "plan.json", "--iterations", "400", "--seed", "42", "--no-persist",
        "--format", "json",
    ];

    let first = json_stdout(plancast(dir.path()).args(args));
    let second = json_stdout(plancast(dir.path()).args(args));

    assert_eq!(first["distribution"], second["distribution"]);
    assert_eq!(first["seed"], 42);
    assert_eq!(first["iterations"], 400);
    assert_eq!(first["duration_unit"], "days");
    assert_eq!(first["persisted"], false);
    assert!(first["id"].as_str().unwrap().starts_with("run-"));

    let d = &first["distribution"];
    let p50 = d["p50_completion"].as_str().unwrap();
    let p90 = d["p90_completion"].as_str().unwrap();
    let p95 = d["p95_completion"].as_str().unwrap();
    // RFC 3339 UTC strings order lexicographically.
    assert!(p50 <= p90 && p90 <= p95);
    assert!(p50 > "2026-01-05");
}

#[test]
fn simulate_persists_run_and_lists_it() {
    let dir = setup(PLAN);
    plancast(dir.path()).args(["init"]).assert().success();

    let run = json_stdout(plancast(dir.path()).args([
        "simulate", "plan.json", "-n", "200", "--seed", "1", "--format", "json",
    ]));
    assert_eq!(run["persisted"], true);
    assert!(dir.path().join(".plancast/runs.jsonl").exists());

    let runs = json_stdout(plancast(dir.path()).args(["runs", "gearbox", "--format", "json"]));
    let runs = runs.as_array().expect("runs array");
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0]["id"], run["id"]);
    assert_eq!(runs[0]["distribution"], run["distribution"]);

    let other = json_stdout(plancast(dir.path()).args(["runs", "other", "--format", "json"]));
    assert_eq!(other.as_array().map(Vec::len), Some(0));
}

#[test]
fn simulate_without_init_reports_not_initialized() {
    let dir = setup(PLAN);
    let code = json_stderr_code(plancast(dir.path()).args(["simulate", "plan.json", "--format", "json"]));
    assert_eq!(code, "E1001");
}

#[test]
fn simulate_rejects_cycle_with_code() {
    let dir = setup(CYCLIC_PLAN);
    let code = json_stderr_code(plancast(dir.path()).args([
        "simulate", "plan.json", "--no-persist", "--format", "json",
    ]));
    assert_eq!(code, "E2003");
}

#[test]
fn simulate_rejects_zero_iterations() {
    let dir = setup(PLAN);
    let code = json_stderr_code(plancast(dir.path()).args([
        "simulate", "plan.json", "-n", "0", "--no-persist", "--format", "json",
    ]));
    assert_eq!(code, "E2007");
}

#[test]
fn malformed_plan_reports_parse_error_with_hint() {
    let dir = setup("{\"project\": 3}");
    plancast(dir.path())
        .args(["simulate", "plan.json", "--no-persist", "--format", "text"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[E1003]"))
        .stderr(predicate::str::contains("hint:"));
}

#[test]
fn text_output_is_key_value() {
    let dir = setup(PLAN);
    plancast(dir.path())
        .args(["simulate", "plan.json", "-n", "50", "--seed", "3", "--no-persist", "--format", "text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("run id=run-"))
        .stdout(predicate::str::contains("seed=3"))
        .stdout(predicate::str::contains("persisted=false"));
}

// ---------------------------------------------------------------------------
// plan / progress
// ---------------------------------------------------------------------------

#[test]
fn plan_reports_critical_path_and_slack() {
    let dir = setup(PLAN);
    let out = json_stdout(plancast(dir.path()).args(["plan", "plan.json", "--format", "json"]));

    assert_eq!(out["total_hours"], 36.0);
    assert_eq!(out["critical_path"], serde_json::json!(["spec", "cad", "review"]));

    let fea = out["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|i| i["id"] == "fea")
        .expect("fea row");
    assert_eq!(fea["slack"], 8.0);
    assert_eq!(fea["critical"], false);
}

#[test]
fn plan_rejects_unknown_dependency() {
    let dir = setup(
        r#"{"project": {"id": "p", "start_date": "2026-01-05T00:00:00Z"},
            "work_items": [{"id": "a", "estimated_hours": 1, "dependencies": ["ghost"]}]}"#,
    );
    let code = json_stderr_code(plancast(dir.path()).args(["plan", "plan.json", "--format", "json"]));
    assert_eq!(code, "E2004");
}

#[test]
fn progress_samples_every_checkpoint() {
    let dir = setup(PLAN);
    let args = ["progress", "mechanical_designer", "design", "--seed", "5", "--format", "json"];
    let out = json_stdout(plancast(dir.path()).args(args));

    assert_eq!(out["template"], "Mechanical Design Process");
    let checkpoints = out["checkpoints"].as_array().unwrap();
    assert_eq!(checkpoints.len(), 5);
    assert_eq!(checkpoints[0]["name"], "Concept Review");
    assert!(out["total_hours"].as_f64().unwrap() >= 0.0);

    let again = json_stdout(plancast(dir.path()).args(args));
    assert_eq!(out, again);
}

#[test]
fn progress_unknown_template_is_not_found() {
    let dir = setup(PLAN);
    let code = json_stderr_code(plancast(dir.path()).args([
        "progress", "astronaut", "design", "--format", "json",
    ]));
    assert_eq!(code, "E2001");
}

#[test]
fn plan_cycle_names_a_link_to_drop() {
    let dir = setup(CYCLIC_PLAN);
    plancast(dir.path())
        .args(["plan", "plan.json", "--format", "text"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[E2003]"))
        .stderr(predicate::str::contains("drop the dependency of 'a' on 'b'"));
}
