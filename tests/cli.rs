//! Binary smoke tests.

use assert_cmd::Command;
use tempfile::TempDir;

fn cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("resilient-e2e").unwrap();
    cmd.arg("--config")
        .arg(dir.path().join("config.yaml"))
        .env_remove("RUST_LOG")
        .env_remove("RESILIENT_E2E_MAX_ATTEMPTS")
        .env_remove("RESILIENT_E2E_INITIAL_DELAY_MS")
        .env_remove("RESILIENT_E2E_BACKOFF_MULTIPLIER")
        .env_remove("RESILIENT_E2E_MAX_DELAY_MS")
        .env_remove("RESILIENT_E2E_CANDIDATE_TIMEOUT_MS")
        .env_remove("RESILIENT_E2E_DEADLINE_MS");
    cmd
}

#[test]
fn plan_prints_json_budget() {
    let dir = TempDir::new().unwrap();
    let output = cmd(&dir)
        .args([
            "--output",
            "json",
            "plan",
            "--candidates",
            "3",
            "--max-attempts",
            "3",
            "--initial-delay-ms",
            "500",
            "--multiplier",
            "2",
            "--timeout-ms",
            "1000",
            "--deadline-ms",
            "10000",
        ])
        .output()
        .unwrap();

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["schedule_ms"], serde_json::json!([500, 1000]));
    assert_eq!(report["worst_case_ms"], 10_500);
    assert_eq!(report["exceeds_deadline"], true);
}

#[test]
fn config_show_reads_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("config.yaml"), "retry:\n  max_attempts: 9\n").unwrap();

    let output = cmd(&dir).args(["config", "show"]).output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("max_attempts: 9"));
}

#[test]
fn invalid_config_fails() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("config.yaml"),
        "retry:\n  backoff_multiplier: 0.5\n",
    )
    .unwrap();

    cmd(&dir).args(["config", "validate"]).assert().failure();
}

#[test]
fn missing_config_is_reported_on_stderr() {
    let dir = TempDir::new().unwrap();

    let output = cmd(&dir).args(["config", "show"]).output().unwrap();

    assert!(output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Config file not found, using defaults"));
    assert!(stderr.contains("config.yaml"));
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("Current configuration (defaults):"));
}
