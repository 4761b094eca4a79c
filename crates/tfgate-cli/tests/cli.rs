//! Exit codes and output of the tf-gate binary

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

const BUSINESS_HOURS: &str = "2024-01-16T10:00:00Z";

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn tf_gate() -> Command {
    let mut cmd = Command::cargo_bin("tf-gate").unwrap();
    cmd.env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("TFGATE_CONFIG")
        .env_remove("TFGATE_BREAK_GLASS");
    cmd
}

fn validate(plan: &str) -> Command {
    let mut cmd = tf_gate();
    cmd.arg("validate")
        .arg(fixture(plan))
        .args(["--at", BUSINESS_HOURS]);
    cmd
}

#[test]
fn small_rollout_is_go() {
    validate("small_rollout.json")
        .assert()
        .code(0)
        .stdout(predicate::str::contains("GO"))
        .stdout(predicate::str::contains("GREEN"));
}

#[test]
fn teardown_is_blocked_by_policy() {
    validate("teardown.json")
        .args(["--intent", "update tags"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("POLICY_BLOCK"))
        .stdout(predicate::str::contains("protected-resource-deletion"))
        .stdout(predicate::str::contains("open-network-exposure"))
        .stdout(predicate::str::contains("MISMATCH"));
}

#[test]
fn break_glass_exits_42_and_keeps_findings() {
    validate("teardown.json")
        .args(["--break-glass", "INC-4711"])
        .assert()
        .code(42)
        .stdout(predicate::str::contains("BREAK_GLASS"))
        .stdout(predicate::str::contains("INC-4711"))
        .stdout(predicate::str::contains("protected-resource-deletion"));
}

#[test]
fn shadow_mode_reports_but_does_not_enforce() {
    validate("teardown.json")
        .arg("--shadow-mode")
        .assert()
        .code(0)
        .stdout(predicate::str::contains("POLICY_BLOCK"))
        .stdout(predicate::str::contains("shadow mode"));
}

#[test]
fn drift_conflict_exits_2() {
    validate("small_rollout.json")
        .arg("--drift")
        .arg(fixture("drift.json"))
        .assert()
        .code(2)
        .stdout(predicate::str::contains("DRIFT_CONFLICT"))
        .stdout(predicate::str::contains("aws_instance.app[1]"));
}

#[test]
fn missing_drift_file_is_degraded_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    validate("small_rollout.json")
        .arg("--drift")
        .arg(dir.path().join("absent.json"))
        .assert()
        .code(0)
        .stdout(predicate::str::contains("drift_scan_unavailable"));
}

#[test]
fn malformed_plan_exits_64() {
    validate("duplicate_address.json")
        .assert()
        .code(64)
        .stderr(predicate::str::contains("duplicate address"));
}

#[test]
fn json_output_is_machine_readable() {
    let output = validate("teardown.json")
        .args(["--output", "json"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let decision: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(decision["exit_class"], "POLICY_BLOCK");
    assert_eq!(decision["tier"], "RED");
    assert_eq!(decision["blocked"], true);
    let denies = decision["findings"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|f| f["severity"] == "deny")
        .count();
    assert!(denies >= 4);
}

#[test]
fn mandatory_intent_from_config_file_blocks_undeclared_intent() {
    tf_gate()
        .arg("--config")
        .arg(fixture("mandatory_intent.yaml"))
        .arg("validate")
        .arg(fixture("small_rollout.json"))
        .args(["--at", BUSINESS_HOURS])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("INTENT_MISMATCH"));
}

#[test]
fn environment_overrides_config() {
    validate("small_rollout.json")
        .env("TFGATE_INTENT__MANDATORY", "true")
        .args(["--intent", "add app servers"])
        .assert()
        .code(0);

    validate("small_rollout.json")
        .env("TFGATE_INTENT__MANDATORY", "true")
        .assert()
        .code(3);
}

#[test]
fn rules_lists_builtins() {
    tf_gate()
        .arg("rules")
        .assert()
        .success()
        .stdout(predicate::str::contains("protected-resource-deletion"))
        .stdout(predicate::str::contains("creation-limit:aws_nat_gateway"));
}

#[test]
fn config_prints_effective_settings() {
    tf_gate()
        .args(["config", "--output", "yaml"])
        .env("TFGATE_BLAST_RADIUS__RED_MIN_COUNT", "30")
        .assert()
        .success()
        .stdout(predicate::str::contains("blast_radius"))
        .stdout(predicate::str::contains("red_min_count: 30"));
}

#[test]
fn invalid_config_exits_78() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.yaml");
    std::fs::write(&path, "blast_radius:\n  green_max_count: 50\n").unwrap();

    tf_gate()
        .arg("--config")
        .arg(&path)
        .arg("rules")
        .assert()
        .code(78)
        .stderr(predicate::str::contains("green_max_count"));
}
