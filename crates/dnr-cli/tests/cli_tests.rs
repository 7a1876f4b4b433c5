//! Integration tests for the dnr CLI binary.
//!
//! These tests exercise the actual compiled binary using assert_cmd.

use assert_cmd::Command;
use dnr_test_utils::{TestStateDir, tds};
use predicates::prelude::*;

/// Get a Command for the dnr binary rooted at `state`
fn dnr_cmd(state: &TestStateDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("dnr"));
    cmd.arg("--state-dir").arg(state.root()).env_remove("DNR_LOG");
    cmd
}

// ============================================================================
// Help and Version Tests
// ============================================================================

#[test]
fn test_help_output() {
    let state = TestStateDir::new();
    dnr_cmd(&state)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("converge"))
        .stdout(predicate::str::contains("check"));
}

#[test]
fn test_no_command_prints_hint() {
    let state = TestStateDir::new();
    dnr_cmd(&state)
        .assert()
        .success()
        .stdout(predicate::str::contains("dnr --help"));
}

// ============================================================================
// Converge Tests
// ============================================================================

#[test]
fn test_converge_installs_then_is_current() {
    let state = TestStateDir::new();
    state.write_dataset("tds", &tds::sample_tracker_data());

    dnr_cmd(&state)
        .args(["converge", "tds", "--etag", "v1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("SYNCED"));

    dnr_cmd(&state)
        .args(["converge", "tds", "--etag", "v1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already current"));

    let settings = state.read_json("settings.json");
    assert_eq!(settings["declarative_net_request-tds"]["etag"], "v1");
}

#[test]
fn test_converge_defaults_to_content_tag() {
    let state = TestStateDir::new();
    state.write_dataset("tds", &tds::sample_tracker_data());

    dnr_cmd(&state).args(["converge", "tds"]).assert().success();

    let settings = state.read_json("settings.json");
    let etag = settings["declarative_net_request-tds"]["etag"]
        .as_str()
        .unwrap()
        .to_string();
    assert_eq!(etag.len(), 64);

    // Unchanged file, unchanged tag
    dnr_cmd(&state)
        .args(["converge", "tds"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already current"));
}

#[test]
fn test_converge_repairs_lost_rules() {
    let state = TestStateDir::new();
    state.write_dataset("tds", &tds::sample_tracker_data());
    dnr_cmd(&state)
        .args(["converge", "tds", "--etag", "v1"])
        .assert()
        .success();

    state.remove_rules();

    dnr_cmd(&state)
        .args(["converge", "tds", "--etag", "v1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("SYNCED"));
    assert!(state.rules_path().exists());
}

#[test]
fn test_converge_missing_dataset_fails() {
    let state = TestStateDir::new();
    dnr_cmd(&state)
        .args(["converge", "tds", "--etag", "v1"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error"))
        .stderr(predicate::str::contains("unavailable"));
    assert!(!state.settings_path().exists());
}

#[test]
fn test_converge_untracked_config_is_skipped() {
    let state = TestStateDir::new();
    state.write_dataset("config", &serde_json::json!({ "features": {} }));

    dnr_cmd(&state)
        .args(["converge", "config", "--etag", "c1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("skipped"));
    assert!(!state.rules_path().exists());
}

#[test]
fn test_converge_track_tag_policy() {
    let state = TestStateDir::new();
    state.write_config("[sync]\nuntracked = \"track-tag\"\n");

    dnr_cmd(&state)
        .args(["converge", "config", "--etag", "c1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("TAGGED"));

    let rules = state.read_json("dynamic-rules.json");
    assert_eq!(rules[0]["id"], 10_001);
}

#[test]
fn test_converge_manifest_v2_does_nothing() {
    let state = TestStateDir::new();
    state.write_config("manifest_version = 2\n");
    state.write_dataset("tds", &tds::sample_tracker_data());

    dnr_cmd(&state)
        .args(["converge", "tds", "--etag", "v1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("disabled"));
    assert!(!state.rules_path().exists());
}

#[test]
fn test_unknown_configuration_is_rejected() {
    let state = TestStateDir::new();
    dnr_cmd(&state)
        .args(["converge", "surrogates"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown configuration"));
}

#[test]
fn test_rule_limit_from_config() {
    let state = TestStateDir::new();
    state.write_config("[sync]\nrule_limit = 2\n");
    state.write_dataset("tds", &tds::sample_tracker_data());

    dnr_cmd(&state)
        .args(["converge", "tds", "--etag", "v1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Rule limit exceeded"));
}

// ============================================================================
// Check, Status and Rules Tests
// ============================================================================

#[test]
fn test_check_reports_missing_then_healthy() {
    let state = TestStateDir::new();
    state.write_dataset("tds", &tds::sample_tracker_data());

    dnr_cmd(&state)
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("MISSING"));

    dnr_cmd(&state)
        .args(["converge", "tds", "--etag", "v1"])
        .assert()
        .success();

    dnr_cmd(&state)
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("No drift detected"));
}

#[test]
fn test_check_json_output() {
    let state = TestStateDir::new();
    state.write_dataset("tds", &tds::sample_tracker_data());
    dnr_cmd(&state)
        .args(["converge", "tds", "--etag", "v1"])
        .assert()
        .success();

    let output = dnr_cmd(&state)
        .args(["check", "tds", "--json"])
        .output()
        .unwrap();
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["status"], "Healthy");
    assert_eq!(report["partitions"][0]["sentinel_etag"], "v1");
}

#[test]
fn test_status_json_lists_every_configuration() {
    let state = TestStateDir::new();
    state.write_dataset("tds", &tds::sample_tracker_data());
    dnr_cmd(&state)
        .args(["converge", "tds", "--etag", "v1"])
        .assert()
        .success();

    let output = dnr_cmd(&state).args(["status", "--json"]).output().unwrap();
    let statuses: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let statuses = statuses.as_array().unwrap();
    assert_eq!(statuses.len(), 2);

    let tds = statuses.iter().find(|s| s["config"] == "tds").unwrap();
    assert_eq!(tds["tracked"], true);
    assert_eq!(tds["record_etag"], "v1");
    assert_eq!(tds["range"], "[1, 10001)");

    let config = statuses.iter().find(|s| s["config"] == "config").unwrap();
    assert_eq!(config["tracked"], false);
    assert_eq!(config["installed_rules"], 0);
}

#[test]
fn test_rules_prints_partition() {
    let state = TestStateDir::new();
    state.write_dataset("tds", &tds::sample_tracker_data());
    dnr_cmd(&state)
        .args(["converge", "tds", "--etag", "v1"])
        .assert()
        .success();

    let output = dnr_cmd(&state).args(["rules", "tds"]).output().unwrap();
    let rules: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let rules = rules.as_array().unwrap();
    assert!(rules.len() > 1);
    assert_eq!(rules[0]["condition"]["requestDomains"][0], "etag.invalid");

    dnr_cmd(&state)
        .args(["rules", "config"])
        .assert()
        .success()
        .stdout(predicate::str::diff("[]\n"));
}

#[test]
fn test_verbose_logs_to_stderr() {
    let state = TestStateDir::new();
    state.write_dataset("tds", &tds::sample_tracker_data());

    dnr_cmd(&state)
        .args(["-v", "converge", "tds", "--etag", "v1"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Synchronized declarative rules"));
}
