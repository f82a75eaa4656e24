//! Integration tests for the provcheck binary
//!
//! These tests verify argument parsing, suite validation and full runs
//! against the fake terraform script and a local Compute stub.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn provcheck() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("provcheck"));
    cmd.env("NO_COLOR", "1")
        .env_remove("PROVCHECK_PROJECT")
        .env_remove("PROVCHECK_TERRAFORM_BIN")
        .env_remove("PROVCHECK_COMPUTE_ENDPOINT");
    cmd
}

fn write_suite(dir: &Path, yaml: &str) -> std::path::PathBuf {
    let path = dir.join("provcheck.yaml");
    std::fs::write(&path, yaml).unwrap();
    path
}

const ADVANCED_SUITE: &str = r"
project: my-gcp-project
zone: us-central1-a
max_parallel: 2
retry: { max_attempts: 2, base_delay_ms: 1 }
scenarios:
  - name: advanced
    config_dir: advanced
    variables:
      instance_name: test-advanced-instance
      machine_type: n2d-standard-2
      enable_iap: true
      enable_confidential_vm: true
      enable_shielded_secure_boot: true
      enable_shielded_vtpm: true
      enable_shielded_integrity_monitoring: true
      sole_tenancy_node_groups: [my-node-group]
  - name: confidential-n1
    config_dir: confidential
    variables:
      instance_name: test-confidential-n1
      machine_type: n1-standard-1
      enable_confidential_vm: true
    expect:
      apply_error: [n2d, n2, e2]
";

// --- Help and version tests ---

#[test]
fn test_cli_no_args_shows_help_and_exits_two() {
    // clap with arg_required_else_help shows help on stderr and exits 2.
    // An env-supplied global flag counts as an argument, so drop NO_COLOR.
    provcheck()
        .env_remove("NO_COLOR")
        .assert()
        .code(2)
        .stderr(predicate::str::contains(
            "Provision, inspect and verify declarative VM configurations",
        ));
}

#[test]
fn test_no_color_env_accepts_conventional_values() {
    for value in ["1", "true", "yes", "0", "false"] {
        provcheck()
            .env("NO_COLOR", value)
            .arg("version")
            .assert()
            .success()
            .stdout(predicate::str::contains("provcheck v0.1.0"));
    }
}

#[test]
fn test_cli_help_lists_commands() {
    provcheck()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("destroy"))
        .stdout(predicate::str::contains("validate"));
}

#[test]
fn test_version_command_shows_version() {
    provcheck()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("provcheck v0.1.0"));
}

#[test]
fn test_version_command_json_outputs_valid_json() {
    let output = provcheck().args(["version", "--json"]).output().unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["version"], "0.1.0");
}

#[test]
fn test_unknown_command_fails() {
    provcheck()
        .arg("frobnicate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

// --- validate ---

#[test]
fn test_validate_accepts_well_formed_suite() {
    let dir = tempfile::tempdir().unwrap();
    let suite = write_suite(dir.path(), ADVANCED_SUITE);

    provcheck()
        .arg("validate")
        .arg(&suite)
        .assert()
        .success()
        .stdout(predicate::str::contains("suite is valid (2 scenario(s)"))
        .stdout(predicate::str::contains("expects rejection"));
}

#[test]
fn test_validate_json_lists_scenarios() {
    let dir = tempfile::tempdir().unwrap();
    let suite = write_suite(dir.path(), ADVANCED_SUITE);

    let output = provcheck()
        .args(["validate", "--json"])
        .arg(&suite)
        .output()
        .unwrap();

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["valid"], true);
    assert_eq!(json["scenarios"][0]["name"], "advanced");
    assert_eq!(json["scenarios"][1]["negative"], true);
}

#[test]
fn test_validate_reports_every_problem() {
    let dir = tempfile::tempdir().unwrap();
    let suite = write_suite(
        dir.path(),
        r"
zone: us-central1-a
scenarios:
  - name: bad
    config_dir: simple
    variables:
      instance_name: Bad_Name
      image: debian-11
",
    );

    provcheck()
        .arg("validate")
        .arg(&suite)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("instance_name 'Bad_Name'"))
        .stderr(predicate::str::contains("publisher/family"))
        .stderr(predicate::str::contains("project is required"));
}

#[test]
fn test_validate_project_flag_supplies_project() {
    let dir = tempfile::tempdir().unwrap();
    let suite = write_suite(
        dir.path(),
        "zone: z\nscenarios:\n  - { name: a, config_dir: simple, variables: { instance_name: vm } }\n",
    );

    provcheck()
        .args(["validate", "--project", "from-flag"])
        .arg(&suite)
        .assert()
        .success();
}

#[test]
fn test_validate_unknown_scenario_filter_fails() {
    let dir = tempfile::tempdir().unwrap();
    let suite = write_suite(dir.path(), ADVANCED_SUITE);

    provcheck()
        .args(["validate", "-s", "nope"])
        .arg(&suite)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("nope"));
}

#[test]
fn test_validate_missing_file_fails() {
    provcheck()
        .args(["validate", "/nonexistent/provcheck.yaml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("cannot read"));
}

#[test]
fn test_json_error_goes_to_stdout() {
    let output = provcheck()
        .args(["validate", "--json", "/nonexistent/provcheck.yaml"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["error"], true);
    assert_eq!(json["code"], "ERROR");
}

// --- plan / run / destroy against the fake terraform ---

#[cfg(unix)]
mod with_fake_terraform {
    use super::*;
    use crate::fake_terraform::{FakeTerraform, config_dir};
    use crate::stub_compute::{ADVANCED_INSTANCE, StubCompute};

    fn suite_with_configs(yaml: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        config_dir(dir.path(), "advanced");
        config_dir(dir.path(), "confidential");
        let suite = write_suite(dir.path(), yaml);
        (dir, suite)
    }

    fn with_fake(cmd: &mut Command, fake: &FakeTerraform) {
        cmd.env("PROVCHECK_TERRAFORM_BIN", &fake.bin)
            .env("FAKE_TF_LOG", &fake.log)
            .env("GOOGLE_OAUTH_ACCESS_TOKEN", "test-token");
    }

    #[test]
    fn test_plan_runs_every_scenario_without_applying() {
        let fake = FakeTerraform::install();
        let (_dir, suite) = suite_with_configs(ADVANCED_SUITE);

        let mut cmd = provcheck();
        with_fake(&mut cmd, &fake);
        let output = cmd.args(["plan", "--json"]).arg(&suite).output().unwrap();

        assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(json["passed"], 2);
        assert_eq!(json["failed"], 0);
        let calls = fake.calls();
        assert!(!calls.contains(&"apply".to_string()), "got: {calls:?}");
        assert!(!calls.contains(&"destroy".to_string()), "got: {calls:?}");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_run_applies_inspects_and_destroys() {
        let fake = FakeTerraform::install();
        let (_dir, suite) = suite_with_configs(ADVANCED_SUITE);
        let stub = StubCompute::with_replies([(200, ADVANCED_INSTANCE)]);
        let endpoint = stub.serve().await;

        let mut cmd = provcheck();
        with_fake(&mut cmd, &fake);
        cmd.env("PROVCHECK_COMPUTE_ENDPOINT", &endpoint)
            .args(["run", "--json"])
            .arg(&suite);
        let output = tokio::task::spawn_blocking(move || cmd.output().unwrap())
            .await
            .unwrap();

        assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(json["passed"], 2);
        let advanced = &json["scenarios"][0];
        assert_eq!(advanced["scenario"], "advanced");
        assert_eq!(advanced["destroyed"], true);
        assert_eq!(json["scenarios"][1]["destroyed"], false);

        let calls = fake.calls();
        assert_eq!(calls.iter().filter(|c| *c == "apply").count(), 2);
        assert_eq!(calls.iter().filter(|c| *c == "destroy").count(), 1);
        assert_eq!(stub.auth_headers(), vec!["Bearer test-token".to_string()]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_run_reports_mismatch_and_still_destroys() {
        let fake = FakeTerraform::install();
        let yaml = ADVANCED_SUITE.replace(
            "      sole_tenancy_node_groups: [my-node-group]\n",
            "      sole_tenancy_node_groups: [my-node-group]\n    expect: { machine_type: e2-medium }\n",
        );
        let (_dir, suite) = suite_with_configs(&yaml);
        let stub = StubCompute::with_replies([(200, ADVANCED_INSTANCE)]);
        let endpoint = stub.serve().await;

        let mut cmd = provcheck();
        with_fake(&mut cmd, &fake);
        cmd.env("PROVCHECK_COMPUTE_ENDPOINT", &endpoint)
            .args(["run", "--json", "-s", "advanced"])
            .arg(&suite);
        let output = tokio::task::spawn_blocking(move || cmd.output().unwrap())
            .await
            .unwrap();

        assert_eq!(output.status.code(), Some(1));
        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(json["failed"], 1);
        let outcome = &json["scenarios"][0]["outcome"];
        assert_eq!(outcome["kind"], "assertion");
        assert_eq!(outcome["mismatches"][0]["field"], "machine_type");
        assert_eq!(json["scenarios"][0]["destroyed"], true);
        assert!(fake.calls().contains(&"destroy".to_string()));
    }

    #[test]
    fn test_destroy_sweeps_suite() {
        let fake = FakeTerraform::install();
        let (_dir, suite) = suite_with_configs(ADVANCED_SUITE);

        let mut cmd = provcheck();
        with_fake(&mut cmd, &fake);
        cmd.arg("destroy")
            .arg(&suite)
            .assert()
            .success()
            .stdout(predicate::str::contains("2 configuration(s) destroyed"));

        assert_eq!(
            fake.calls(),
            vec!["init", "destroy", "init", "destroy"]
        );
    }
}
