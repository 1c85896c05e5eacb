//! Black-box CLI tests: config loading errors, schema emission, and the
//! plan/apply commands' behavior when there's nothing to reconcile.

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;

fn cmt() -> Command {
    Command::cargo_bin("cmt").unwrap()
}

fn write_config(dir: &std::path::Path, contents: &str) -> std::path::PathBuf {
    let path = dir.join("config.yml");
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(contents.as_bytes()).unwrap();
    path
}

#[test]
fn plan_fails_with_a_clear_message_when_config_is_missing() {
    let dir = tempfile::tempdir().unwrap();
    cmt()
        .current_dir(dir.path())
        .args(["--config", "nope.yml", "plan"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope.yml"));
}

#[test]
fn plan_fails_when_hosts_list_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = write_config(dir.path(), "basePath: repo\nhosts: []\n");
    cmt()
        .args(["--config", cfg.to_str().unwrap(), "plan"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("hosts"));
}

#[test]
fn plan_fails_when_base_path_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = write_config(dir.path(), "basePath: \"\"\nhosts: []\n");
    cmt()
        .args(["--config", cfg.to_str().unwrap(), "plan"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("basePath"));
}

#[test]
fn schema_cmt_emits_a_json_schema_with_hosts_property() {
    cmt()
        .args(["schema", "cmt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"hosts\""));
}

#[test]
fn schema_host_emits_a_json_schema_with_remote_path_property() {
    cmt()
        .args(["schema", "host"])
        .assert()
        .success()
        .stdout(predicate::str::contains("remotePath"));
}

#[test]
fn schema_hook_before_apply_emits_a_command_property() {
    cmt()
        .args(["schema", "hook-before-apply"])
        .assert()
        .success()
        .stdout(predicate::str::contains("command"));
}

#[test]
fn schema_rejects_an_unknown_kind() {
    cmt().args(["schema", "bogus"]).assert().failure();
}

#[test]
fn plan_reports_no_changes_for_a_host_with_no_projects() {
    // `ssh -G` resolves local config only and never dials out, and
    // connecting a `RemoteClient` is lazy (the transport shells a fresh
    // `ssh` per command rather than holding a connection open), so a host
    // with no discoverable projects completes the whole plan without any
    // network I/O actually happening.
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("repo")).unwrap();
    let cfg = write_config(
        dir.path(),
        "basePath: repo\nhosts:\n  - name: server1\n    host: 203.0.113.1\n",
    );
    cmt()
        .args(["--config", cfg.to_str().unwrap(), "plan"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No changes"));
}
