// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Specs for `tether conflicts`.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;

/// A temp dir holding a config that points the store inside it.
struct Sandbox {
    temp: TempDir,
    config: PathBuf,
}

fn sandbox() -> Sandbox {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("config.toml");
    let db = temp.path().join("tether.db");
    std::fs::write(&config, format!("[store]\npath = '{}'\n", db.display())).unwrap();
    Sandbox { temp, config }
}

fn tether(sb: &Sandbox) -> Command {
    let mut cmd = cargo_bin_cmd!("tether");
    cmd.env_remove("TETHER_CONFIG")
        .env_remove("TETHER_DB")
        .env_remove("TETHER_SERVER")
        .env("NO_COLOR", "1")
        .current_dir(sb.temp.path())
        .arg("--config")
        .arg(&sb.config)
        .arg("--offline");
    cmd
}

/// Write a backup holding one message and a pending content conflict
/// over it, then import it.
fn seed_conflict(sb: &Sandbox) {
    let local = json!({
        "id": "m1", "featureId": "chat", "content": "mine", "type": "text",
        "source": "mobile", "status": "pending", "timestamp": 1_700_000_000_000_i64, "synced": false
    });
    let mut server = local.clone();
    server["content"] = json!("theirs");
    server["status"] = json!("sent");
    server["timestamp"] = json!(1_700_000_500_000_i64);
    let backup = json!({
        "messages": [local.clone()],
        "settings": {
            "pendingConflicts": [{
                "entity": "message",
                "id": "m1",
                "type": "message_content",
                "clientVersion": local,
                "serverVersion": server,
                "timestamp": 1_700_000_600_000_i64,
                "resolved": false
            }]
        }
    });
    let path = sb.temp.path().join("seed.json");
    std::fs::write(&path, backup.to_string()).unwrap();
    tether(sb).arg("import").arg(&path).assert().success();
}

fn json_out(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn no_conflicts_initially() {
    let sb = sandbox();
    tether(&sb)
        .args(["conflicts", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No conflicts"));
}

#[test]
fn default_strategy_persists() {
    let sb = sandbox();
    tether(&sb)
        .args(["conflicts", "strategy"])
        .assert()
        .success()
        .stdout("timestamp_wins\n");
    tether(&sb).args(["conflicts", "strategy", "server-wins"]).assert().success();
    tether(&sb)
        .args(["conflicts", "strategy"])
        .assert()
        .success()
        .stdout("server_wins\n");
}

#[test]
fn imported_conflict_is_listed() {
    let sb = sandbox();
    seed_conflict(&sb);
    tether(&sb)
        .args(["conflicts", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[message_content] message m1").and(predicate::str::contains("(pending)")));

    let status = json_out(tether(&sb).args(["status", "-o", "json"]));
    assert_eq!(status["conflicts"]["pendingCount"], 1);
}

#[test]
fn timestamp_resolution_applies_server_copy_offline() {
    let sb = sandbox();
    seed_conflict(&sb);

    let report = json_out(tether(&sb).args(["conflicts", "resolve", "m1", "-o", "json"]));
    assert_eq!(report["resolved"], true);
    assert_eq!(report["strategy"], "timestamp_wins");

    let page = json_out(tether(&sb).args(["list", "chat", "-o", "json"]));
    assert_eq!(page[0]["content"], "theirs");
    tether(&sb)
        .args(["conflicts", "list"])
        .assert()
        .stdout(predicate::str::contains("No conflicts"));
}

#[test]
fn manual_strategy_defers() {
    let sb = sandbox();
    seed_conflict(&sb);
    tether(&sb)
        .args(["conflicts", "resolve", "m1", "--strategy", "manual"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Left m1 for manual resolution"));
    let status = json_out(tether(&sb).args(["status", "-o", "json"]));
    assert_eq!(status["conflicts"]["pendingCount"], 1);
}

#[test]
fn pushing_resolution_refused_offline() {
    let sb = sandbox();
    seed_conflict(&sb);
    tether(&sb)
        .args(["conflicts", "resolve", "m1", "--strategy", "client_wins"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("while offline"));
}

#[test]
fn unknown_conflict_hints_at_list() {
    let sb = sandbox();
    tether(&sb)
        .args(["conflicts", "resolve", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("conflict not found: ghost"))
        .stderr(predicate::str::contains("tether conflicts list"));
}

#[test]
fn detect_needs_network() {
    let sb = sandbox();
    tether(&sb)
        .args(["conflicts", "detect", "-m", "m1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot detect conflicts while offline"));
}
