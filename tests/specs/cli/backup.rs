// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Specs for `tether export`, `import`, `cleanup`, `conversations`, and `features`.

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

fn json_out(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).unwrap()
}

fn write_backup(sb: &Sandbox, value: serde_json::Value) -> PathBuf {
    let path = sb.temp.path().join("backup.json");
    std::fs::write(&path, value.to_string()).unwrap();
    path
}

fn message(id: &str, conversation: Option<&str>, timestamp: i64) -> serde_json::Value {
    let mut m = json!({
        "id": id, "featureId": "chat", "content": format!("body {id}"), "type": "text",
        "source": "mobile", "status": "sent", "timestamp": timestamp, "synced": true
    });
    if let Some(c) = conversation {
        m["conversationId"] = json!(c);
    }
    m
}

#[test]
fn export_then_import_into_fresh_store() {
    let first = sandbox();
    tether(&first).args(["send", "chat", "keep me"]).assert().success();
    tether(&first).args(["conflicts", "strategy", "keep_both"]).assert().success();
    let path = first.temp.path().join("out.json");
    let report = json_out(tether(&first).arg("export").arg(&path).args(["-o", "json"]));
    assert!(report["records"].as_u64().unwrap() >= 2);

    let second = sandbox();
    tether(&second)
        .arg("import")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("(1 queued)"));
    let pending = json_out(tether(&second).args(["pending", "-o", "json"]));
    assert_eq!(pending[0]["content"], "keep me");
    tether(&second).args(["conflicts", "strategy"]).assert().stdout("keep_both\n");
}

#[test]
fn import_replace_clears_first() {
    let sb = sandbox();
    tether(&sb).args(["send", "chat", "old local"]).assert().success();
    let path = write_backup(&sb, json!({ "messages": [message("m1", None, 1_700_000_000_000)] }));

    tether(&sb).arg("import").arg(&path).arg("--replace").assert().success();
    let page = json_out(tether(&sb).args(["list", "chat", "-o", "json"]));
    assert_eq!(page.as_array().unwrap().len(), 1);
    assert_eq!(page[0]["id"], "m1");
}

#[test]
fn import_missing_file_fails() {
    let sb = sandbox();
    tether(&sb)
        .args(["import", "nope.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot open"));
}

#[test]
fn cleanup_removes_expired_messages() {
    let sb = sandbox();
    let path = write_backup(&sb, json!({ "messages": [message("ancient", None, 1_000)] }));
    tether(&sb).arg("import").arg(&path).assert().success();
    tether(&sb).args(["send", "chat", "fresh"]).assert().success();

    let report = json_out(tether(&sb).args(["cleanup", "-o", "json"]));
    assert_eq!(report["removed"], 1);
    assert_eq!(report["days"], 30);
    let page = json_out(tether(&sb).args(["list", "chat", "-o", "json"]));
    assert_eq!(page.as_array().unwrap().len(), 1);
}

#[test]
fn conversations_show_and_delete() {
    let sb = sandbox();
    let path = write_backup(
        &sb,
        json!({
            "messages": [message("m1", Some("c1"), 1_700_000_000_000), message("m2", None, 1_700_000_000_001)],
            "conversations": [{
                "id": "c1", "title": "Plans", "timestamp": 1_700_000_000_000_i64, "featureId": "chat"
            }]
        }),
    );
    tether(&sb).arg("import").arg(&path).assert().success();

    tether(&sb)
        .args(["conversations", "list", "chat"])
        .assert()
        .success()
        .stdout(predicate::str::contains("c1").and(predicate::str::contains("Plans")));
    tether(&sb)
        .args(["conversations", "show", "c1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Feature: chat"));

    let report = json_out(tether(&sb).args(["conversations", "delete", "c1", "-o", "json"]));
    assert_eq!(report["messagesRemoved"], 1);
    tether(&sb)
        .args(["conversations", "show", "c1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("c1"));
}

#[test]
fn features_fall_back_to_defaults_offline() {
    let sb = sandbox();
    let features = json_out(tether(&sb).args(["features", "list", "-o", "json"]));
    let ids: Vec<&str> = features.as_array().unwrap().iter().map(|f| f["id"].as_str().unwrap()).collect();
    assert_eq!(ids, ["note", "chat", "llm"]);

    tether(&sb).args(["features", "open", "chat"]).assert().success();
    tether(&sb)
        .args(["features", "recent"])
        .assert()
        .success()
        .stdout(predicate::str::contains("chat  Chat  opened 1x"));
    tether(&sb)
        .args(["features", "open", "video"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("feature not found: video"));
}

#[test]
fn completion_script_is_generated() {
    let sb = sandbox();
    tether(&sb)
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tether"));
}
