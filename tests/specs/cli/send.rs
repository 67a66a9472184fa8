// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Specs for `tether send`, `pending`, `list`, `retry`, and `status`.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use yare::parameterized;

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

fn send(sb: &Sandbox, feature: &str, content: &str) -> String {
    let output = tether(sb)
        .args(["send", feature, content, "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let msg: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    msg["id"].as_str().unwrap().to_string()
}

#[test]
fn send_offline_queues_message() {
    let sb = sandbox();
    tether(&sb)
        .args(["send", "chat", "hello there"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Queued "));

    tether(&sb)
        .arg("pending")
        .assert()
        .success()
        .stdout(predicate::str::contains("[pending]").and(predicate::str::contains("hello there")));
}

#[test]
fn send_json_reports_message() {
    let sb = sandbox();
    let output = tether(&sb)
        .args(["send", "note", "jot", "--type", "file", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let msg: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(msg["featureId"], "note");
    assert_eq!(msg["type"], "file");
    assert_eq!(msg["status"], "pending");
    assert_eq!(msg["synced"], false);
}

#[parameterized(
    blank = { &["send", "chat", "   "], "cannot be empty" },
    bad_type = { &["send", "chat", "x", "--type", "gif"], "invalid" },
)]
fn send_rejects_bad_input(args: &[&str], message: &str) {
    let sb = sandbox();
    tether(&sb).args(args).assert().failure().stderr(predicate::str::contains(message));
}

#[test]
fn queued_messages_survive_restart() {
    let sb = sandbox();
    send(&sb, "chat", "one");
    send(&sb, "chat", "two");

    let output = tether(&sb).args(["status", "-o", "json"]).output().unwrap();
    assert!(output.status.success());
    let status: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(status["network"], "offline");
    assert_eq!(status["storeAvailable"], true);
    assert_eq!(status["offlineQueue"]["count"], 2);
    assert_eq!(status["messages"]["pending"], 2);
}

#[test]
fn list_pages_a_feature() {
    let sb = sandbox();
    for i in 0..3 {
        send(&sb, "chat", &format!("msg {i}"));
    }
    send(&sb, "note", "elsewhere");

    let output = tether(&sb).args(["list", "chat", "-o", "json"]).output().unwrap();
    let page: Vec<serde_json::Value> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(page.len(), 3);
    assert!(page.iter().all(|m| m["featureId"] == "chat"));

    let output = tether(&sb).args(["list", "chat", "-n", "2", "-o", "json"]).output().unwrap();
    let page: Vec<serde_json::Value> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(page.len(), 2);

    tether(&sb)
        .args(["list", "video"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No messages"));
}

#[test]
fn retry_requires_failed_message() {
    let sb = sandbox();
    let id = send(&sb, "chat", "hello");
    tether(&sb)
        .args(["retry", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("only failed messages can be retried"));

    tether(&sb)
        .args(["retry", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("message not found: ghost"));
}

#[test]
fn sync_needs_network() {
    let sb = sandbox();
    send(&sb, "chat", "hello");
    tether(&sb)
        .arg("sync")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot sync while offline"));
}

#[test]
fn invalid_config_is_reported() {
    let sb = sandbox();
    std::fs::write(&sb.config, "[scheduler]\nmax_concurrent = 0\n").unwrap();
    tether(&sb)
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("config error"));
}
