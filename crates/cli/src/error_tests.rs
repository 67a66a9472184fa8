// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;

#[test]
fn core_errors_pass_through_unchanged() {
    let err: Error = tether_core::Error::MessageNotFound("m-1".into()).into();
    assert_eq!(err.to_string(), "message not found: m-1");
}

#[test]
fn transport_status_mentions_http_code() {
    let err: Error = TransportError::Status { status: 503, body: String::new() }.into();
    assert!(err.to_string().contains("HTTP error! status: 503"));
}

#[test]
fn conflict_not_found_names_id_and_hints() {
    let msg = Error::ConflictNotFound("m-7".into()).to_string();
    assert!(msg.contains("conflict not found: m-7"));
    assert!(msg.contains("tether conflicts list"));
}

#[test]
fn not_retryable_names_status() {
    let err = Error::NotRetryable { id: "m-1".into(), status: "sent".into() };
    assert!(err.to_string().contains("status is sent"));
}

#[test]
fn offline_names_the_action() {
    let msg = Error::Offline("detect conflicts").to_string();
    assert!(msg.starts_with("cannot detect conflicts while offline"));
    assert!(msg.contains("--offline"));
}
