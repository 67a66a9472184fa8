// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use std::io::Cursor;

#[test]
fn partial_backup_parses() {
    let json = r#"{"messages":[{"id":"m1","featureId":"chat","content":"hi","timestamp":10}]}"#;
    let snap = Snapshot::read_from(Cursor::new(json)).unwrap();
    assert_eq!(snap.messages.len(), 1);
    assert!(snap.conversations.is_empty());
    assert_eq!(snap.record_count(), 1);
    assert!(!snap.is_empty());
}

#[test]
fn writes_camel_case_keys() {
    let mut snap = Snapshot::default();
    assert!(snap.is_empty());
    snap.feature_access.push(FeatureAccess {
        feature_id: "note".into(),
        feature_name: "Notes".into(),
        last_access: 1,
        access_count: 2,
    });
    let mut buf = Vec::new();
    snap.write_to(&mut buf).unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert!(text.contains("\"featureAccess\""));
    assert!(text.contains("\"accessCount\": 2"));
}
