// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::api;
use crate::cache::MessageDraft;
use crate::net::Method;
use crate::test_helpers::MockTransport;
use serde_json::json;
use std::time::Duration;
use tempfile::TempDir;
use tether_core::{ManualClock, MessageStatus};

fn context(temp: &TempDir, transport: Arc<MockTransport>, initial: NetworkStatus) -> AppContext {
    let mut config = Config::default();
    config.store.path = Some(temp.path().join("tether.db"));
    let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(1_700_000_000_000));
    AppContext::build(config, transport, clock, initial)
}

#[tokio::test]
async fn build_wires_a_persistent_store() {
    let temp = TempDir::new().unwrap();
    let ctx = context(&temp, MockTransport::new(), NetworkStatus::Offline);
    assert!(ctx.store.is_available());
    ctx.cache.add_message(MessageDraft::new("chat", "hi"), false).await.unwrap();
    ctx.shutdown().await;

    let ctx = context(&temp, MockTransport::new(), NetworkStatus::Offline);
    assert_eq!(ctx.cache.offline_queue_status().count, 1);
}

#[tokio::test]
async fn reconnect_flushes_queue_after_start() {
    let temp = TempDir::new().unwrap();
    let transport = MockTransport::new();
    let mut ctx = context(&temp, transport.clone(), NetworkStatus::Offline);
    let msg = ctx.cache.add_message(MessageDraft::new("chat", "later"), false).await.unwrap();
    transport.respond(Method::Post, api::MESSAGES_SYNC, json!({"success": [msg.id.clone()]}));

    ctx.start();
    assert!(ctx.is_running());
    ctx.network.set(NetworkStatus::Online);

    let mut sent = false;
    for _ in 0..100 {
        if ctx.store.get_message(&msg.id).unwrap().unwrap().status == MessageStatus::Sent {
            sent = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(sent);
    ctx.shutdown().await;
}

#[tokio::test]
async fn start_twice_spawns_once() {
    let temp = TempDir::new().unwrap();
    let mut ctx = context(&temp, MockTransport::new(), NetworkStatus::Online);
    ctx.start();
    ctx.start();
    assert_eq!(ctx.tasks.len(), 2);
    ctx.shutdown().await;
}
