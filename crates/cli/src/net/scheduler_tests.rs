// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::net::Method;
use crate::test_helpers::{fast_config, MockTransport};
use serde_json::json;

fn scheduler(transport: &Arc<MockTransport>, config: SchedulerConfig) -> Scheduler {
    Scheduler::new(transport.clone(), NetworkMonitor::new(NetworkStatus::Online), config)
}

#[tokio::test]
async fn dispatches_by_priority_then_fifo() {
    let transport = MockTransport::new();
    let sched = scheduler(&transport, fast_config());

    let low = sched.submit(RequestConfig::get("/low").priority(Priority::Low));
    let high = sched.submit(RequestConfig::get("/high").priority(Priority::High));
    let med1 = sched.submit(RequestConfig::get("/med1"));
    let med2 = sched.submit(RequestConfig::get("/med2"));

    for handle in [low, high, med1, med2] {
        handle.wait().await.unwrap();
    }
    assert_eq!(transport.call_urls(), ["/high", "/med1", "/med2", "/low"]);
}

#[tokio::test]
async fn returns_response_body() {
    let transport = MockTransport::new();
    transport.respond(Method::Get, "/api/features", json!([{"id": "chat"}]));
    let sched = scheduler(&transport, fast_config());

    let value = sched.request(RequestConfig::get("/api/features")).await.unwrap();
    assert_eq!(value, json!([{"id": "chat"}]));
}

#[tokio::test]
async fn request_as_decodes_body() {
    #[derive(serde::Deserialize)]
    struct Ack {
        ok: bool,
    }
    let transport = MockTransport::new();
    transport.respond(Method::Post, "/ack", json!({"ok": true}));
    let sched = scheduler(&transport, fast_config());

    let ack: Ack = sched.request_as(RequestConfig::post("/ack", json!({}))).await.unwrap();
    assert!(ack.ok);
}

#[tokio::test]
async fn retries_then_fails_with_full_event_sequence() {
    let transport = MockTransport::new();
    transport.fail(Method::Get, "/flaky", 500);
    let sched = scheduler(&transport, SchedulerConfig { retry_count: 2, ..fast_config() });
    let mut events = sched.subscribe();

    let err = sched.request(RequestConfig::get("/flaky")).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Transport(TransportError::Status { status: 500, .. })
    ));
    assert_eq!(transport.calls_to(Method::Get, "/flaky").len(), 3);

    let mut statuses = Vec::new();
    while let Ok(event) = events.try_recv() {
        statuses.push(event.status);
    }
    use TaskStatus::*;
    assert_eq!(
        statuses,
        [Pending, Processing, Pending, Processing, Pending, Processing, Failed]
    );
}

#[tokio::test]
async fn retry_recovers_after_transient_failure() {
    let transport = MockTransport::new();
    transport.fail_once(Method::Put, "/api/messages/m1", 503);
    transport.respond(Method::Put, "/api/messages/m1", json!({"id": "m1"}));
    let sched = scheduler(&transport, fast_config());

    let value = sched
        .request(RequestConfig::put("/api/messages/m1", json!({})).retry_count(1))
        .await
        .unwrap();
    assert_eq!(value["id"], "m1");
    assert_eq!(transport.calls().len(), 2);
}

#[tokio::test]
async fn failed_sibling_does_not_affect_batch() {
    let transport = MockTransport::new();
    transport.fail(Method::Get, "/bad", 404);
    let sched = scheduler(&transport, fast_config());

    let a = sched.submit(RequestConfig::get("/a"));
    let bad = sched.submit(RequestConfig::get("/bad"));
    let b = sched.submit(RequestConfig::get("/b"));

    assert!(a.wait().await.is_ok());
    assert!(bad.wait().await.is_err());
    assert!(b.wait().await.is_ok());
}

#[tokio::test]
async fn respects_concurrency_cap() {
    let transport = MockTransport::new();
    transport.set_delay(Duration::from_millis(20));
    let sched = scheduler(&transport, SchedulerConfig { max_concurrent: 2, ..fast_config() });

    let handles: Vec<_> =
        (0..5).map(|i| sched.submit(RequestConfig::get(format!("/item/{i}")))).collect();
    for handle in handles {
        handle.wait().await.unwrap();
    }
    assert_eq!(transport.calls().len(), 5);
    assert_eq!(transport.max_in_flight(), 2);
}

#[tokio::test]
async fn high_priority_runs_one_at_a_time() {
    let transport = MockTransport::new();
    transport.set_delay(Duration::from_millis(10));
    let sched = scheduler(&transport, fast_config());

    let handles: Vec<_> = (0..3)
        .map(|i| sched.submit(RequestConfig::get(format!("/urgent/{i}")).priority(Priority::High)))
        .collect();
    for handle in handles {
        handle.wait().await.unwrap();
    }
    assert_eq!(transport.max_in_flight(), 1);
}

#[tokio::test]
async fn times_out_slow_requests() {
    let transport = MockTransport::new();
    transport.set_delay(Duration::from_millis(500));
    let sched = scheduler(&transport, fast_config());

    let err = sched
        .request(RequestConfig::get("/slow").timeout(Duration::from_millis(20)))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Transport(TransportError::Timeout(20))));
}

#[tokio::test]
async fn holds_queue_while_offline_and_resumes_online() {
    let transport = MockTransport::new();
    let network = NetworkMonitor::new(NetworkStatus::Offline);
    let sched = Scheduler::new(transport.clone(), network.clone(), fast_config());
    let cancel = CancellationToken::new();
    let watcher = sched.spawn_network_watcher(cancel.clone());

    let handle = sched.submit(RequestConfig::get("/later"));
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(transport.calls().is_empty());
    assert_eq!(sched.queue_status(), QueueStatus { pending: 1, processing: 0 });

    network.set(NetworkStatus::Online);
    handle.wait().await.unwrap();
    assert_eq!(transport.call_urls(), ["/later"]);
    assert_eq!(sched.queue_status(), QueueStatus { pending: 0, processing: 0 });

    cancel.cancel();
    watcher.await.unwrap();
}

#[tokio::test]
async fn clear_queue_cancels_waiters() {
    let transport = MockTransport::new();
    let network = NetworkMonitor::new(NetworkStatus::Offline);
    let sched = Scheduler::new(transport.clone(), network, fast_config());

    let a = sched.submit(RequestConfig::get("/a"));
    let b = sched.submit(RequestConfig::get("/b"));
    assert_eq!(sched.clear_queue(), 2);

    assert!(matches!(a.wait().await, Err(Error::Cancelled)));
    assert!(matches!(b.wait().await, Err(Error::Cancelled)));
    assert_eq!(sched.queue_status().pending, 0);
}

#[tokio::test]
async fn pending_tasks_lists_queue_in_dispatch_order() {
    let transport = MockTransport::new();
    let network = NetworkMonitor::new(NetworkStatus::Offline);
    let sched = Scheduler::new(transport, network, fast_config());

    let _low = sched.submit(RequestConfig::get("/sync").priority(Priority::Low));
    let _high = sched
        .submit(RequestConfig::post("/api/features/chat/message", json!({})).priority(Priority::High).batch_key("feature_message_chat"));

    let tasks = sched.pending_tasks();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].priority, Priority::High);
    assert_eq!(tasks[0].method, "POST");
    assert_eq!(tasks[0].batch_key.as_deref(), Some("feature_message_chat"));
    assert_eq!(tasks[1].url, "/sync");
}

#[tokio::test]
async fn request_defaults_come_from_config() {
    let transport = MockTransport::new();
    let sched = scheduler(
        &transport,
        SchedulerConfig { timeout: Duration::from_millis(1234), ..fast_config() },
    );
    sched.request(RequestConfig::get("/x")).await.unwrap();
    assert_eq!(transport.calls()[0].timeout, Duration::from_millis(1234));
}

#[tokio::test]
async fn zero_concurrency_still_dispatches() {
    let transport = MockTransport::new();
    let sched = scheduler(&transport, SchedulerConfig { max_concurrent: 0, ..fast_config() });
    assert_eq!(sched.config().max_concurrent, 1);

    let result =
        tokio::time::timeout(Duration::from_secs(1), sched.request(RequestConfig::get("/one"))).await;
    assert!(result.unwrap().is_ok());
}
