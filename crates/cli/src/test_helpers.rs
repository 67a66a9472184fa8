// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for unit tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use tether_core::{Clock, ManualClock};

use crate::net::{
    HttpRequest, Method, NetworkMonitor, NetworkStatus, Scheduler, SchedulerConfig, Transport,
    TransportError, TransportFuture,
};
use crate::store::LocalStore;

#[derive(Clone)]
enum Reply {
    Json(Value),
    Fail(TransportError),
}

#[derive(Default)]
struct Route {
    /// Consumed first, one per call.
    once: VecDeque<Reply>,
    /// Used once `once` is empty.
    sticky: Option<Reply>,
}

/// Mock transport for testing without a server.
///
/// Replies are scripted per `(method, url)`. Unscripted calls answer `null`.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<(Method, String), Route>>,
    calls: Mutex<Vec<HttpRequest>>,
    delay: Mutex<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn route<F: FnOnce(&mut Route)>(&self, method: Method, url: &str, f: F) {
        let mut routes = self.routes.lock().unwrap();
        f(routes.entry((method, url.to_string())).or_default());
    }

    /// Always answer this route with `value`.
    pub fn respond(&self, method: Method, url: &str, value: Value) {
        self.route(method, url, |r| r.sticky = Some(Reply::Json(value)));
    }

    /// Answer the next call to this route with `value`.
    pub fn respond_once(&self, method: Method, url: &str, value: Value) {
        self.route(method, url, |r| r.once.push_back(Reply::Json(value)));
    }

    /// Always fail this route with an HTTP status.
    pub fn fail(&self, method: Method, url: &str, status: u16) {
        let err = TransportError::Status { status, body: String::new() };
        self.route(method, url, |r| r.sticky = Some(Reply::Fail(err)));
    }

    /// Fail the next call to this route with an HTTP status.
    pub fn fail_once(&self, method: Method, url: &str, status: u16) {
        let err = TransportError::Status { status, body: String::new() };
        self.route(method, url, |r| r.once.push_back(Reply::Fail(err)));
    }

    /// Hold every call for `delay` before answering.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn calls(&self) -> Vec<HttpRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, method: Method, url: &str) -> Vec<HttpRequest> {
        self.calls().into_iter().filter(|c| c.method == method && c.url == url).collect()
    }

    pub fn call_urls(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.url).collect()
    }

    /// Most calls that were ever running at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_reply(&self, method: Method, url: &str) -> Reply {
        let mut routes = self.routes.lock().unwrap();
        match routes.get_mut(&(method, url.to_string())) {
            Some(route) => route
                .once
                .pop_front()
                .or_else(|| route.sticky.clone())
                .unwrap_or(Reply::Json(Value::Null)),
            None => Reply::Json(Value::Null),
        }
    }
}

impl Transport for MockTransport {
    fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
        self.calls.lock().unwrap().push(request.clone());
        let reply = self.next_reply(request.method, &request.url);
        let delay = *self.delay.lock().unwrap();
        Box::pin(async move {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            match reply {
                Reply::Json(value) => Ok(value),
                Reply::Fail(err) => Err(err),
            }
        })
    }
}

/// Scheduler settings with no retry delay so failing tests finish fast.
pub fn fast_config() -> SchedulerConfig {
    SchedulerConfig {
        max_concurrent: 3,
        timeout: Duration::from_secs(5),
        retry_count: 0,
        retry_delay: Duration::from_millis(1),
    }
}

/// Fixture wiring a mock transport, online network, manual clock, and an
/// in-memory store.
pub struct Harness {
    pub transport: Arc<MockTransport>,
    pub network: NetworkMonitor,
    pub clock: Arc<ManualClock>,
    pub scheduler: Scheduler,
    pub store: Arc<LocalStore>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(fast_config())
    }

    pub fn with_config(config: SchedulerConfig) -> Self {
        let transport = MockTransport::new();
        let network = NetworkMonitor::new(NetworkStatus::Online);
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let dyn_clock: Arc<dyn Clock> = clock.clone();
        let scheduler = Scheduler::new(transport.clone(), network.clone(), config);
        let store = Arc::new(LocalStore::in_memory(scheduler.clone(), dyn_clock));
        Harness { transport, network, clock, scheduler, store }
    }

    pub fn dyn_clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }
}
