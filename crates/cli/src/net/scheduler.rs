// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Prioritized, bounded-concurrency request scheduler.
//!
//! Every outbound call goes through [`Scheduler::request`]. Tasks are kept
//! sorted by `(priority, enqueue order)`. A scheduling pass first sends HIGH
//! tasks from the head of the queue one at a time, then takes up to
//! `max_concurrent` tasks as one batch and runs them together; a failure in
//! the batch does not affect its siblings. Passes repeat until the queue is
//! empty or the network goes offline.
//!
//! Failed calls wait a fixed `retry_delay` and rejoin the tail of the queue
//! until `retry_count` retries are spent.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures_util::future::join_all;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tether_core::{Clock, SystemClock};
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::status::{NetworkMonitor, NetworkStatus};
use super::task::{HttpRequest, Priority, RequestConfig, RequestTask, TaskEvent, TaskStatus};
use super::transport::{Transport, TransportError, TransportResult};
use crate::error::{Error, Result};

/// Scheduler limits and per-request defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerConfig {
    /// Most requests in flight at once, whatever their priority.
    pub max_concurrent: usize,
    pub timeout: Duration,
    pub retry_count: u32,
    pub retry_delay: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            max_concurrent: 3,
            timeout: Duration::from_millis(30_000),
            retry_count: 3,
            retry_delay: Duration::from_millis(1_000),
        }
    }
}

/// Queue depth snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueStatus {
    pub pending: usize,
    pub processing: usize,
}

/// Read-only view of a queued task.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedTask {
    pub id: String,
    pub method: String,
    pub url: String,
    pub priority: Priority,
    pub timestamp: i64,
    pub retries: u32,
    pub batch_key: Option<String>,
}

/// Awaitable result of a submitted request.
pub struct RequestHandle {
    id: String,
    rx: oneshot::Receiver<TransportResult<Value>>,
}

impl RequestHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Wait for the task to complete or exhaust its retries.
    pub async fn wait(self) -> Result<Value> {
        match self.rx.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(Error::Transport(e)),
            Err(_) => Err(Error::Cancelled),
        }
    }
}

#[derive(Default)]
struct State {
    /// Sorted by `(priority, seq)`.
    queue: Vec<RequestTask>,
    processing: HashSet<String>,
    /// A pass is running; new submissions piggyback on it.
    running: bool,
    /// Bumped by `clear_queue` so in-flight retries are not re-enqueued.
    epoch: u64,
}

impl State {
    fn insert(&mut self, task: RequestTask) {
        let key = task.order_key();
        let pos = self.queue.partition_point(|t| t.order_key() <= key);
        self.queue.insert(pos, task);
    }
}

struct Inner {
    transport: Arc<dyn Transport>,
    network: NetworkMonitor,
    config: SchedulerConfig,
    state: Mutex<State>,
    events: broadcast::Sender<TaskEvent>,
    next_seq: AtomicU64,
}

/// Cheaply cloneable handle to a shared request queue.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

impl Scheduler {
    pub fn new(
        transport: Arc<dyn Transport>,
        network: NetworkMonitor,
        mut config: SchedulerConfig,
    ) -> Self {
        config.max_concurrent = config.max_concurrent.max(1);
        let (events, _) = broadcast::channel(256);
        Scheduler {
            inner: Arc::new(Inner {
                transport,
                network,
                config,
                state: Mutex::new(State::default()),
                events,
                next_seq: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.inner.config
    }

    pub fn network(&self) -> &NetworkMonitor {
        &self.inner.network
    }

    /// Enqueue a request and start a pass if none is running.
    pub fn submit(&self, config: RequestConfig) -> RequestHandle {
        let inner = &self.inner;
        let (tx, rx) = oneshot::channel();
        let id = uuid::Uuid::new_v4().to_string();
        let task = RequestTask {
            id: id.clone(),
            seq: inner.next_seq.fetch_add(1, Ordering::SeqCst),
            request: HttpRequest {
                method: config.method,
                url: config.url,
                headers: config.headers,
                body: config.data,
                timeout: config.timeout.unwrap_or(inner.config.timeout),
            },
            priority: config.priority,
            retry_count: config.retry_count.unwrap_or(inner.config.retry_count),
            retry_delay: config.retry_delay.unwrap_or(inner.config.retry_delay),
            batch_key: config.batch_key,
            status: TaskStatus::Pending,
            timestamp: SystemClock.now_ms(),
            retries: 0,
            error: None,
            epoch: 0,
            responder: Some(tx),
        };
        tracing::debug!(
            task_id = %task.id,
            method = %task.request.method,
            url = %task.request.url,
            priority = %task.priority,
            "request queued"
        );
        let event = task.event();
        inner.lock().insert(task);
        inner.publish(event);
        self.resume();
        RequestHandle { id, rx }
    }

    /// Enqueue a request and wait for its result.
    pub async fn request(&self, config: RequestConfig) -> Result<Value> {
        self.submit(config).wait().await
    }

    /// Like [`request`](Self::request), decoding the response body.
    pub async fn request_as<T: DeserializeOwned>(&self, config: RequestConfig) -> Result<T> {
        let value = self.request(config).await?;
        serde_json::from_value(value)
            .map_err(|e| Error::Transport(TransportError::Decode(e.to_string())))
    }

    /// Start a pass if there is queued work, the network is up, and no pass
    /// is already running.
    pub fn resume(&self) {
        if !self.inner.network.is_online() {
            return;
        }
        {
            let mut state = self.inner.lock();
            if state.running || state.queue.is_empty() {
                return;
            }
            state.running = true;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let inner = Arc::clone(&self.inner);
                handle.spawn(inner.drive());
            }
            Err(_) => {
                tracing::warn!("no async runtime; queued requests will wait");
                self.inner.lock().running = false;
            }
        }
    }

    /// Resume dispatching whenever the network comes back online.
    pub fn spawn_network_watcher(&self, cancel: CancellationToken) -> JoinHandle<()> {
        let scheduler = self.clone();
        let mut rx = self.inner.network.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let status = *rx.borrow_and_update();
                        if status == NetworkStatus::Online {
                            scheduler.resume();
                        }
                    }
                }
            }
        })
    }

    pub fn queue_status(&self) -> QueueStatus {
        let state = self.inner.lock();
        QueueStatus { pending: state.queue.len(), processing: state.processing.len() }
    }

    pub fn pending_tasks(&self) -> Vec<QueuedTask> {
        self.inner
            .lock()
            .queue
            .iter()
            .map(|t| QueuedTask {
                id: t.id.clone(),
                method: t.request.method.to_string(),
                url: t.request.url.clone(),
                priority: t.priority,
                timestamp: t.timestamp,
                retries: t.retries,
                batch_key: t.batch_key.clone(),
            })
            .collect()
    }

    /// Drop every queued task and forget in-flight bookkeeping. Callers of
    /// dropped tasks get [`Error::Cancelled`]. Calls already issued still
    /// finish, but are not retried. Returns the number of tasks dropped.
    pub fn clear_queue(&self) -> usize {
        let mut state = self.inner.lock();
        let dropped = state.queue.len();
        state.queue.clear();
        state.processing.clear();
        state.epoch += 1;
        tracing::info!(dropped, "request queue cleared");
        dropped
    }

    /// Observe every task state change.
    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.inner.events.subscribe()
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, event: TaskEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn dispatch(&self, state: &mut State, index: usize) -> RequestTask {
        let mut task = state.queue.remove(index);
        task.status = TaskStatus::Processing;
        task.epoch = state.epoch;
        state.processing.insert(task.id.clone());
        task
    }

    /// Head of the queue, if it is HIGH and a slot is free.
    fn take_high(&self) -> Option<RequestTask> {
        let mut state = self.lock();
        if !self.network.is_online() || state.processing.len() >= self.config.max_concurrent {
            return None;
        }
        match state.queue.first() {
            Some(task) if task.priority == Priority::High => Some(self.dispatch(&mut state, 0)),
            _ => None,
        }
    }

    /// Up to the free slot count of tasks from the head of the queue.
    fn take_batch(&self) -> Vec<RequestTask> {
        let mut state = self.lock();
        if !self.network.is_online() {
            return Vec::new();
        }
        let slots = self.config.max_concurrent.saturating_sub(state.processing.len());
        let n = slots.min(state.queue.len());
        (0..n).map(|_| self.dispatch(&mut state, 0)).collect()
    }

    /// Decide under the lock whether the pass is over, so a concurrent
    /// submit either sees `running == false` or its task is picked up.
    fn finish_pass(&self) -> bool {
        let mut state = self.lock();
        if state.queue.is_empty() || !self.network.is_online() {
            state.running = false;
            return true;
        }
        false
    }

    async fn drive(self: Arc<Self>) {
        loop {
            while let Some(task) = self.take_high() {
                self.run(task).await;
            }
            let batch = self.take_batch();
            if batch.is_empty() {
                if self.finish_pass() {
                    return;
                }
                tokio::task::yield_now().await;
                continue;
            }
            tracing::debug!(size = batch.len(), "dispatching batch");
            join_all(batch.into_iter().map(|task| self.run(task))).await;
        }
    }

    async fn run(&self, mut task: RequestTask) {
        self.publish(task.event());
        let timeout = task.request.timeout;
        let outcome = match tokio::time::timeout(timeout, self.transport.execute(task.request.clone())).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(timeout.as_millis() as u64)),
        };

        let err = match outcome {
            Ok(value) => {
                self.lock().processing.remove(&task.id);
                task.status = TaskStatus::Completed;
                self.publish(task.event());
                tracing::debug!(task_id = %task.id, url = %task.request.url, "request completed");
                if let Some(tx) = task.responder.take() {
                    let _ = tx.send(Ok(value));
                }
                return;
            }
            Err(err) => err,
        };

        task.error = Some(err.to_string());
        if task.retries < task.retry_count {
            task.retries += 1;
            task.status = TaskStatus::Pending;
            self.publish(task.event());
            tracing::warn!(
                task_id = %task.id,
                url = %task.request.url,
                retries = task.retries,
                error = %err,
                "request failed, will retry"
            );
            tokio::time::sleep(task.retry_delay).await;

            let mut state = self.lock();
            state.processing.remove(&task.id);
            if state.epoch == task.epoch {
                task.seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
                state.insert(task);
                return;
            }
            tracing::debug!(task_id = %task.id, "queue cleared during retry delay");
        } else {
            self.lock().processing.remove(&task.id);
        }

        task.status = TaskStatus::Failed;
        self.publish(task.event());
        tracing::warn!(
            task_id = %task.id,
            url = %task.request.url,
            attempts = task.retries + 1,
            error = %err,
            "request failed"
        );
        if let Some(tx) = task.responder.take() {
            let _ = tx.send(Err(err));
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
