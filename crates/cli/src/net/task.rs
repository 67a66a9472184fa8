// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Request descriptions and the bookkeeping the scheduler keeps per call.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use tokio::sync::oneshot;

use super::transport::TransportResult;

/// Scheduling band. Lower sorts first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High = 0,
    #[default]
    Medium = 1,
    Low = 2,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// HTTP verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One outbound call as handed to the scheduler.
///
/// Unset timeout and retry fields take the scheduler's defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestConfig {
    pub url: String,
    pub method: Method,
    pub data: Option<Value>,
    pub headers: BTreeMap<String, String>,
    pub priority: Priority,
    pub timeout: Option<Duration>,
    pub retry_count: Option<u32>,
    pub retry_delay: Option<Duration>,
    /// Groups related requests; carried through for the transport.
    pub batch_key: Option<String>,
}

impl RequestConfig {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        RequestConfig {
            url: url.into(),
            method,
            data: None,
            headers: BTreeMap::new(),
            priority: Priority::default(),
            timeout: None,
            retry_count: None,
            retry_delay: None,
            batch_key: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>, data: Value) -> Self {
        Self::new(Method::Post, url).json(data)
    }

    pub fn put(url: impl Into<String>, data: Value) -> Self {
        Self::new(Method::Put, url).json(data)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::Delete, url)
    }

    pub fn json(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn retry_count(mut self, count: u32) -> Self {
        self.retry_count = Some(count);
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = Some(delay);
        self
    }

    pub fn batch_key(mut self, key: impl Into<String>) -> Self {
        self.batch_key = Some(key.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// What the transport actually executes.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
    pub timeout: Duration,
}

/// Lifecycle of a request task.
///
/// `pending -> processing -> {completed | pending (retry) | failed}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

/// Published on every task state change.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskEvent {
    pub task_id: String,
    pub url: String,
    pub priority: Priority,
    pub status: TaskStatus,
    pub retries: u32,
    pub error: Option<String>,
}

pub(crate) type Responder = oneshot::Sender<TransportResult<Value>>;

/// A queued call. Lives until its responder is used or dropped.
pub(crate) struct RequestTask {
    pub id: String,
    /// Enqueue order; reassigned on retry so the task rejoins at the tail.
    pub seq: u64,
    pub request: HttpRequest,
    pub priority: Priority,
    pub retry_count: u32,
    pub retry_delay: Duration,
    pub batch_key: Option<String>,
    pub status: TaskStatus,
    /// Creation time in epoch milliseconds.
    pub timestamp: i64,
    pub retries: u32,
    pub error: Option<String>,
    /// Queue epoch at dispatch; a stale epoch means the queue was cleared.
    pub epoch: u64,
    pub responder: Option<Responder>,
}

impl RequestTask {
    /// Sort key: priority band, then FIFO.
    pub fn order_key(&self) -> (Priority, u64) {
        (self.priority, self.seq)
    }

    pub fn event(&self) -> TaskEvent {
        TaskEvent {
            task_id: self.id.clone(),
            url: self.request.url.clone(),
            priority: self.priority,
            status: self.status,
            retries: self.retries,
            error: self.error.clone(),
        }
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
