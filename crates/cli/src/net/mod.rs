// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Outbound networking: request descriptions, the HTTP transport, network
//! status, and the prioritized scheduler every call goes through.

mod scheduler;
mod status;
mod task;
mod transport;

pub use scheduler::{QueueStatus, QueuedTask, RequestHandle, Scheduler, SchedulerConfig};
pub use status::{NetworkMonitor, NetworkStatus};
pub use task::{HttpRequest, Method, Priority, RequestConfig, TaskEvent, TaskStatus};
pub use transport::{
    HttpTransport, Transport, TransportError, TransportFuture, TransportResult,
};
