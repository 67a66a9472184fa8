// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use crate::net::TransportError;

/// All possible errors that can occur in the tether library.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] tether_core::Error),

    #[error("request failed: {0}")]
    Transport(#[from] TransportError),

    #[error("request cancelled: the scheduler queue was cleared")]
    Cancelled,

    #[error("conflict not found: {0}\n  hint: run 'tether conflicts list' to see pending conflicts")]
    ConflictNotFound(String),

    #[error("message not found: {0}")]
    MessageNotFound(String),

    #[error("feature not found: {0}\n  hint: run 'tether features list' to see available features")]
    FeatureNotFound(String),

    #[error("cannot retry message {id}: status is {status}\n  hint: only failed messages can be retried")]
    NotRetryable { id: String, status: String },

    #[error("cannot {0} while offline\n  hint: run without --offline")]
    Offline(&'static str),

    #[error("{0}")]
    InvalidInput(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),
}

/// A specialized Result type for tether operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
