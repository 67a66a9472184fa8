// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for tether-core operations.

use thiserror::Error;

/// All possible errors that can occur in tether-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("message not found: {0}")]
    MessageNotFound(String),

    #[error("conversation not found: {0}")]
    ConversationNotFound(String),

    #[error("invalid status transition: cannot go from {from} to {to}\n  hint: from '{from}' you can go to: {valid_targets}")]
    InvalidTransition {
        from: String,
        to: String,
        valid_targets: String,
    },

    #[error("invalid status: '{0}'\n  hint: valid statuses are: pending, sent, received, failed")]
    InvalidStatus(String),

    #[error(
        "invalid message type: '{0}'\n  hint: valid types are: text, image, video, audio, file"
    )]
    InvalidMessageType(String),

    #[error("invalid message source: '{0}'\n  hint: valid sources are: mobile, server")]
    InvalidSource(String),

    #[error("unsupported conflict type: '{0}'\n  hint: valid types are: message_content, message_status, conversation_data, deletion_conflict")]
    InvalidConflictType(String),

    #[error("unsupported resolution strategy: '{0}'\n  hint: valid strategies are: client_wins, server_wins, keep_both, timestamp_wins, manual_resolution")]
    UnsupportedStrategy(String),

    #[error("conflict {0} has neither a client nor a server version")]
    EmptyConflict(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupted data: {0}")]
    CorruptedData(String),
}

/// A specialized Result type for tether-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
