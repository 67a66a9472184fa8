// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! tether-core: Shared library for the tether sync engine
//!
//! This crate provides the data model, timestamp handling, the SQLite-backed
//! local store, and the conflict rules used by the tether client.

pub mod conflict;
pub mod db;
pub mod error;
pub mod model;
pub mod snapshot;
pub mod timestamp;

pub use conflict::{
    conversation_divergence, message_divergence, AnyConflict, Conflict, ConflictType, EntityKind,
    ResolutionStrategy, Step, Versioned, Winner,
};
pub use db::{Database, StatusCounts};
pub use error::{Error, Result};
pub use model::{
    Conversation, FeatureAccess, FileInfo, MediaInfo, Message, MessagePatch, MessageSource,
    MessageStatus, MessageType,
};
pub use snapshot::Snapshot;
pub use timestamp::{Clock, ManualClock, SystemClock, TimeInput, DAY_MS};
