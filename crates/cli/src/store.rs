// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! LocalStore: durable storage with a degrade-to-no-op fallback.
//!
//! When the SQLite database cannot be opened the store keeps working as a
//! no-op: reads come back empty and writes succeed without effect, so the
//! rest of the client stays usable.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tether_core::{
    Clock, Conversation, Database, FeatureAccess, Message, MessagePatch, MessageStatus, Snapshot,
    StatusCounts, DAY_MS,
};

use crate::api::{self, SyncRequest, SyncResponse};
use crate::error::Result;
use crate::net::{Priority, RequestConfig, Scheduler};

const SYNC_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Where store operations go.
enum Backend {
    Sqlite(Mutex<Database>),
    /// Storage could not be initialized.
    Unavailable,
}

/// Counts reported by a bulk sync pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncOutcome {
    pub success: usize,
    pub failed: usize,
}

pub struct LocalStore {
    backend: Backend,
    scheduler: Scheduler,
    clock: Arc<dyn Clock>,
}

impl LocalStore {
    /// Open the database at `path`. Falls back to a no-op store on failure.
    pub fn open(path: &Path, scheduler: Scheduler, clock: Arc<dyn Clock>) -> Self {
        match Database::open(path) {
            Ok(db) => Self::from_database(db, scheduler, clock),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "local store unavailable, continuing without persistence");
                Self::unavailable(scheduler, clock)
            }
        }
    }

    /// Store backed by an in-memory database.
    pub fn in_memory(scheduler: Scheduler, clock: Arc<dyn Clock>) -> Self {
        match Database::open_in_memory() {
            Ok(db) => Self::from_database(db, scheduler, clock),
            Err(e) => {
                tracing::warn!(error = %e, "in-memory store unavailable");
                Self::unavailable(scheduler, clock)
            }
        }
    }

    pub fn from_database(db: Database, scheduler: Scheduler, clock: Arc<dyn Clock>) -> Self {
        LocalStore { backend: Backend::Sqlite(Mutex::new(db)), scheduler, clock }
    }

    pub fn unavailable(scheduler: Scheduler, clock: Arc<dyn Clock>) -> Self {
        LocalStore { backend: Backend::Unavailable, scheduler, clock }
    }

    /// False when running as a no-op store.
    pub fn is_available(&self) -> bool {
        matches!(self.backend, Backend::Sqlite(_))
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    /// Run `f` against the database, or return the default result when the
    /// store is unavailable.
    fn with_db<T, F>(&self, f: F) -> Result<T>
    where
        T: Default,
        F: FnOnce(&mut Database) -> tether_core::Result<T>,
    {
        match &self.backend {
            Backend::Sqlite(db) => {
                let mut guard: MutexGuard<'_, Database> =
                    db.lock().unwrap_or_else(|e| e.into_inner());
                Ok(f(&mut guard)?)
            }
            Backend::Unavailable => Ok(T::default()),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Messages
    // ─────────────────────────────────────────────────────────────────────

    /// Insert or replace a message by id.
    pub fn add_message(&self, msg: &Message) -> Result<()> {
        self.with_db(|db| db.put_message(msg))
    }

    /// Write a batch in one transaction.
    pub fn save_messages(&self, messages: &[Message]) -> Result<()> {
        self.with_db(|db| db.save_messages(messages))
    }

    pub fn get_message(&self, id: &str) -> Result<Option<Message>> {
        self.with_db(|db| db.get_message(id))
    }

    /// Apply a partial update. Returns the updated message, or `None` if
    /// there is no message with that id.
    pub fn update_message(&self, id: &str, patch: &MessagePatch) -> Result<Option<Message>> {
        let clock = self.clock.as_ref();
        self.with_db(|db| db.update_message(id, patch, clock))
    }

    pub fn delete_message(&self, id: &str) -> Result<bool> {
        self.with_db(|db| db.delete_message(id))
    }

    /// Newest first.
    pub fn messages_by_feature(
        &self,
        feature_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Message>> {
        self.with_db(|db| db.messages_by_feature(feature_id, limit, offset))
    }

    pub fn messages_by_status(&self, status: MessageStatus) -> Result<Vec<Message>> {
        self.with_db(|db| db.messages_by_status(status))
    }

    pub fn pending_messages(&self) -> Result<Vec<Message>> {
        self.with_db(|db| db.pending_messages())
    }

    pub fn count_by_status(&self) -> Result<StatusCounts> {
        self.with_db(|db| db.count_by_status())
    }

    /// Delete messages older than `days_to_keep` days. Returns the count.
    pub fn cleanup_old_data(&self, days_to_keep: u32) -> Result<usize> {
        let cutoff = self.clock.now_ms() - i64::from(days_to_keep) * DAY_MS;
        let removed = self.with_db(|db| db.cleanup_before(cutoff))?;
        tracing::info!(removed, days_to_keep, "cleaned up old messages");
        Ok(removed)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Conversations
    // ─────────────────────────────────────────────────────────────────────

    pub fn save_conversation(&self, conv: &Conversation) -> Result<()> {
        self.with_db(|db| db.save_conversation(conv))
    }

    pub fn get_conversation(&self, id: &str) -> Result<Option<Conversation>> {
        self.with_db(|db| db.get_conversation(id))
    }

    pub fn conversations_by_feature(&self, feature_id: &str) -> Result<Vec<Conversation>> {
        self.with_db(|db| db.conversations_by_feature(feature_id))
    }

    /// Removes the conversation and every message pointing at it. Returns
    /// the number of messages removed.
    pub fn delete_conversation(&self, id: &str) -> Result<usize> {
        self.with_db(|db| db.delete_conversation(id))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Feature access and settings
    // ─────────────────────────────────────────────────────────────────────

    /// Record an access at the current time. `None` when unavailable.
    pub fn update_feature_access(
        &self,
        feature_id: &str,
        feature_name: &str,
    ) -> Result<Option<FeatureAccess>> {
        let now = self.clock.now_ms();
        self.with_db(|db| db.update_feature_access(feature_id, feature_name, now).map(Some))
    }

    pub fn recent_features(&self, limit: usize) -> Result<Vec<FeatureAccess>> {
        self.with_db(|db| db.recent_features(limit))
    }

    pub fn save_setting(&self, key: &str, value: &Value) -> Result<()> {
        self.with_db(|db| db.save_setting(key, value))
    }

    pub fn get_setting(&self, key: &str) -> Result<Option<Value>> {
        self.with_db(|db| db.get_setting(key))
    }

    pub fn all_settings(&self) -> Result<BTreeMap<String, Value>> {
        self.with_db(|db| db.all_settings())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Backup
    // ─────────────────────────────────────────────────────────────────────

    pub fn export_data(&self) -> Result<Snapshot> {
        self.with_db(|db| db.export_snapshot())
    }

    /// Additive: upserts every record, deletes nothing.
    pub fn import_data(&self, snapshot: &Snapshot) -> Result<()> {
        self.with_db(|db| db.import_snapshot(snapshot))?;
        tracing::info!(records = snapshot.record_count(), "imported snapshot");
        Ok(())
    }

    pub fn clear_database(&self) -> Result<()> {
        self.with_db(|db| db.clear_all())?;
        tracing::info!("local store cleared");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Sync
    // ─────────────────────────────────────────────────────────────────────

    /// Send every pending message in one LOW priority call and mark the
    /// accepted ones delivered.
    ///
    /// Never fails: a network error counts every pending message as failed
    /// and leaves them pending for the next pass.
    pub async fn sync_messages(&self) -> SyncOutcome {
        let pending = match self.pending_messages() {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "could not read pending messages");
                return SyncOutcome::default();
            }
        };
        if pending.is_empty() {
            return SyncOutcome::default();
        }

        let body = match serde_json::to_value(SyncRequest { messages: &pending }) {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(error = %e, "could not encode sync request");
                return SyncOutcome { success: 0, failed: pending.len() };
            }
        };
        let config = RequestConfig::post(api::MESSAGES_SYNC, body)
            .priority(Priority::Low)
            .timeout(SYNC_TIMEOUT);
        let response: SyncResponse = match self.scheduler.request_as(config).await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, pending = pending.len(), "message sync failed");
                return SyncOutcome { success: 0, failed: pending.len() };
            }
        };

        let accepted: HashSet<&str> = response.success.iter().map(String::as_str).collect();
        let mut outcome = SyncOutcome::default();
        for msg in &pending {
            if accepted.contains(msg.id.as_str()) {
                match self.update_message(&msg.id, &MessagePatch::delivered()) {
                    Ok(_) => outcome.success += 1,
                    Err(e) => {
                        tracing::warn!(id = %msg.id, error = %e, "could not mark message delivered");
                        outcome.failed += 1;
                    }
                }
                continue;
            }
            outcome.failed += 1;
            if let Some(reason) = response.failed.get(&msg.id) {
                if let Err(e) = self.update_message(&msg.id, &MessagePatch::failed(reason.as_str())) {
                    tracing::warn!(id = %msg.id, error = %e, "could not mark message failed");
                }
            }
        }
        tracing::info!(success = outcome.success, failed = outcome.failed, "message sync finished");
        outcome
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
