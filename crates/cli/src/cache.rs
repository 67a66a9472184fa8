// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Message cache: the entry point for sending and syncing messages.
//!
//! Every new message is written to the local store first. Online, it is sent
//! right away at HIGH priority; offline, or if sending fails, it waits in the
//! offline queue. The queue mirrors the store's pending messages and is
//! flushed by [`MessageCache::sync_offline_messages`], which runs at most once
//! at a time whether called directly or by the background triggers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tether_core::{
    Clock, FileInfo, MediaInfo, Message, MessagePatch, MessageSource, MessageStatus, MessageType,
    TimeInput,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::api;
use crate::error::{Error, Result};
use crate::net::{NetworkMonitor, NetworkStatus, Priority, RequestConfig, Scheduler};
use crate::resolver::{AutoResolveSummary, ConflictResolver, DetectOptions, DetectSummary, Resolution};
use crate::store::LocalStore;

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const DEFAULT_RETENTION_DAYS: u32 = 30;
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(60);

/// Messages examined per feature by [`MessageCache::check_and_resolve_conflicts`].
const CONFLICT_SCAN_LIMIT: usize = 1000;

/// A message as supplied by a caller. Missing fields are filled in by
/// [`MessageCache::add_message`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDraft {
    #[serde(default)]
    pub id: Option<String>,
    pub feature_id: String,
    pub content: String,
    #[serde(rename = "type", default)]
    pub message_type: MessageType,
    #[serde(default)]
    pub source: MessageSource,
    #[serde(default)]
    pub status: Option<MessageStatus>,
    /// Epoch milliseconds, a float, or an RFC 3339 string.
    #[serde(default)]
    pub timestamp: Option<TimeInput>,
    #[serde(default)]
    pub media: Option<MediaInfo>,
    #[serde(default)]
    pub file: Option<FileInfo>,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

impl MessageDraft {
    pub fn new(feature_id: impl Into<String>, content: impl Into<String>) -> Self {
        MessageDraft {
            feature_id: feature_id.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    fn into_message(self, clock: &dyn Clock) -> Message {
        let id = self.id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let timestamp = match &self.timestamp {
            Some(ts) => ts.resolve(clock),
            None => clock.now_ms(),
        };
        Message {
            id,
            feature_id: self.feature_id,
            content: self.content,
            message_type: self.message_type,
            source: self.source,
            status: self.status.unwrap_or(MessageStatus::Pending),
            timestamp,
            error: None,
            media: self.media,
            file: self.file,
            conversation_id: self.conversation_id,
            synced: false,
        }
    }
}

/// Result of one offline sync pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub success: usize,
    pub failed: usize,
    pub conflicts: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfflineQueueStatus {
    pub count: usize,
    pub is_syncing: bool,
}

/// Clears the syncing flag when dropped.
struct SyncGuard<'a>(&'a AtomicBool);

impl<'a> SyncGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst).ok()?;
        Some(SyncGuard(flag))
    }
}

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct MessageCache {
    store: Arc<LocalStore>,
    scheduler: Scheduler,
    resolver: Arc<ConflictResolver>,
    network: NetworkMonitor,
    /// Cache of the store's pending messages, never the source of truth.
    queue: Mutex<Vec<Message>>,
    syncing: AtomicBool,
}

impl MessageCache {
    /// Build the cache and rebuild the offline queue from the store.
    pub fn load(
        store: Arc<LocalStore>,
        scheduler: Scheduler,
        resolver: Arc<ConflictResolver>,
        network: NetworkMonitor,
    ) -> Self {
        let cache = MessageCache {
            store,
            scheduler,
            resolver,
            network,
            queue: Mutex::new(Vec::new()),
            syncing: AtomicBool::new(false),
        };
        if let Err(e) = cache.reload_queue() {
            tracing::warn!(error = %e, "could not load offline queue");
        }
        cache
    }

    fn queue(&self) -> MutexGuard<'_, Vec<Message>> {
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Replace the offline queue with the store's pending messages.
    pub fn reload_queue(&self) -> Result<usize> {
        let pending = self.store.pending_messages()?;
        let count = pending.len();
        *self.queue() = pending;
        Ok(count)
    }

    fn enqueue(&self, message: Message) {
        let mut queue = self.queue();
        match queue.iter_mut().find(|m| m.id == message.id) {
            Some(existing) => *existing = message,
            None => queue.push(message),
        }
    }

    /// Ids of the messages waiting to be sent.
    pub fn queued_ids(&self) -> Vec<String> {
        self.queue().iter().map(|m| m.id.clone()).collect()
    }

    pub fn offline_queue_status(&self) -> OfflineQueueStatus {
        OfflineQueueStatus {
            count: self.queue().len(),
            is_syncing: self.syncing.load(Ordering::SeqCst),
        }
    }

    /// Persist a new message, then send it or queue it.
    ///
    /// Never loses the message: a failed send leaves it pending with the
    /// error recorded, ready for the next sync. A draft that is already
    /// `sent` or `received` is stored as is.
    pub async fn add_message(&self, draft: MessageDraft, force_offline: bool) -> Result<Message> {
        let message = draft.into_message(self.store.clock());
        self.store.add_message(&message)?;

        if !message.status.is_unsent() {
            tracing::debug!(id = %message.id, status = %message.status, "stored already delivered message");
            return Ok(message);
        }
        if force_offline || !self.network.is_online() {
            tracing::debug!(id = %message.id, "queued message for later sync");
            self.enqueue(message.clone());
            return Ok(message);
        }

        let body = serde_json::to_value(&message)?;
        let config = RequestConfig::post(api::MESSAGES, body).priority(Priority::High);
        match self.scheduler.request(config).await {
            Ok(_) => {
                let sent = self.store.update_message(&message.id, &MessagePatch::delivered())?;
                tracing::debug!(id = %message.id, "message sent");
                Ok(sent.unwrap_or(message))
            }
            Err(e) => {
                tracing::warn!(id = %message.id, error = %e, "send failed, queued for sync");
                let patch = MessagePatch { error: Some(Some(e.to_string())), ..Default::default() };
                let message = self.store.update_message(&message.id, &patch)?.unwrap_or(message);
                self.enqueue(message.clone());
                Ok(message)
            }
        }
    }

    /// Flush the offline queue, then check the still-unsent messages for
    /// conflicts. Returns zeros if the queue is empty or a sync is running.
    pub async fn sync_offline_messages(&self) -> SyncSummary {
        if self.queue().is_empty() {
            return SyncSummary::default();
        }
        let Some(_guard) = SyncGuard::acquire(&self.syncing) else {
            tracing::debug!("sync already running");
            return SyncSummary::default();
        };

        let outcome = self.store.sync_messages().await;
        if let Err(e) = self.reload_queue() {
            tracing::warn!(error = %e, "could not reload offline queue");
        }

        let message_ids = self.queued_ids();
        let conflicts = if message_ids.is_empty() {
            0
        } else {
            let options = DetectOptions { message_ids, auto_resolve: true, ..Default::default() };
            self.resolver.detect_conflicts(options).await.detected
        };

        let summary = SyncSummary { success: outcome.success, failed: outcome.failed, conflicts };
        tracing::info!(
            success = summary.success,
            failed = summary.failed,
            conflicts = summary.conflicts,
            "offline sync finished"
        );
        summary
    }

    /// Move a failed message back to pending and queue it.
    pub fn retry_message(&self, id: &str) -> Result<Message> {
        let message = self.store.get_message(id)?.ok_or_else(|| Error::MessageNotFound(id.to_string()))?;
        if message.status != MessageStatus::Failed {
            return Err(Error::NotRetryable { id: id.to_string(), status: message.status.to_string() });
        }
        let patch = MessagePatch {
            status: Some(MessageStatus::Pending),
            error: Some(None),
            ..Default::default()
        };
        let message = self
            .store
            .update_message(id, &patch)?
            .ok_or_else(|| Error::MessageNotFound(id.to_string()))?;
        self.enqueue(message.clone());
        tracing::info!(id, "message queued for retry");
        Ok(message)
    }

    /// Newest first. `None` takes the default page size and offset 0.
    pub fn messages_by_feature(
        &self,
        feature_id: &str,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Vec<Message>> {
        self.store.messages_by_feature(
            feature_id,
            limit.unwrap_or(DEFAULT_PAGE_SIZE),
            offset.unwrap_or(0),
        )
    }

    pub fn cleanup_old_messages(&self, days_to_keep: Option<u32>) -> Result<usize> {
        let removed = self.store.cleanup_old_data(days_to_keep.unwrap_or(DEFAULT_RETENTION_DAYS))?;
        if removed > 0 {
            self.reload_queue()?;
        }
        Ok(removed)
    }

    /// Detect and auto-resolve conflicts across a feature's recent messages.
    pub async fn check_and_resolve_conflicts(&self, feature_id: &str) -> Result<DetectSummary> {
        let message_ids: Vec<String> = self
            .store
            .messages_by_feature(feature_id, CONFLICT_SCAN_LIMIT, 0)?
            .into_iter()
            .map(|m| m.id)
            .collect();
        if message_ids.is_empty() {
            return Ok(DetectSummary::default());
        }
        let options = DetectOptions { message_ids, auto_resolve: true, ..Default::default() };
        Ok(self.resolver.detect_conflicts(options).await)
    }

    /// Resolve one conflict with the default strategy.
    pub async fn resolve_conflict(&self, id: &str) -> Result<Resolution> {
        self.resolver.resolve_conflict(id, None).await
    }

    pub async fn resolve_all_conflicts(&self) -> AutoResolveSummary {
        self.resolver.auto_resolve_all().await
    }

    /// Run sync on every offline to online transition and on every `interval`
    /// tick while online with a non-empty queue, until `cancel` fires.
    pub fn spawn_triggers(
        self: &Arc<Self>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        let mut network = self.network.subscribe();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    changed = network.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let status = *network.borrow_and_update();
                        if status == NetworkStatus::Online {
                            tracing::debug!("network back online, syncing");
                            cache.sync_offline_messages().await;
                        }
                    }
                    _ = ticker.tick() => {
                        if cache.network.is_online() && !cache.queue().is_empty() {
                            cache.sync_offline_messages().await;
                        }
                    }
                }
            }
            tracing::debug!("sync triggers stopped");
        })
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
