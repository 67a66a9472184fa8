// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Conflict resolution engine.
//!
//! Keeps the list of detected conflicts and the default strategy in the
//! store's settings so both survive restarts, and carries out resolution
//! plans against the local store and the server.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tether_core::{
    conversation_divergence, message_divergence, AnyConflict, Conflict, ConflictType,
    Conversation, EntityKind, Message, ResolutionStrategy, Step, Versioned,
};
use tokio::sync::watch;

use crate::api::{self, BatchRequest};
use crate::error::{Error, Result};
use crate::net::{Priority, RequestConfig, Scheduler};
use crate::store::LocalStore;

pub const PENDING_CONFLICTS_KEY: &str = "pendingConflicts";
pub const DEFAULT_STRATEGY_KEY: &str = "defaultConflictStrategy";

/// Outcome of resolving one conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Resolved(ResolutionStrategy),
    /// Manual strategy: nothing changed, the conflict stays pending.
    Deferred,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AutoResolveSummary {
    pub resolved: usize,
    pub failed: usize,
    pub manual: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DetectSummary {
    pub detected: usize,
    pub resolved: usize,
    pub failed: usize,
    pub manual: usize,
}

/// Which server records to compare against the local store.
#[derive(Debug, Clone, Default)]
pub struct DetectOptions {
    pub message_ids: Vec<String>,
    pub conversation_ids: Vec<String>,
    /// Resolve each new conflict with the default strategy right away.
    pub auto_resolve: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictStatus {
    pub pending_count: usize,
    pub is_resolving: bool,
    pub default_strategy: ResolutionStrategy,
}

/// Store operations a conflict plan needs for one kind of entity.
trait Stored: Versioned + Serialize + DeserializeOwned {
    fn divergence(local: Option<&Self>, server: Option<&Self>) -> Option<ConflictType>;
    fn load(store: &LocalStore, id: &str) -> Result<Option<Self>>;
    fn upsert(store: &LocalStore, value: &Self) -> Result<()>;
    fn remove(store: &LocalStore, id: &str) -> Result<()>;
}

impl Stored for Message {
    fn divergence(local: Option<&Self>, server: Option<&Self>) -> Option<ConflictType> {
        message_divergence(local, server)
    }

    fn load(store: &LocalStore, id: &str) -> Result<Option<Self>> {
        store.get_message(id)
    }

    fn upsert(store: &LocalStore, value: &Self) -> Result<()> {
        store.add_message(value)
    }

    fn remove(store: &LocalStore, id: &str) -> Result<()> {
        store.delete_message(id).map(|_| ())
    }
}

impl Stored for Conversation {
    fn divergence(local: Option<&Self>, server: Option<&Self>) -> Option<ConflictType> {
        conversation_divergence(local, server)
    }

    fn load(store: &LocalStore, id: &str) -> Result<Option<Self>> {
        store.get_conversation(id)
    }

    fn upsert(store: &LocalStore, value: &Self) -> Result<()> {
        store.save_conversation(value)
    }

    fn remove(store: &LocalStore, id: &str) -> Result<()> {
        store.delete_conversation(id).map(|_| ())
    }
}

struct Ledger {
    conflicts: Vec<AnyConflict>,
    default_strategy: ResolutionStrategy,
}

impl Ledger {
    fn pending_count(&self) -> usize {
        self.conflicts.iter().filter(|c| !c.is_resolved()).count()
    }

    /// Index of the conflict `id` names, preferring an unresolved one.
    fn find(&self, id: &str, kind: Option<EntityKind>) -> Option<usize> {
        let matches = |c: &AnyConflict| c.id() == id && kind.is_none_or(|k| c.kind() == k);
        self.conflicts
            .iter()
            .position(|c| matches(c) && !c.is_resolved())
            .or_else(|| self.conflicts.iter().position(matches))
    }
}

/// Clears the resolving flag when dropped.
struct ResolvingGuard<'a>(&'a AtomicBool);

impl<'a> ResolvingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst).ok()?;
        Some(ResolvingGuard(flag))
    }
}

impl Drop for ResolvingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct ConflictResolver {
    store: Arc<LocalStore>,
    scheduler: Scheduler,
    ledger: Mutex<Ledger>,
    resolving: AtomicBool,
    pending_tx: watch::Sender<usize>,
}

impl ConflictResolver {
    /// Restore the conflict list and default strategy from settings.
    /// Unreadable settings are logged and replaced by an empty list and the
    /// default strategy.
    pub fn load(store: Arc<LocalStore>, scheduler: Scheduler) -> Self {
        let conflicts = read_setting::<Vec<AnyConflict>>(&store, PENDING_CONFLICTS_KEY)
            .unwrap_or_default();
        let default_strategy =
            read_setting::<ResolutionStrategy>(&store, DEFAULT_STRATEGY_KEY).unwrap_or_default();
        let ledger = Ledger { conflicts, default_strategy };
        let (pending_tx, _) = watch::channel(ledger.pending_count());
        tracing::debug!(
            pending = ledger.pending_count(),
            strategy = %default_strategy,
            "conflict resolver loaded"
        );
        ConflictResolver {
            store,
            scheduler,
            ledger: Mutex::new(ledger),
            resolving: AtomicBool::new(false),
            pending_tx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn persist(&self, ledger: &Ledger) -> Result<()> {
        let value = serde_json::to_value(&ledger.conflicts)?;
        self.store.save_setting(PENDING_CONFLICTS_KEY, &value)?;
        self.pending_tx.send_replace(ledger.pending_count());
        Ok(())
    }

    /// Record a conflict. An unresolved conflict for the same entity is
    /// replaced. Returns the conflict id, which is the entity id.
    pub fn add_conflict<T>(
        &self,
        id: &str,
        conflict_type: ConflictType,
        client_version: Option<T>,
        server_version: Option<T>,
    ) -> Result<String>
    where
        T: Versioned,
        AnyConflict: From<Conflict<T>>,
    {
        let conflict: AnyConflict =
            Conflict::new(id, conflict_type, client_version, server_version, self.store.now_ms())?
                .into();
        let mut ledger = self.lock();
        let existing = ledger
            .conflicts
            .iter()
            .position(|c| !c.is_resolved() && c.id() == id && c.kind() == conflict.kind());
        match existing {
            Some(i) => ledger.conflicts[i] = conflict,
            None => ledger.conflicts.push(conflict),
        }
        self.persist(&ledger)?;
        tracing::info!(id, %conflict_type, "conflict recorded");
        Ok(id.to_string())
    }

    /// Unresolved conflicts, optionally of one type.
    pub fn pending_conflicts(&self, conflict_type: Option<ConflictType>) -> Vec<AnyConflict> {
        self.lock()
            .conflicts
            .iter()
            .filter(|c| !c.is_resolved())
            .filter(|c| conflict_type.is_none_or(|t| c.conflict_type() == t))
            .cloned()
            .collect()
    }

    /// Every recorded conflict, resolved ones included.
    pub fn all_conflicts(&self) -> Vec<AnyConflict> {
        self.lock().conflicts.clone()
    }

    pub fn conflict_status(&self) -> ConflictStatus {
        let ledger = self.lock();
        ConflictStatus {
            pending_count: ledger.pending_count(),
            is_resolving: self.resolving.load(Ordering::SeqCst),
            default_strategy: ledger.default_strategy,
        }
    }

    /// Watch the number of unresolved conflicts.
    pub fn subscribe_pending(&self) -> watch::Receiver<usize> {
        self.pending_tx.subscribe()
    }

    pub fn default_strategy(&self) -> ResolutionStrategy {
        self.lock().default_strategy
    }

    pub fn set_default_strategy(&self, strategy: ResolutionStrategy) -> Result<()> {
        self.store.save_setting(DEFAULT_STRATEGY_KEY, &Value::from(strategy.as_str()))?;
        self.lock().default_strategy = strategy;
        tracing::info!(%strategy, "default conflict strategy set");
        Ok(())
    }

    /// Resolve one conflict, with the default strategy if none is given.
    pub async fn resolve_conflict(
        &self,
        id: &str,
        strategy: Option<ResolutionStrategy>,
    ) -> Result<Resolution> {
        self.resolve_entry(id, None, strategy).await
    }

    /// Whether resolving `id` with `strategy` (or the default) would call the
    /// server. Manual resolution never does.
    pub fn requires_network(&self, id: &str, strategy: Option<ResolutionStrategy>) -> Result<bool> {
        let ledger = self.lock();
        let strategy = strategy.unwrap_or(ledger.default_strategy);
        let index = ledger.find(id, None).ok_or_else(|| Error::ConflictNotFound(id.to_string()))?;
        let remote = match &ledger.conflicts[index] {
            AnyConflict::Message(c) => c.plan(strategy)?.iter().any(Step::is_remote),
            AnyConflict::Conversation(c) => c.plan(strategy)?.iter().any(Step::is_remote),
        };
        Ok(remote)
    }

    async fn resolve_entry(
        &self,
        id: &str,
        kind: Option<EntityKind>,
        strategy: Option<ResolutionStrategy>,
    ) -> Result<Resolution> {
        let (conflict, strategy) = {
            let ledger = self.lock();
            let strategy = strategy.unwrap_or(ledger.default_strategy);
            let index = ledger.find(id, kind).ok_or_else(|| Error::ConflictNotFound(id.to_string()))?;
            (ledger.conflicts[index].clone(), strategy)
        };
        if strategy.is_manual() {
            tracing::info!(id, "conflict left for manual resolution");
            return Ok(Resolution::Deferred);
        }

        match &conflict {
            AnyConflict::Message(c) => self.apply(c.plan(strategy)?).await?,
            AnyConflict::Conversation(c) => self.apply(c.plan(strategy)?).await?,
        }

        let mut ledger = self.lock();
        if let Some(index) = ledger.find(id, Some(conflict.kind())) {
            ledger.conflicts[index].mark_resolved(strategy);
        }
        self.persist(&ledger)?;
        tracing::info!(id, kind = %conflict.kind(), %strategy, "conflict resolved");
        Ok(Resolution::Resolved(strategy))
    }

    async fn apply<T: Stored>(&self, steps: Vec<Step<T>>) -> Result<()> {
        for step in steps {
            match step {
                Step::PushUpsert(value) => {
                    let body = serde_json::to_value(&value)?;
                    let url = api::entity_path(T::KIND, value.id());
                    self.scheduler
                        .request(RequestConfig::put(url, body).priority(Priority::Low))
                        .await?;
                }
                Step::PushDelete(id) => {
                    let url = api::entity_path(T::KIND, &id);
                    self.scheduler.request(RequestConfig::delete(url).priority(Priority::Low)).await?;
                }
                Step::StoreUpsert(value) => T::upsert(&self.store, &value)?,
                Step::StoreDelete(id) => T::remove(&self.store, &id)?,
            }
        }
        Ok(())
    }

    /// Resolve every pending conflict with the default strategy. One
    /// failure does not stop the rest. Returns zeros if a resolution or
    /// detection pass is already running.
    pub async fn auto_resolve_all(&self) -> AutoResolveSummary {
        let Some(_guard) = ResolvingGuard::acquire(&self.resolving) else {
            tracing::debug!("conflict resolution already running");
            return AutoResolveSummary::default();
        };
        let (targets, strategy) = {
            let ledger = self.lock();
            let targets: Vec<(String, EntityKind)> = ledger
                .conflicts
                .iter()
                .filter(|c| !c.is_resolved())
                .map(|c| (c.id().to_string(), c.kind()))
                .collect();
            (targets, ledger.default_strategy)
        };

        let mut summary = AutoResolveSummary::default();
        if strategy.is_manual() {
            summary.manual = targets.len();
            return summary;
        }
        for (id, kind) in targets {
            match self.resolve_entry(&id, Some(kind), Some(strategy)).await {
                Ok(Resolution::Resolved(_)) => summary.resolved += 1,
                Ok(Resolution::Deferred) => summary.manual += 1,
                Err(e) => {
                    tracing::warn!(id, error = %e, "conflict resolution failed");
                    summary.failed += 1;
                }
            }
        }
        tracing::info!(
            resolved = summary.resolved,
            failed = summary.failed,
            "auto-resolved conflicts"
        );
        summary
    }

    /// Compare local records with the server's and record a conflict for
    /// every divergence. Returns zeros if resolution is already running.
    pub async fn detect_conflicts(&self, options: DetectOptions) -> DetectSummary {
        let Some(_guard) = ResolvingGuard::acquire(&self.resolving) else {
            tracing::debug!("conflict resolution already running");
            return DetectSummary::default();
        };
        let mut summary = DetectSummary::default();
        if !options.message_ids.is_empty() {
            self.detect_batch::<Message>(&options.message_ids, options.auto_resolve, &mut summary)
                .await;
        }
        if !options.conversation_ids.is_empty() {
            self.detect_batch::<Conversation>(
                &options.conversation_ids,
                options.auto_resolve,
                &mut summary,
            )
            .await;
        }
        if summary.detected > 0 {
            tracing::info!(
                detected = summary.detected,
                resolved = summary.resolved,
                failed = summary.failed,
                manual = summary.manual,
                "conflict detection finished"
            );
        }
        summary
    }

    async fn detect_batch<T: Stored>(
        &self,
        ids: &[String],
        auto_resolve: bool,
        summary: &mut DetectSummary,
    ) where
        AnyConflict: From<Conflict<T>>,
    {
        let server = match self.fetch_batch(T::KIND, ids).await {
            Ok(Some(map)) => map,
            // Empty reply: nothing to compare.
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(kind = %T::KIND, count = ids.len(), error = %e, "batch fetch failed");
                summary.failed += ids.len();
                return;
            }
        };
        for id in ids {
            if let Err(e) = self.detect_one::<T>(id, server.get(id), auto_resolve, summary).await {
                tracing::warn!(id, kind = %T::KIND, error = %e, "conflict check failed");
                summary.failed += 1;
            }
        }
    }

    async fn fetch_batch(
        &self,
        kind: EntityKind,
        ids: &[String],
    ) -> Result<Option<HashMap<String, Value>>> {
        let body = serde_json::to_value(BatchRequest { ids })?;
        let config = RequestConfig::post(api::batch_path(kind), body).priority(Priority::Low);
        self.scheduler.request_as(config).await
    }

    async fn detect_one<T: Stored>(
        &self,
        id: &str,
        server: Option<&Value>,
        auto_resolve: bool,
        summary: &mut DetectSummary,
    ) -> Result<()>
    where
        AnyConflict: From<Conflict<T>>,
    {
        let server: Option<T> = match server {
            None | Some(Value::Null) => None,
            Some(v) => Some(serde_json::from_value(v.clone())?),
        };
        let local = T::load(&self.store, id)?;
        let Some(conflict_type) = T::divergence(local.as_ref(), server.as_ref()) else {
            return Ok(());
        };
        self.add_conflict(id, conflict_type, local, server)?;
        summary.detected += 1;

        let strategy = self.default_strategy();
        if strategy.is_manual() {
            summary.manual += 1;
        } else if auto_resolve {
            self.resolve_entry(id, Some(T::KIND), Some(strategy)).await?;
            summary.resolved += 1;
        }
        Ok(())
    }
}

/// Read and decode a setting; `None` if missing or unreadable.
fn read_setting<T: DeserializeOwned>(store: &LocalStore, key: &str) -> Option<T> {
    let value = match store.get_setting(key) {
        Ok(v) => v?,
        Err(e) => {
            tracing::warn!(key, error = %e, "could not read setting");
            return None;
        }
    };
    match serde_json::from_value(value) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(key, error = %e, "ignoring unreadable setting");
            None
        }
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
