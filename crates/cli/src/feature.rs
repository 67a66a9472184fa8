// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Feature registry: the list of features (notes, chat, LLM) the server
//! offers, and the calls that talk to a single feature.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tether_core::FeatureAccess;
use tokio::sync::watch;

use crate::api::{self, FeatureMessageRequest};
use crate::error::{Error, Result};
use crate::net::{Priority, RequestConfig, Scheduler};
use crate::store::LocalStore;

const LIST_TIMEOUT: Duration = Duration::from_millis(5_000);
const LIST_RETRY_DELAY: Duration = Duration::from_millis(1_000);
const MESSAGE_TIMEOUT: Duration = Duration::from_millis(10_000);
const MESSAGES_TIMEOUT: Duration = Duration::from_millis(15_000);
const FEATURE_RETRIES: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub feature_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
    #[serde(default)]
    pub disabled: bool,
}

impl Feature {
    fn builtin(id: &str, name: &str, feature_type: &str, order: u32) -> Self {
        Feature {
            id: id.to_string(),
            name: name.to_string(),
            feature_type: feature_type.to_string(),
            icon: Some(format!("/icons/{id}-icon.svg")),
            description: None,
            order: Some(order),
            disabled: false,
        }
    }
}

/// Used when the server's list cannot be fetched.
pub fn default_features() -> Vec<Feature> {
    vec![
        Feature::builtin("note", "Notes", "notes", 1),
        Feature::builtin("chat", "Chat", "chat", 2),
        Feature::builtin("llm", "LLM Q&A", "llm", 3),
    ]
}

pub struct FeatureRegistry {
    scheduler: Scheduler,
    store: Arc<LocalStore>,
    features: Mutex<Vec<Feature>>,
    initialized: AtomicBool,
    changes: watch::Sender<Vec<Feature>>,
}

impl FeatureRegistry {
    pub fn new(scheduler: Scheduler, store: Arc<LocalStore>) -> Self {
        let (changes, _) = watch::channel(Vec::new());
        FeatureRegistry {
            scheduler,
            store,
            features: Mutex::new(Vec::new()),
            initialized: AtomicBool::new(false),
            changes,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Feature>> {
        self.features.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn replace(&self, features: Vec<Feature>) {
        *self.lock() = features.clone();
        self.initialized.store(true, Ordering::SeqCst);
        self.changes.send_replace(features);
    }

    /// Fetch the feature list once. Falls back to [`default_features`] when
    /// offline or when the fetch fails.
    pub async fn initialize(&self) {
        if self.initialized.load(Ordering::SeqCst) {
            return;
        }
        if !self.scheduler.network().is_online() {
            tracing::debug!("offline, using default features");
            self.replace(default_features());
            return;
        }
        let config = RequestConfig::get(api::FEATURES)
            .priority(Priority::High)
            .timeout(LIST_TIMEOUT)
            .retry_count(FEATURE_RETRIES)
            .retry_delay(LIST_RETRY_DELAY);
        match self.scheduler.request_as::<Vec<Feature>>(config).await {
            Ok(features) => {
                tracing::debug!(count = features.len(), "loaded features");
                self.replace(features);
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not load features, using defaults");
                self.replace(default_features());
            }
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub fn features(&self) -> Vec<Feature> {
        self.lock().clone()
    }

    pub fn feature(&self, id: &str) -> Result<Feature> {
        self.lock()
            .iter()
            .find(|f| f.id == id)
            .cloned()
            .ok_or_else(|| Error::FeatureNotFound(id.to_string()))
    }

    pub fn features_by_type(&self, feature_type: &str) -> Vec<Feature> {
        self.lock().iter().filter(|f| f.feature_type == feature_type).cloned().collect()
    }

    /// Look up a feature and record the access.
    pub fn open_feature(&self, id: &str) -> Result<(Feature, Option<FeatureAccess>)> {
        let feature = self.feature(id)?;
        let access = self.store.update_feature_access(&feature.id, &feature.name)?;
        Ok((feature, access))
    }

    pub fn recent_features(&self, limit: usize) -> Result<Vec<FeatureAccess>> {
        self.store.recent_features(limit)
    }

    /// Send one message to a feature.
    pub async fn send_feature_message(&self, feature_id: &str, content: &str) -> Result<Value> {
        let feature = self.feature(feature_id)?;
        let body = serde_json::to_value(FeatureMessageRequest { content })?;
        let config = RequestConfig::post(api::feature_message_path(&feature.id), body)
            .timeout(MESSAGE_TIMEOUT)
            .retry_count(FEATURE_RETRIES)
            .batch_key(format!("feature_message_{}", feature.id));
        self.scheduler.request(config).await.inspect_err(|e| {
            tracing::warn!(feature = %feature.id, error = %e, "feature message failed");
        })
    }

    /// Send several messages to a feature in one call.
    pub async fn send_feature_messages(
        &self,
        feature_id: &str,
        contents: &[String],
    ) -> Result<Value> {
        let feature = self.feature(feature_id)?;
        let body: Vec<FeatureMessageRequest<'_>> =
            contents.iter().map(|content| FeatureMessageRequest { content }).collect();
        let config = RequestConfig::post(api::feature_messages_path(&feature.id), serde_json::to_value(body)?)
            .timeout(MESSAGES_TIMEOUT)
            .retry_count(FEATURE_RETRIES)
            .batch_key(format!("feature_messages_{}", feature.id));
        self.scheduler.request(config).await.inspect_err(|e| {
            tracing::warn!(feature = %feature.id, count = contents.len(), error = %e, "feature messages failed");
        })
    }

    /// Watch the feature list.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Feature>> {
        self.changes.subscribe()
    }

    /// Forget the loaded list so the next `initialize` fetches again.
    pub fn reset(&self) {
        self.lock().clear();
        self.initialized.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
#[path = "feature_tests.rs"]
mod tests;
