// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Application context: builds every component once and owns the
//! background tasks that keep the offline queue moving.

use std::sync::Arc;

use tether_core::Clock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::cache::MessageCache;
use crate::config::Config;
use crate::feature::FeatureRegistry;
use crate::net::{NetworkMonitor, NetworkStatus, Scheduler, Transport};
use crate::resolver::ConflictResolver;
use crate::store::LocalStore;

pub struct AppContext {
    pub config: Config,
    pub network: NetworkMonitor,
    pub scheduler: Scheduler,
    pub store: Arc<LocalStore>,
    pub resolver: Arc<ConflictResolver>,
    pub cache: Arc<MessageCache>,
    pub features: FeatureRegistry,
    cancel_token: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl AppContext {
    /// Wire the components in dependency order: network, scheduler, store,
    /// resolver, cache, features. An unusable database degrades to a no-op
    /// store rather than failing.
    pub fn build(
        config: Config,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
        initial: NetworkStatus,
    ) -> Self {
        let network = NetworkMonitor::new(initial);
        let scheduler = Scheduler::new(transport, network.clone(), config.scheduler_config());
        let store = Arc::new(LocalStore::open(&config.db_path(), scheduler.clone(), clock));
        let resolver = Arc::new(ConflictResolver::load(store.clone(), scheduler.clone()));
        let cache = Arc::new(MessageCache::load(
            store.clone(),
            scheduler.clone(),
            resolver.clone(),
            network.clone(),
        ));
        let features = FeatureRegistry::new(scheduler.clone(), store.clone());
        tracing::debug!(
            db = %config.db_path().display(),
            server = %config.server.base_url,
            network = %initial,
            "context built"
        );
        AppContext {
            config,
            network,
            scheduler,
            store,
            resolver,
            cache,
            features,
            cancel_token: CancellationToken::new(),
            tasks: Vec::new(),
        }
    }

    /// Start the scheduler's network watcher and the sync triggers.
    /// Calling it again while running is a no-op.
    pub fn start(&mut self) {
        if !self.tasks.is_empty() {
            return;
        }
        self.tasks.push(self.scheduler.spawn_network_watcher(self.cancel_token.clone()));
        self.tasks
            .push(self.cache.spawn_triggers(self.config.sync_interval(), self.cancel_token.clone()));
    }

    pub fn is_running(&self) -> bool {
        !self.tasks.is_empty() && !self.cancel_token.is_cancelled()
    }

    /// Stop the background tasks and wait for them to exit.
    pub async fn shutdown(mut self) {
        self.cancel_token.cancel();
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "background task ended abnormally");
            }
        }
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
