// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client configuration.
//!
//! Configuration is stored in `config.toml`, found via `--config`, then
//! `$TETHER_CONFIG`, then the platform config directory. Every section and
//! key is optional; a missing file yields the defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::env;
use crate::error::{Error, Result};
use crate::net::SchedulerConfig;

const APP_DIR_NAME: &str = "tether";
const CONFIG_FILE_NAME: &str = "config.toml";
const DB_FILE_NAME: &str = "tether.db";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub scheduler: SchedulerSection,
    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Prefix joined to the relative `/api/...` paths.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig { base_url: default_base_url() }
    }
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Database file. Defaults to the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerSection {
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for SchedulerSection {
    fn default() -> Self {
        SchedulerSection {
            max_concurrent: default_max_concurrent(),
            timeout_ms: default_timeout_ms(),
            retry_count: default_retry_count(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

fn default_max_concurrent() -> usize {
    3
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1_000
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Periodic sync interval while online (default: 60).
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Days of messages kept by `cleanup` (default: 30).
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            interval_secs: default_interval_secs(),
            retention_days: default_retention_days(),
        }
    }
}

fn default_interval_secs() -> u64 {
    60
}

fn default_retention_days() -> u32 {
    30
}

impl Config {
    /// Loads and validates the configuration at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config: {}", e)))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Config::default())
        }
    }

    /// Saves the configuration, creating the parent directory if needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.base_url.trim().is_empty() {
            return Err(Error::Config("server.base_url must not be empty".to_string()));
        }
        if self.scheduler.max_concurrent == 0 {
            return Err(Error::Config("scheduler.max_concurrent must be at least 1".to_string()));
        }
        if self.sync.interval_secs == 0 {
            return Err(Error::Config("sync.interval_secs must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Applies `$TETHER_SERVER` and `$TETHER_DB` on top of the file values.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(env::server_url(), env::db_path())
    }

    fn with_overrides(mut self, base_url: Option<String>, db_path: Option<PathBuf>) -> Self {
        if let Some(url) = base_url {
            self.server.base_url = url;
        }
        if let Some(path) = db_path {
            self.store.path = Some(path);
        }
        self
    }

    pub fn db_path(&self) -> PathBuf {
        self.store.path.clone().unwrap_or_else(default_db_path)
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            max_concurrent: self.scheduler.max_concurrent,
            timeout: Duration::from_millis(self.scheduler.timeout_ms),
            retry_count: self.scheduler.retry_count,
            retry_delay: Duration::from_millis(self.scheduler.retry_delay_ms),
        }
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync.interval_secs)
    }
}

/// Resolve the config file: explicit path, then `$TETHER_CONFIG`, then the
/// platform config directory.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    env::config_file().unwrap_or_else(|| {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    })
}

/// `<data dir>/tether/tether.db`, or `./tether.db` when no data dir exists.
pub fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DB_FILE_NAME)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
