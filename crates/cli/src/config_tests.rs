// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use tempfile::TempDir;
use yare::parameterized;

#[test]
fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.server.base_url, "http://localhost:3000");
    assert_eq!(config.store.path, None);
    assert_eq!(config.scheduler_config(), SchedulerConfig::default());
    assert_eq!(config.sync_interval(), Duration::from_secs(60));
    assert_eq!(config.sync.retention_days, 30);
}

#[test]
fn test_missing_file_yields_defaults() {
    let temp = TempDir::new().unwrap();
    let config = Config::load_or_default(&temp.path().join("absent.toml")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_partial_file_fills_defaults() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.toml");
    fs::write(&path, "[scheduler]\nmax_concurrent = 5\n\n[store]\npath = \"/data/t.db\"\n").unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.scheduler.max_concurrent, 5);
    assert_eq!(config.scheduler.retry_count, 3);
    assert_eq!(config.db_path(), PathBuf::from("/data/t.db"));
    assert_eq!(config.server, ServerConfig::default());
}

#[test]
fn test_save_and_load_round_trip() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested").join("config.toml");
    let mut config = Config::default();
    config.server.base_url = "https://sync.example".to_string();
    config.sync.retention_days = 7;

    config.save(&path).unwrap();
    assert_eq!(Config::load(&path).unwrap(), config);
}

#[parameterized(
    zero_concurrency = { "[scheduler]\nmax_concurrent = 0\n", "max_concurrent" },
    empty_base_url = { "[server]\nbase_url = \"\"\n", "base_url" },
    zero_interval = { "[sync]\ninterval_secs = 0\n", "interval_secs" },
)]
fn test_invalid_values_rejected(content: &str, key: &str) {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.toml");
    fs::write(&path, content).unwrap();

    let err = Config::load(&path).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert!(err.to_string().contains(key), "{err}");
}

#[test]
fn test_unparseable_file_is_config_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.toml");
    fs::write(&path, "[scheduler\n").unwrap();
    let err = Config::load(&path).unwrap_err();
    assert!(err.to_string().starts_with("config error: failed to parse config"));
}

#[test]
fn test_overrides_replace_file_values() {
    let config = Config::default()
        .with_overrides(Some("http://other:9000".to_string()), Some(PathBuf::from("/x.db")));
    assert_eq!(config.server.base_url, "http://other:9000");
    assert_eq!(config.db_path(), PathBuf::from("/x.db"));

    let untouched = Config::default().with_overrides(None, None);
    assert_eq!(untouched, Config::default());
}

#[test]
fn test_explicit_config_path_wins() {
    let path = Path::new("/etc/tether.toml");
    assert_eq!(config_path(Some(path)), PathBuf::from("/etc/tether.toml"));
}

#[test]
fn test_default_db_path_file_name() {
    let path = default_db_path();
    assert_eq!(path.file_name().unwrap(), "tether.db");
}
