// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;

#[test]
fn test_vars_constants() {
    assert_eq!(vars::TETHER_CONFIG, "TETHER_CONFIG");
    assert_eq!(vars::TETHER_DB, "TETHER_DB");
    assert_eq!(vars::TETHER_SERVER, "TETHER_SERVER");
    assert_eq!(vars::NO_COLOR, "NO_COLOR");
    assert_eq!(vars::COLOR, "COLOR");
}

// Each variable is touched by exactly one test so parallel tests do not race.

#[test]
fn test_config_file() {
    std::env::remove_var("TETHER_CONFIG");
    assert_eq!(config_file(), None);
    std::env::set_var("TETHER_CONFIG", "/tmp/tether.toml");
    assert_eq!(config_file(), Some(PathBuf::from("/tmp/tether.toml")));
    std::env::remove_var("TETHER_CONFIG");
}

#[test]
fn test_db_path() {
    std::env::set_var("TETHER_DB", "/tmp/tether.db");
    assert_eq!(db_path(), Some(PathBuf::from("/tmp/tether.db")));
    std::env::remove_var("TETHER_DB");
    assert_eq!(db_path(), None);
}

#[test]
fn test_blank_server_url_is_ignored() {
    std::env::set_var("TETHER_SERVER", "  ");
    assert_eq!(server_url(), None);
    std::env::set_var("TETHER_SERVER", "http://sync.local");
    assert_eq!(server_url().as_deref(), Some("http://sync.local"));
    std::env::remove_var("TETHER_SERVER");
}

#[test]
fn test_no_color_only_for_one() {
    std::env::set_var("NO_COLOR", "true");
    assert!(!no_color());
    std::env::set_var("NO_COLOR", "1");
    assert!(no_color());
    std::env::remove_var("NO_COLOR");
    assert!(!no_color());
}

#[test]
fn test_force_color() {
    std::env::remove_var("COLOR");
    assert!(!force_color());
    std::env::set_var("COLOR", "1");
    assert!(force_color());
    std::env::remove_var("COLOR");
}
