// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Environment variables read by the CLI. The name constants are generated
//! by `build.rs` into [`vars`].

use std::path::PathBuf;

pub mod vars {
    include!(concat!(env!("OUT_DIR"), "/env_vars.rs"));
}

fn non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Config file location override.
pub fn config_file() -> Option<PathBuf> {
    non_empty(vars::TETHER_CONFIG).map(PathBuf::from)
}

/// Database path override; wins over `[store] path`.
pub fn db_path() -> Option<PathBuf> {
    non_empty(vars::TETHER_DB).map(PathBuf::from)
}

/// Server base url override; wins over `[server] base_url`.
pub fn server_url() -> Option<String> {
    non_empty(vars::TETHER_SERVER)
}

/// Returns `true` if `NO_COLOR=1`.
pub fn no_color() -> bool {
    std::env::var(vars::NO_COLOR).is_ok_and(|v| v == "1")
}

/// Returns `true` if `COLOR=1`.
pub fn force_color() -> bool {
    std::env::var(vars::COLOR).is_ok_and(|v| v == "1")
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
