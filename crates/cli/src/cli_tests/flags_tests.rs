// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use clap::{CommandFactory, Parser};

#[test]
fn test_cli_definition_is_valid() {
    Cli::command().debug_assert();
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from(["tether", "status", "--offline", "-v", "-o", "json"]).unwrap();
    assert!(cli.offline);
    assert!(cli.verbose);
    assert_eq!(cli.output, OutputFormat::Json);
    assert!(matches!(cli.command, Command::Status));
}

#[test]
fn test_config_path_flag() {
    let cli = Cli::try_parse_from(["tether", "--config", "/tmp/t.toml", "sync"]).unwrap();
    assert_eq!(cli.config, Some(PathBuf::from("/tmp/t.toml")));
    assert!(!cli.offline);
    assert_eq!(cli.output, OutputFormat::Text);
}

#[test]
fn test_unknown_output_format_rejected() {
    assert!(Cli::try_parse_from(["tether", "-o", "yaml", "status"]).is_err());
}

#[test]
fn test_completion_shell() {
    let cli = Cli::try_parse_from(["tether", "completion", "zsh"]).unwrap();
    assert!(matches!(cli.command, Command::Completion { shell: Shell::Zsh }));
}
