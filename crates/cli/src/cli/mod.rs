// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

mod args;

use std::path::PathBuf;

use crate::colors;
use crate::help;
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use tether_core::{ConflictType, MessageType, ResolutionStrategy};

pub use args::{DetectArgs, PageArgs};

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

fn parse_message_type(s: &str) -> Result<MessageType, String> {
    s.parse().map_err(|e: tether_core::Error| e.to_string())
}

fn parse_strategy(s: &str) -> Result<ResolutionStrategy, String> {
    s.parse().map_err(|e: tether_core::Error| e.to_string())
}

fn parse_conflict_type(s: &str) -> Result<ConflictType, String> {
    s.parse().map_err(|e: tether_core::Error| e.to_string())
}

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "tether")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Offline-first message sync client")]
#[command(
    long_about = "Offline-first message sync client.\n\n\
    Messages are stored locally first, sent when the network allows, and \
    reconciled with the server when both sides changed."
)]
#[command(help_template = help::template())]
#[command(before_help = help::commands())]
#[command(after_help = help::quickstart())]
#[command(styles = help::styles())]
pub struct Cli {
    /// Config file (default: $TETHER_CONFIG, then the platform config dir)
    #[arg(long, global = true, value_name = "path")]
    pub config: Option<PathBuf>,

    /// Work without the network: queue sends, skip server calls
    #[arg(long, global = true)]
    pub offline: bool,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short = 'o', long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    // ─────────────────────────────────────────────────────────────────────────
    // Messages
    // ─────────────────────────────────────────────────────────────────────────
    /// Store a message and send it, or queue it when offline
    #[command(after_help = colors::examples("\
Examples:
  tether send chat \"hello\"             Send now, queue on failure
  tether send note \"jot\" --queue       Queue without trying the network
  tether send chat \"pic\" --type image  Send with an explicit type"))]
    Send {
        /// Feature the message belongs to
        #[arg(value_parser = non_empty_string)]
        feature: String,

        /// Message content
        #[arg(value_parser = non_empty_string)]
        content: String,

        /// Message type (text, image, video, audio, file)
        #[arg(long, short = 't', value_parser = parse_message_type, default_value = "text")]
        r#type: MessageType,

        /// Conversation the message belongs to
        #[arg(long)]
        conversation: Option<String>,

        /// Queue for the next sync instead of sending now
        #[arg(long, short)]
        queue: bool,
    },

    /// Flush the offline queue and reconcile leftovers with the server
    Sync,

    /// List a feature's messages, newest first
    List {
        feature: String,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Show messages waiting in the offline queue
    Pending,

    /// Move a failed message back into the offline queue
    Retry { id: String },

    /// Show queue, store, and conflict status
    Status,

    /// Remove messages older than the retention period
    Cleanup {
        /// Days of messages to keep (default: sync.retention_days)
        #[arg(long)]
        days: Option<u32>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Conflicts and features
    // ─────────────────────────────────────────────────────────────────────────
    /// Inspect and resolve sync conflicts
    #[command(subcommand)]
    Conflicts(ConflictsCommand),

    /// Browse and delete local conversations
    #[command(subcommand)]
    Conversations(ConversationsCommand),

    /// List features and talk to them
    #[command(subcommand)]
    Features(FeaturesCommand),

    // ─────────────────────────────────────────────────────────────────────────
    // Setup
    // ─────────────────────────────────────────────────────────────────────────
    /// Write the whole local store to a JSON backup
    Export { path: PathBuf },

    /// Merge a JSON backup into the local store
    Import {
        path: PathBuf,

        /// Clear the local store first
        #[arg(long)]
        replace: bool,
    },

    /// Generate shell completions
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ConflictsCommand {
    /// List unresolved conflicts
    List {
        /// Only conflicts of this type
        #[arg(long, short = 't', value_parser = parse_conflict_type)]
        r#type: Option<ConflictType>,

        /// Include resolved conflicts
        #[arg(long, short)]
        all: bool,
    },

    /// Compare local records with the server
    #[command(after_help = colors::examples("\
Examples:
  tether conflicts detect -m m1,m2        Check two messages
  tether conflicts detect -f chat --resolve  Check and settle a feature"))]
    Detect {
        #[command(flatten)]
        args: DetectArgs,

        /// Resolve new conflicts with the default strategy
        #[arg(long)]
        resolve: bool,
    },

    /// Resolve one conflict
    Resolve {
        id: String,

        /// Strategy to use (default: the configured default)
        #[arg(long, short, value_parser = parse_strategy)]
        strategy: Option<ResolutionStrategy>,
    },

    /// Resolve every pending conflict with the default strategy
    ResolveAll,

    /// Show or set the default strategy
    Strategy {
        /// client_wins, server_wins, keep_both, timestamp_wins, manual_resolution
        #[arg(value_parser = parse_strategy)]
        strategy: Option<ResolutionStrategy>,
    },
}

#[derive(Subcommand)]
pub enum ConversationsCommand {
    /// List a feature's conversations, newest first
    List { feature: String },

    /// Show one conversation
    Show { id: String },

    /// Delete a conversation and its messages
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum FeaturesCommand {
    /// List available features
    List {
        /// Only features of this type
        #[arg(long, short = 't')]
        r#type: Option<String>,
    },

    /// Open a feature and record the access
    Open { id: String },

    /// Recently opened features
    Recent {
        #[arg(short = 'n', long, default_value_t = 5)]
        limit: usize,
    },

    /// Send content straight to a feature
    Send {
        id: String,

        /// One or more messages; several are sent in one call
        #[arg(required = true, value_parser = non_empty_string)]
        content: Vec<String>,
    },
}

#[cfg(test)]
#[path = "../cli_tests/mod.rs"]
mod tests;
