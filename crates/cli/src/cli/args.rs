// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared argument structs for CLI commands, used with `#[command(flatten)]`.

use clap::Args;

/// Pagination arguments.
#[derive(Args, Clone, Debug, Default)]
pub struct PageArgs {
    /// Maximum number of results (default: 20)
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Number of newest results to skip
    #[arg(long)]
    pub offset: Option<usize>,
}

/// Which server records to compare during conflict detection.
#[derive(Args, Clone, Debug, Default)]
pub struct DetectArgs {
    /// Message ids to check (comma-separated or repeated)
    #[arg(long = "message", short = 'm', value_delimiter = ',', value_name = "ID")]
    pub message_ids: Vec<String>,

    /// Conversation ids to check (comma-separated or repeated)
    #[arg(long = "conversation", short = 'c', value_delimiter = ',', value_name = "ID")]
    pub conversation_ids: Vec<String>,

    /// Check the newest messages of a feature instead of explicit ids
    #[arg(long, short = 'f', conflicts_with_all = ["message_ids", "conversation_ids"])]
    pub feature: Option<String>,
}
