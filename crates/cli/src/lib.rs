// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! tether - offline-first message sync client.
//!
//! Messages are written to a local SQLite store first, then sent through a
//! prioritized request scheduler when the network allows. Messages that could
//! not be sent wait in an offline queue until the next sync; records that
//! changed on both sides are reconciled by the conflict resolver.
//!
//! # Main Components
//!
//! - [`LocalStore`] - SQLite persistence that degrades to a no-op store
//! - [`Scheduler`] - priority queue of HTTP requests with retries and a concurrency cap
//! - [`ConflictResolver`] - detects and settles client/server divergence
//! - [`MessageCache`] - send-or-queue entry point and offline sync
//! - [`AppContext`] - wires all of the above from a [`Config`]
//!
//! ```rust,ignore
//! use tether::{AppContext, Config, HttpTransport, MessageDraft, NetworkStatus};
//!
//! let config = Config::load_or_default(&tether::config::config_path(None))?;
//! let transport = Arc::new(HttpTransport::new(config.server.base_url.clone())?);
//! let mut ctx = AppContext::build(config, transport, Arc::new(SystemClock), NetworkStatus::Online);
//! ctx.start();
//! ctx.cache.add_message(MessageDraft::new("chat", "hello"), false).await?;
//! ctx.shutdown().await;
//! ```

mod cli;
pub mod colors;
mod commands;
mod display;
pub mod env;
pub mod help;

pub mod api;
pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod feature;
pub mod net;
pub mod resolver;
pub mod store;

#[cfg(test)]
mod test_helpers;

pub use cache::{MessageCache, MessageDraft, OfflineQueueStatus, SyncSummary};
pub use cli::{
    Cli, Command, ConflictsCommand, ConversationsCommand, DetectArgs, FeaturesCommand,
    OutputFormat, PageArgs,
};
pub use config::Config;
pub use context::AppContext;
pub use error::{Error, Result};
pub use feature::{Feature, FeatureRegistry};
pub use net::{HttpTransport, NetworkMonitor, NetworkStatus, Priority, RequestConfig, Scheduler};
pub use resolver::{ConflictResolver, Resolution};
pub use store::LocalStore;

use std::sync::Arc;

use clap::CommandFactory;
use clap_complete::generate;
use tether_core::SystemClock;

/// Load the configuration, build the context, and run one command.
pub async fn run(cli: Cli) -> Result<()> {
    if let Command::Completion { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "tether", &mut std::io::stdout());
        return Ok(());
    }

    let path = config::config_path(cli.config.as_deref());
    let config = Config::load_or_default(&path)?.with_env_overrides();
    config.validate()?;

    let transport = Arc::new(HttpTransport::new(config.server.base_url.clone())?);
    let initial = if cli.offline { NetworkStatus::Offline } else { NetworkStatus::Online };
    let ctx = AppContext::build(config, transport, Arc::new(SystemClock), initial);

    let result = dispatch(&ctx, cli.output, cli.command).await;
    ctx.shutdown().await;
    result
}

async fn dispatch(ctx: &AppContext, format: OutputFormat, command: Command) -> Result<()> {
    match command {
        Command::Send { feature, content, r#type, conversation, queue } => {
            commands::messages::send(ctx, format, feature, content, r#type, conversation, queue)
                .await?;
        }
        Command::Sync => {
            commands::messages::sync(ctx, format).await?;
        }
        Command::List { feature, page } => commands::messages::list(ctx, format, &feature, &page)?,
        Command::Pending => commands::messages::pending(ctx, format)?,
        Command::Retry { id } => commands::messages::retry(ctx, format, &id)?,
        Command::Status => commands::status::run(ctx, format)?,
        Command::Cleanup { days } => {
            commands::messages::cleanup(ctx, format, days)?;
        }
        Command::Conflicts(cmd) => match cmd {
            ConflictsCommand::List { r#type, all } => {
                commands::conflicts::list(ctx, format, r#type, all)?;
            }
            ConflictsCommand::Detect { args, resolve } => {
                commands::conflicts::detect(ctx, format, args, resolve).await?;
            }
            ConflictsCommand::Resolve { id, strategy } => {
                commands::conflicts::resolve(ctx, format, &id, strategy).await?;
            }
            ConflictsCommand::ResolveAll => commands::conflicts::resolve_all(ctx, format).await?,
            ConflictsCommand::Strategy { strategy } => {
                commands::conflicts::strategy(ctx, format, strategy)?;
            }
        },
        Command::Conversations(cmd) => match cmd {
            ConversationsCommand::List { feature } => {
                commands::conversations::list(ctx, format, &feature)?
            }
            ConversationsCommand::Show { id } => commands::conversations::show(ctx, format, &id)?,
            ConversationsCommand::Delete { id } => {
                commands::conversations::delete(ctx, format, &id)?;
            }
        },
        Command::Features(cmd) => match cmd {
            FeaturesCommand::List { r#type } => {
                commands::features::list(ctx, format, r#type.as_deref()).await?
            }
            FeaturesCommand::Open { id } => commands::features::open(ctx, format, &id).await?,
            FeaturesCommand::Recent { limit } => commands::features::recent(ctx, format, limit)?,
            FeaturesCommand::Send { id, content } => {
                commands::features::send(ctx, format, &id, &content).await?
            }
        },
        Command::Export { path } => {
            commands::backup::export(ctx, format, &path)?;
        }
        Command::Import { path, replace } => {
            commands::backup::import(ctx, format, &path, replace)?;
        }
        Command::Completion { .. } => {}
    }
    Ok(())
}
