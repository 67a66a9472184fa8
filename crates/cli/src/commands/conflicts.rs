// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use serde::Serialize;
use tether_core::{AnyConflict, ConflictType, ResolutionStrategy};

use crate::cli::{DetectArgs, OutputFormat};
use crate::context::AppContext;
use crate::display::format_conflict_line;
use crate::error::{Error, Result};
use crate::resolver::{DetectOptions, DetectSummary, Resolution};

use super::{print_json, print_lines};

pub fn list(
    ctx: &AppContext,
    format: OutputFormat,
    conflict_type: Option<ConflictType>,
    all: bool,
) -> Result<Vec<AnyConflict>> {
    let conflicts: Vec<AnyConflict> = if all {
        ctx.resolver
            .all_conflicts()
            .into_iter()
            .filter(|c| conflict_type.is_none_or(|t| c.conflict_type() == t))
            .collect()
    } else {
        ctx.resolver.pending_conflicts(conflict_type)
    };
    match format {
        OutputFormat::Json => print_json(&conflicts)?,
        OutputFormat::Text => {
            print_lines(conflicts.iter().map(format_conflict_line), "No conflicts")
        }
    }
    Ok(conflicts)
}

pub async fn detect(
    ctx: &AppContext,
    format: OutputFormat,
    args: DetectArgs,
    resolve: bool,
) -> Result<DetectSummary> {
    if !ctx.network.is_online() {
        return Err(Error::Offline("detect conflicts"));
    }
    let summary = match args.feature {
        // Feature scans always auto-resolve.
        Some(feature) => ctx.cache.check_and_resolve_conflicts(&feature).await?,
        None => {
            if args.message_ids.is_empty() && args.conversation_ids.is_empty() {
                return Err(Error::InvalidInput(
                    "nothing to check: pass --message, --conversation, or --feature".to_string(),
                ));
            }
            let options = DetectOptions {
                message_ids: args.message_ids,
                conversation_ids: args.conversation_ids,
                auto_resolve: resolve,
            };
            ctx.resolver.detect_conflicts(options).await
        }
    };
    match format {
        OutputFormat::Json => print_json(&summary)?,
        OutputFormat::Text => println!(
            "Detected {} conflict(s): {} resolved, {} left for manual review, {} failed",
            summary.detected, summary.resolved, summary.manual, summary.failed
        ),
    }
    Ok(summary)
}

#[derive(Serialize)]
struct ResolveReport<'a> {
    id: &'a str,
    resolved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    strategy: Option<ResolutionStrategy>,
}

pub async fn resolve(
    ctx: &AppContext,
    format: OutputFormat,
    id: &str,
    strategy: Option<ResolutionStrategy>,
) -> Result<Resolution> {
    if !ctx.network.is_online() && ctx.resolver.requires_network(id, strategy)? {
        return Err(Error::Offline("push this resolution to the server"));
    }
    let resolution = match strategy {
        Some(strategy) => ctx.resolver.resolve_conflict(id, Some(strategy)).await?,
        None => ctx.cache.resolve_conflict(id).await?,
    };
    let report = match resolution {
        Resolution::Resolved(strategy) => ResolveReport { id, resolved: true, strategy: Some(strategy) },
        Resolution::Deferred => ResolveReport { id, resolved: false, strategy: None },
    };
    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => match report.strategy {
            Some(strategy) => println!("Resolved {} with {}", id, strategy),
            None => println!(
                "Left {} for manual resolution\n  hint: pass --strategy to pick a winner",
                id
            ),
        },
    }
    Ok(resolution)
}

pub async fn resolve_all(ctx: &AppContext, format: OutputFormat) -> Result<()> {
    if !ctx.network.is_online() {
        for conflict in ctx.resolver.pending_conflicts(None) {
            if ctx.resolver.requires_network(conflict.id(), None)? {
                return Err(Error::Offline("push conflict resolutions to the server"));
            }
        }
    }
    let summary = ctx.cache.resolve_all_conflicts().await;
    match format {
        OutputFormat::Json => print_json(&summary)?,
        OutputFormat::Text => println!(
            "Resolved {} conflict(s), {} left for manual review, {} failed",
            summary.resolved, summary.manual, summary.failed
        ),
    }
    Ok(())
}

/// Print the default strategy, or set it when one is given.
pub fn strategy(
    ctx: &AppContext,
    format: OutputFormat,
    strategy: Option<ResolutionStrategy>,
) -> Result<ResolutionStrategy> {
    if let Some(strategy) = strategy {
        ctx.resolver.set_default_strategy(strategy)?;
    }
    let current = ctx.resolver.default_strategy();
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({ "defaultStrategy": current }))?,
        OutputFormat::Text => println!("{}", current),
    }
    Ok(current)
}

#[cfg(test)]
#[path = "conflicts_tests.rs"]
mod tests;
