// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use serde::Serialize;
use tether_core::StatusCounts;

use crate::cache::OfflineQueueStatus;
use crate::cli::OutputFormat;
use crate::colors;
use crate::context::AppContext;
use crate::display::format_counts;
use crate::error::Result;
use crate::net::QueueStatus;
use crate::resolver::ConflictStatus;

use super::print_json;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub network: String,
    pub store_available: bool,
    pub offline_queue: OfflineQueueStatus,
    pub requests: QueueStatus,
    pub messages: StatusCounts,
    pub conflicts: ConflictStatus,
}

pub fn collect(ctx: &AppContext) -> Result<StatusReport> {
    Ok(StatusReport {
        network: ctx.network.status().to_string(),
        store_available: ctx.store.is_available(),
        offline_queue: ctx.cache.offline_queue_status(),
        requests: ctx.scheduler.queue_status(),
        messages: ctx.store.count_by_status()?,
        conflicts: ctx.resolver.conflict_status(),
    })
}

pub fn run(ctx: &AppContext, format: OutputFormat) -> Result<()> {
    let report = collect(ctx)?;
    if format == OutputFormat::Json {
        return print_json(&report);
    }

    let store = if report.store_available { "available" } else { "unavailable (no persistence)" };
    let queued = report.offline_queue.count.to_string();
    let queued = if report.offline_queue.count > 0 { colors::warn(&queued) } else { queued };
    println!("{} {}", colors::header("Network:"), report.network);
    println!("{} {}", colors::header("Store:"), store);
    println!("{} {} queued", colors::header("Offline queue:"), queued);
    println!("{} {}", colors::header("Messages:"), format_counts(&report.messages));
    println!(
        "{} {} pending, default strategy {}",
        colors::header("Conflicts:"),
        report.conflicts.pending_count,
        report.conflicts.default_strategy
    );
    Ok(())
}
