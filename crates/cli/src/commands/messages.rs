// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use serde::Serialize;
use tether_core::{Message, MessageStatus, MessageType};

use crate::cache::{MessageDraft, SyncSummary};
use crate::cli::{OutputFormat, PageArgs};
use crate::context::AppContext;
use crate::display::format_message_line;
use crate::error::{Error, Result};

use super::{print_json, print_lines};

pub async fn send(
    ctx: &AppContext,
    format: OutputFormat,
    feature: String,
    content: String,
    message_type: MessageType,
    conversation: Option<String>,
    queue: bool,
) -> Result<Message> {
    let draft = MessageDraft {
        message_type,
        conversation_id: conversation,
        ..MessageDraft::new(feature, content)
    };
    let msg = ctx.cache.add_message(draft, queue).await?;
    match format {
        OutputFormat::Json => print_json(&msg)?,
        OutputFormat::Text => match msg.status {
            MessageStatus::Pending if msg.error.is_some() => {
                println!("Queued {} (send failed, will retry on sync)", msg.id)
            }
            MessageStatus::Pending => println!("Queued {}", msg.id),
            _ => println!("Sent {}", msg.id),
        },
    }
    Ok(msg)
}

pub async fn sync(ctx: &AppContext, format: OutputFormat) -> Result<SyncSummary> {
    if !ctx.network.is_online() {
        return Err(Error::Offline("sync"));
    }
    let summary = ctx.cache.sync_offline_messages().await;
    match format {
        OutputFormat::Json => print_json(&summary)?,
        OutputFormat::Text => println!(
            "Synced {} message(s), {} failed, {} conflict(s)",
            summary.success, summary.failed, summary.conflicts
        ),
    }
    Ok(summary)
}

pub fn list(ctx: &AppContext, format: OutputFormat, feature: &str, page: &PageArgs) -> Result<()> {
    let messages = ctx.cache.messages_by_feature(feature, page.limit, page.offset)?;
    match format {
        OutputFormat::Json => print_json(&messages)?,
        OutputFormat::Text => {
            print_lines(messages.iter().flat_map(format_message_line), "No messages")
        }
    }
    Ok(())
}

pub fn pending(ctx: &AppContext, format: OutputFormat) -> Result<()> {
    let messages = ctx.store.pending_messages()?;
    match format {
        OutputFormat::Json => print_json(&messages)?,
        OutputFormat::Text => {
            print_lines(messages.iter().flat_map(format_message_line), "Offline queue is empty")
        }
    }
    Ok(())
}

pub fn retry(ctx: &AppContext, format: OutputFormat, id: &str) -> Result<()> {
    let msg = ctx.cache.retry_message(id)?;
    match format {
        OutputFormat::Json => print_json(&msg)?,
        OutputFormat::Text => println!("Queued {} for retry", msg.id),
    }
    Ok(())
}

#[derive(Serialize)]
struct CleanupReport {
    removed: usize,
    days: u32,
}

pub fn cleanup(ctx: &AppContext, format: OutputFormat, days: Option<u32>) -> Result<usize> {
    let days = days.unwrap_or(ctx.config.sync.retention_days);
    let removed = ctx.cache.cleanup_old_messages(Some(days))?;
    match format {
        OutputFormat::Json => print_json(&CleanupReport { removed, days })?,
        OutputFormat::Text => println!("Removed {} message(s) older than {} days", removed, days),
    }
    Ok(removed)
}

#[cfg(test)]
#[path = "messages_tests.rs"]
mod tests;
