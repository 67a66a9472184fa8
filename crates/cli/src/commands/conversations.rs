// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use crate::cli::OutputFormat;
use crate::context::AppContext;
use crate::display::{format_conversation_line, format_time};
use crate::error::{Error, Result};

use super::{print_json, print_lines};

pub fn list(ctx: &AppContext, format: OutputFormat, feature: &str) -> Result<()> {
    let conversations = ctx.store.conversations_by_feature(feature)?;
    match format {
        OutputFormat::Json => print_json(&conversations)?,
        OutputFormat::Text => print_lines(
            conversations.iter().map(format_conversation_line),
            "No conversations",
        ),
    }
    Ok(())
}

pub fn show(ctx: &AppContext, format: OutputFormat, id: &str) -> Result<()> {
    let conv = ctx
        .store
        .get_conversation(id)?
        .ok_or_else(|| Error::Core(tether_core::Error::ConversationNotFound(id.to_string())))?;
    if format == OutputFormat::Json {
        return print_json(&conv);
    }
    println!("{}  {}", conv.id, conv.title);
    println!("Feature: {}", conv.feature_id);
    println!("Created: {}", format_time(conv.timestamp));
    if let Some(last) = &conv.last_message {
        let at = conv.last_message_timestamp.map(format_time).unwrap_or_default();
        println!("Last message: {}  {}", at, last);
    }
    Ok(())
}

/// Delete a conversation and every message that points at it.
pub fn delete(ctx: &AppContext, format: OutputFormat, id: &str) -> Result<usize> {
    if ctx.store.get_conversation(id)?.is_none() {
        return Err(Error::Core(tether_core::Error::ConversationNotFound(id.to_string())));
    }
    let removed = ctx.store.delete_conversation(id)?;
    ctx.cache.reload_queue()?;
    match format {
        OutputFormat::Json => {
            print_json(&serde_json::json!({ "id": id, "messagesRemoved": removed }))?
        }
        OutputFormat::Text => println!("Deleted {} and {} message(s)", id, removed),
    }
    Ok(removed)
}
