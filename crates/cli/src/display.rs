// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Plain-text rendering of messages, conflicts, and other records.

use chrono::{TimeZone, Utc};
use tether_core::{AnyConflict, Conversation, FeatureAccess, Message, StatusCounts};

use crate::feature::Feature;

/// Longest content shown on a one-line listing.
const PREVIEW_WIDTH: usize = 60;

/// Epoch milliseconds as `YYYY-MM-DD HH:MM` UTC.
pub fn format_time(ms: i64) -> String {
    match Utc.timestamp_millis_opt(ms).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => ms.to_string(),
    }
}

/// First line of `content`, cut to `width` characters with an ellipsis.
pub fn preview(content: &str, width: usize) -> String {
    let line = content.lines().next().unwrap_or("");
    let cut = line.chars().count() > width || content.contains('\n');
    if !cut {
        return line.to_string();
    }
    let mut out: String = line.chars().take(width.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

/// `- [status] id  time  content`, plus an indented error line if any.
pub fn format_message_line(msg: &Message) -> Vec<String> {
    let mut lines = vec![format!(
        "- [{}] {}  {}  {}",
        msg.status,
        msg.id,
        format_time(msg.timestamp),
        preview(&msg.content, PREVIEW_WIDTH)
    )];
    if let Some(err) = &msg.error {
        lines.push(format!("    error: {}", err));
    }
    lines
}

pub fn format_conflict_line(conflict: &AnyConflict) -> String {
    let state = match conflict.resolution_strategy() {
        Some(strategy) if conflict.is_resolved() => format!("resolved: {strategy}"),
        _ => "pending".to_string(),
    };
    format!(
        "- [{}] {} {}  {}  ({})",
        conflict.conflict_type(),
        conflict.kind(),
        conflict.id(),
        format_time(conflict.timestamp()),
        state
    )
}

pub fn format_conversation_line(conv: &Conversation) -> String {
    let mut line = format!("- {}  {}  {}", conv.id, format_time(conv.timestamp), conv.title);
    if let Some(last) = &conv.last_message {
        line.push_str(&format!("  \"{}\"", preview(last, 40)));
    }
    line
}

pub fn format_feature_line(feature: &Feature) -> String {
    let mut line = format!("- {} ({})  {}", feature.id, feature.feature_type, feature.name);
    if feature.disabled {
        line.push_str("  [disabled]");
    }
    line
}

pub fn format_access_line(access: &FeatureAccess) -> String {
    format!(
        "- {}  {}  opened {}x, last {}",
        access.feature_id,
        access.feature_name,
        access.access_count,
        format_time(access.last_access)
    )
}

/// `3 pending, 10 sent, 0 received, 1 failed`
pub fn format_counts(counts: &StatusCounts) -> String {
    format!(
        "{} pending, {} sent, {} received, {} failed",
        counts.pending, counts.sent, counts.received, counts.failed
    )
}

#[cfg(test)]
#[path = "display_tests.rs"]
mod tests;
