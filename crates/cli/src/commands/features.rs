// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use crate::cli::OutputFormat;
use crate::context::AppContext;
use crate::display::{format_access_line, format_feature_line};
use crate::error::{Error, Result};

use super::{print_json, print_lines};

pub async fn list(ctx: &AppContext, format: OutputFormat, feature_type: Option<&str>) -> Result<()> {
    ctx.features.initialize().await;
    let features = match feature_type {
        Some(t) => ctx.features.features_by_type(t),
        None => ctx.features.features(),
    };
    match format {
        OutputFormat::Json => print_json(&features)?,
        OutputFormat::Text => print_lines(features.iter().map(format_feature_line), "No features"),
    }
    Ok(())
}

pub async fn open(ctx: &AppContext, format: OutputFormat, id: &str) -> Result<()> {
    ctx.features.initialize().await;
    let (feature, access) = ctx.features.open_feature(id)?;
    match format {
        OutputFormat::Json => {
            print_json(&serde_json::json!({ "feature": feature, "access": access }))?
        }
        OutputFormat::Text => {
            println!("{}", format_feature_line(&feature));
            if let Some(access) = access {
                println!("  opened {} time(s)", access.access_count);
            }
        }
    }
    Ok(())
}

pub fn recent(ctx: &AppContext, format: OutputFormat, limit: usize) -> Result<()> {
    let recent = ctx.features.recent_features(limit)?;
    match format {
        OutputFormat::Json => print_json(&recent)?,
        OutputFormat::Text => {
            print_lines(recent.iter().map(format_access_line), "No features opened yet")
        }
    }
    Ok(())
}

/// Send one message, or all of them in a single call when there are several.
pub async fn send(ctx: &AppContext, format: OutputFormat, id: &str, content: &[String]) -> Result<()> {
    if !ctx.network.is_online() {
        return Err(Error::Offline("send to a feature"));
    }
    ctx.features.initialize().await;
    let reply = match content {
        [single] => ctx.features.send_feature_message(id, single).await?,
        many => ctx.features.send_feature_messages(id, many).await?,
    };
    match format {
        OutputFormat::Json => print_json(&reply)?,
        OutputFormat::Text => println!("{}", serde_json::to_string_pretty(&reply)?),
    }
    Ok(())
}
