// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Server wire contract: endpoint paths and request/response bodies.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tether_core::{EntityKind, Message};

pub const MESSAGES: &str = "/api/messages";
pub const MESSAGES_SYNC: &str = "/api/messages/sync";
pub const FEATURES: &str = "/api/features";

fn collection(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Message => "/api/messages",
        EntityKind::Conversation => "/api/conversations",
    }
}

/// `PUT`/`DELETE` target for one entity.
pub fn entity_path(kind: EntityKind, id: &str) -> String {
    format!("{}/{}", collection(kind), id)
}

/// Batch fetch endpoint for a kind of entity.
pub fn batch_path(kind: EntityKind) -> String {
    format!("{}/batch", collection(kind))
}

pub fn feature_message_path(feature_id: &str) -> String {
    format!("{FEATURES}/{feature_id}/message")
}

pub fn feature_messages_path(feature_id: &str) -> String {
    format!("{FEATURES}/{feature_id}/messages")
}

/// Body of `POST /api/messages/sync`.
#[derive(Debug, Serialize)]
pub struct SyncRequest<'a> {
    pub messages: &'a [Message],
}

/// Response of `POST /api/messages/sync`.
///
/// `failed` is optional; servers that only report accepted ids leave the rest
/// pending for the next pass.
#[derive(Debug, Default, Deserialize)]
pub struct SyncResponse {
    #[serde(default)]
    pub success: Vec<String>,
    #[serde(default)]
    pub failed: HashMap<String, String>,
}

/// Body of the batch fetch endpoints. The response maps id to entity, with
/// `null` or a missing key meaning the server has no such entity.
#[derive(Debug, Serialize)]
pub struct BatchRequest<'a> {
    pub ids: &'a [String],
}

/// One message to a feature. The multi-message endpoint takes an array.
#[derive(Debug, Serialize)]
pub struct FeatureMessageRequest<'a> {
    pub content: &'a str,
}

#[cfg(test)]
#[path = "api_tests.rs"]
mod tests;
