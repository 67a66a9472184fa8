// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Core record types: messages, conversations, and feature access.
//!
//! Field names serialize in camelCase so records round-trip with the server's
//! JSON without translation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::timestamp::{deserialize_millis, deserialize_opt_millis, now_millis, Clock, TimeInput};

/// Kind of payload a message carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    #[default]
    Text,
    Image,
    Video,
    Audio,
    File,
}

impl MessageType {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Text => "text",
            MessageType::Image => "image",
            MessageType::Video => "video",
            MessageType::Audio => "audio",
            MessageType::File => "file",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(MessageType::Text),
            "image" => Ok(MessageType::Image),
            "video" => Ok(MessageType::Video),
            "audio" => Ok(MessageType::Audio),
            "file" => Ok(MessageType::File),
            _ => Err(Error::InvalidMessageType(s.to_string())),
        }
    }
}

/// Which side authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageSource {
    #[default]
    Mobile,
    Server,
}

impl MessageSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageSource::Mobile => "mobile",
            MessageSource::Server => "server",
        }
    }
}

impl fmt::Display for MessageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MessageSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "mobile" => Ok(MessageSource::Mobile),
            "server" => Ok(MessageSource::Server),
            _ => Err(Error::InvalidSource(s.to_string())),
        }
    }
}

/// Delivery status of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    /// Written locally, not yet accepted by the server.
    #[default]
    Pending,
    /// Accepted by the server.
    Sent,
    /// Delivered to the recipient.
    Received,
    /// Delivery failed; only an explicit retry moves it back to pending.
    Failed,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Pending => "pending",
            MessageStatus::Sent => "sent",
            MessageStatus::Received => "received",
            MessageStatus::Failed => "failed",
        }
    }

    /// Status only moves forward, except `failed -> pending` for a retry.
    /// Staying put is always allowed.
    pub fn can_transition_to(&self, target: MessageStatus) -> bool {
        use MessageStatus::*;
        *self == target
            || matches!(
                (self, target),
                (Pending, Sent | Received | Failed) | (Sent, Received) | (Failed, Pending)
            )
    }

    /// Get valid transition targets as a formatted string.
    pub fn valid_targets(&self) -> String {
        match self {
            MessageStatus::Pending => "sent, received, failed".to_string(),
            MessageStatus::Sent => "received".to_string(),
            MessageStatus::Received => "(none)".to_string(),
            MessageStatus::Failed => "pending (retry)".to_string(),
        }
    }

    /// True for statuses that belong in the offline queue.
    pub fn is_unsent(&self) -> bool {
        matches!(self, MessageStatus::Pending | MessageStatus::Failed)
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MessageStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(MessageStatus::Pending),
            "sent" => Ok(MessageStatus::Sent),
            "received" => Ok(MessageStatus::Received),
            "failed" => Ok(MessageStatus::Failed),
            _ => Err(Error::InvalidStatus(s.to_string())),
        }
    }
}

/// Attached image/video/audio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaInfo {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// Attached file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
    pub url: String,
}

/// A chat, note, or LLM message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub feature_id: String,
    pub content: String,
    #[serde(rename = "type", default)]
    pub message_type: MessageType,
    #[serde(default)]
    pub source: MessageSource,
    #[serde(default)]
    pub status: MessageStatus,
    /// Epoch milliseconds.
    #[serde(default = "now_millis", deserialize_with = "deserialize_millis")]
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<FileInfo>,
    /// Weak reference to a conversation; lookup only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub synced: bool,
}

impl Message {
    /// Creates a pending text message authored on this device.
    pub fn new(
        id: impl Into<String>,
        feature_id: impl Into<String>,
        content: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Message {
            id: id.into(),
            feature_id: feature_id.into(),
            content: content.into(),
            message_type: MessageType::Text,
            source: MessageSource::Mobile,
            status: MessageStatus::Pending,
            timestamp,
            error: None,
            media: None,
            file: None,
            conversation_id: None,
            synced: false,
        }
    }

    /// Returns a copy of this message stored under a different id.
    pub fn with_id(&self, id: impl Into<String>) -> Self {
        Message { id: id.into(), ..self.clone() }
    }
}

/// A partial update to a message. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePatch {
    pub content: Option<String>,
    pub status: Option<MessageStatus>,
    pub timestamp: Option<TimeInput>,
    /// `Some(None)` clears the error.
    pub error: Option<Option<String>>,
    pub synced: Option<bool>,
    pub conversation_id: Option<String>,
    pub media: Option<MediaInfo>,
    pub file: Option<FileInfo>,
}

impl MessagePatch {
    pub fn status(status: MessageStatus) -> Self {
        MessagePatch { status: Some(status), ..Default::default() }
    }

    /// Marks a message as accepted by the server.
    pub fn delivered() -> Self {
        MessagePatch {
            status: Some(MessageStatus::Sent),
            synced: Some(true),
            error: Some(None),
            ..Default::default()
        }
    }

    /// Marks a message as failed with a human-readable reason.
    pub fn failed(reason: impl Into<String>) -> Self {
        MessagePatch {
            status: Some(MessageStatus::Failed),
            error: Some(Some(reason.into())),
            ..Default::default()
        }
    }

    /// Applies the patch, rejecting backward status moves.
    pub fn apply(&self, message: &mut Message, clock: &dyn Clock) -> Result<()> {
        if let Some(target) = self.status {
            if !message.status.can_transition_to(target) {
                return Err(Error::InvalidTransition {
                    from: message.status.to_string(),
                    to: target.to_string(),
                    valid_targets: message.status.valid_targets(),
                });
            }
            message.status = target;
        }
        if let Some(content) = &self.content {
            message.content = content.clone();
        }
        if let Some(ts) = &self.timestamp {
            message.timestamp = ts.resolve(clock);
        }
        if let Some(error) = &self.error {
            message.error = error.clone();
        }
        if let Some(synced) = self.synced {
            message.synced = synced;
        }
        if let Some(conversation_id) = &self.conversation_id {
            message.conversation_id = Some(conversation_id.clone());
        }
        if let Some(media) = &self.media {
            message.media = Some(media.clone());
        }
        if let Some(file) = &self.file {
            message.file = Some(file.clone());
        }
        Ok(())
    }
}

/// A conversation thread. Messages point at it; it owns none of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub title: String,
    #[serde(default = "now_millis", deserialize_with = "deserialize_millis")]
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_opt_millis",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_message_timestamp: Option<i64>,
    pub feature_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

impl Conversation {
    pub fn new(
        id: impl Into<String>,
        feature_id: impl Into<String>,
        title: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Conversation {
            id: id.into(),
            title: title.into(),
            timestamp,
            last_message: None,
            last_message_timestamp: None,
            feature_id: feature_id.into(),
            metadata: None,
        }
    }

    pub fn with_id(&self, id: impl Into<String>) -> Self {
        Conversation { id: id.into(), ..self.clone() }
    }
}

/// Usage record for one feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureAccess {
    pub feature_id: String,
    pub feature_name: String,
    #[serde(default = "now_millis", deserialize_with = "deserialize_millis")]
    pub last_access: i64,
    pub access_count: u64,
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
