// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Conflict records and the rules for settling them.
//!
//! A conflict pairs a client-held and a server-held version of the same
//! entity. A missing version means the entity was deleted on that side, and
//! at least one side is always present.
//!
//! Resolution is split in two: [`Conflict::plan`] decides what must happen
//! (pure), and the caller carries out the returned [`Step`]s against the
//! local store and the server.
//!
//! Rules when both versions exist:
//! - client_wins: push the client version to the server
//! - server_wins: overwrite the local copy with the server version
//! - keep_both: store the server version locally as `<id>_server_copy`
//! - timestamp_wins: the strictly newer client version wins, else the server
//! - manual_resolution: nothing happens and the conflict stays pending
//!
//! Rules when one side was deleted:
//! - client_wins: propagate the client's deletion, or restore the server
//! - server_wins: apply the server's deletion locally, or restore locally
//! - keep_both: copy the surviving version under `<id>_client_copy` or
//!   `<id>_server_copy`
//! - timestamp_wins: compare timestamps with the deleted side at 0 and apply
//!   the winner both locally and, for a client win, on the server

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::model::{Conversation, Message};

/// What kind of divergence a conflict records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    MessageContent,
    MessageStatus,
    ConversationData,
    DeletionConflict,
}

impl ConflictType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictType::MessageContent => "message_content",
            ConflictType::MessageStatus => "message_status",
            ConflictType::ConversationData => "conversation_data",
            ConflictType::DeletionConflict => "deletion_conflict",
        }
    }
}

impl fmt::Display for ConflictType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ConflictType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "message_content" => Ok(ConflictType::MessageContent),
            "message_status" => Ok(ConflictType::MessageStatus),
            "conversation_data" => Ok(ConflictType::ConversationData),
            "deletion_conflict" | "deletion" => Ok(ConflictType::DeletionConflict),
            _ => Err(Error::InvalidConflictType(s.to_string())),
        }
    }
}

/// Rule used to settle a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStrategy {
    ClientWins,
    ServerWins,
    KeepBoth,
    #[default]
    TimestampWins,
    ManualResolution,
}

impl ResolutionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionStrategy::ClientWins => "client_wins",
            ResolutionStrategy::ServerWins => "server_wins",
            ResolutionStrategy::KeepBoth => "keep_both",
            ResolutionStrategy::TimestampWins => "timestamp_wins",
            ResolutionStrategy::ManualResolution => "manual_resolution",
        }
    }

    pub fn is_manual(&self) -> bool {
        matches!(self, ResolutionStrategy::ManualResolution)
    }
}

impl fmt::Display for ResolutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ResolutionStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "client_wins" | "client" => Ok(ResolutionStrategy::ClientWins),
            "server_wins" | "server" => Ok(ResolutionStrategy::ServerWins),
            "keep_both" => Ok(ResolutionStrategy::KeepBoth),
            "timestamp_wins" | "timestamp" => Ok(ResolutionStrategy::TimestampWins),
            "manual_resolution" | "manual" => Ok(ResolutionStrategy::ManualResolution),
            _ => Err(Error::UnsupportedStrategy(s.to_string())),
        }
    }
}

/// Which store and endpoint family a conflict belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Message,
    Conversation,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Message => "message",
            EntityKind::Conversation => "conversation",
        }
    }

    /// Conflict types that make sense for this entity.
    fn accepts(&self, conflict_type: ConflictType) -> bool {
        match self {
            EntityKind::Message => matches!(
                conflict_type,
                ConflictType::MessageContent
                    | ConflictType::MessageStatus
                    | ConflictType::DeletionConflict
            ),
            EntityKind::Conversation => matches!(
                conflict_type,
                ConflictType::ConversationData | ConflictType::DeletionConflict
            ),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An entity that can sit on either side of a conflict.
pub trait Versioned: Clone {
    const KIND: EntityKind;

    fn id(&self) -> &str;

    /// Last-modified time in epoch milliseconds.
    fn timestamp(&self) -> i64;

    /// The same record stored under another id.
    fn copy_as(&self, id: String) -> Self;
}

impl Versioned for Message {
    const KIND: EntityKind = EntityKind::Message;

    fn id(&self) -> &str {
        &self.id
    }

    fn timestamp(&self) -> i64 {
        self.timestamp
    }

    fn copy_as(&self, id: String) -> Self {
        self.with_id(id)
    }
}

impl Versioned for Conversation {
    const KIND: EntityKind = EntityKind::Conversation;

    fn id(&self) -> &str {
        &self.id
    }

    fn timestamp(&self) -> i64 {
        self.timestamp
    }

    fn copy_as(&self, id: String) -> Self {
        self.with_id(id)
    }
}

/// A detected divergence between client and server versions of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict<T> {
    /// Same as the id of the entity it concerns.
    pub id: String,
    #[serde(rename = "type")]
    pub conflict_type: ConflictType,
    /// `None` means deleted on the client.
    pub client_version: Option<T>,
    /// `None` means deleted on the server.
    pub server_version: Option<T>,
    pub timestamp: i64,
    pub resolved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution_strategy: Option<ResolutionStrategy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Which side a timestamp comparison favours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winner {
    Client,
    Server,
}

/// One effect of resolving a conflict.
#[derive(Debug, Clone, PartialEq)]
pub enum Step<T> {
    /// PUT the version to the server.
    PushUpsert(T),
    /// DELETE the entity on the server.
    PushDelete(String),
    /// Write the version to the local store.
    StoreUpsert(T),
    /// Remove the entity from the local store.
    StoreDelete(String),
}

impl<T> Step<T> {
    /// True for steps that call the server.
    pub fn is_remote(&self) -> bool {
        matches!(self, Step::PushUpsert(_) | Step::PushDelete(_))
    }
}

impl<T: Versioned> Conflict<T> {
    /// Creates an unresolved conflict. Fails if both versions are missing or
    /// the type does not fit the entity.
    pub fn new(
        id: impl Into<String>,
        conflict_type: ConflictType,
        client_version: Option<T>,
        server_version: Option<T>,
        now_ms: i64,
    ) -> Result<Self> {
        let id = id.into();
        if client_version.is_none() && server_version.is_none() {
            return Err(Error::EmptyConflict(id));
        }
        if !T::KIND.accepts(conflict_type) {
            return Err(Error::InvalidConflictType(format!("{conflict_type} (for a {})", T::KIND)));
        }
        Ok(Conflict {
            id,
            conflict_type,
            client_version,
            server_version,
            timestamp: now_ms,
            resolved: false,
            resolution_strategy: None,
            metadata: None,
        })
    }

    /// True when one side has been deleted.
    pub fn is_deletion(&self) -> bool {
        self.client_version.is_none() || self.server_version.is_none()
    }

    /// Compares last-modified times, counting a deleted side as 0. Ties go
    /// to the server.
    pub fn timestamp_winner(&self) -> Winner {
        let client = self.client_version.as_ref().map_or(0, T::timestamp);
        let server = self.server_version.as_ref().map_or(0, T::timestamp);
        if client > server {
            Winner::Client
        } else {
            Winner::Server
        }
    }

    /// Decides the effects of resolving with `strategy`. An empty plan
    /// means nothing changes (manual resolution).
    pub fn plan(&self, strategy: ResolutionStrategy) -> Result<Vec<Step<T>>> {
        match (&self.client_version, &self.server_version) {
            (Some(client), Some(server)) => Ok(self.plan_divergent(client, server, strategy)),
            (client, server) => self.plan_deletion(client.as_ref(), server.as_ref(), strategy),
        }
    }

    fn plan_divergent(&self, client: &T, server: &T, strategy: ResolutionStrategy) -> Vec<Step<T>> {
        match strategy {
            ResolutionStrategy::ClientWins => vec![Step::PushUpsert(client.clone())],
            ResolutionStrategy::ServerWins => vec![Step::StoreUpsert(server.clone())],
            ResolutionStrategy::KeepBoth => {
                vec![Step::StoreUpsert(server.copy_as(format!("{}_server_copy", self.id)))]
            }
            ResolutionStrategy::TimestampWins => match self.timestamp_winner() {
                Winner::Client => vec![Step::PushUpsert(client.clone())],
                Winner::Server => vec![Step::StoreUpsert(server.clone())],
            },
            ResolutionStrategy::ManualResolution => Vec::new(),
        }
    }

    fn plan_deletion(
        &self,
        client: Option<&T>,
        server: Option<&T>,
        strategy: ResolutionStrategy,
    ) -> Result<Vec<Step<T>>> {
        let id = self.id.clone();
        let steps = match strategy {
            ResolutionStrategy::ClientWins => match client {
                None => vec![Step::PushDelete(id)],
                Some(c) => vec![Step::PushUpsert(c.clone())],
            },
            ResolutionStrategy::ServerWins => match server {
                None => vec![Step::StoreDelete(id)],
                Some(s) => vec![Step::StoreUpsert(s.clone())],
            },
            ResolutionStrategy::KeepBoth => match (client, server) {
                (Some(c), None) => vec![Step::StoreUpsert(c.copy_as(format!("{id}_client_copy")))],
                (None, Some(s)) => vec![Step::StoreUpsert(s.copy_as(format!("{id}_server_copy")))],
                _ => return Err(Error::EmptyConflict(id)),
            },
            ResolutionStrategy::TimestampWins => match (self.timestamp_winner(), client, server) {
                (Winner::Client, None, _) => vec![Step::StoreDelete(id.clone()), Step::PushDelete(id)],
                (Winner::Client, Some(c), _) => {
                    vec![Step::StoreUpsert(c.clone()), Step::PushUpsert(c.clone())]
                }
                (Winner::Server, _, None) => vec![Step::StoreDelete(id)],
                (Winner::Server, _, Some(s)) => vec![Step::StoreUpsert(s.clone())],
            },
            ResolutionStrategy::ManualResolution => Vec::new(),
        };
        Ok(steps)
    }

    pub fn mark_resolved(&mut self, strategy: ResolutionStrategy) {
        self.resolved = true;
        self.resolution_strategy = Some(strategy);
    }
}

/// A conflict over either kind of entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entity", rename_all = "snake_case")]
pub enum AnyConflict {
    Message(Conflict<Message>),
    Conversation(Conflict<Conversation>),
}

impl AnyConflict {
    pub fn id(&self) -> &str {
        match self {
            AnyConflict::Message(c) => &c.id,
            AnyConflict::Conversation(c) => &c.id,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            AnyConflict::Message(_) => EntityKind::Message,
            AnyConflict::Conversation(_) => EntityKind::Conversation,
        }
    }

    pub fn conflict_type(&self) -> ConflictType {
        match self {
            AnyConflict::Message(c) => c.conflict_type,
            AnyConflict::Conversation(c) => c.conflict_type,
        }
    }

    pub fn timestamp(&self) -> i64 {
        match self {
            AnyConflict::Message(c) => c.timestamp,
            AnyConflict::Conversation(c) => c.timestamp,
        }
    }

    pub fn is_resolved(&self) -> bool {
        match self {
            AnyConflict::Message(c) => c.resolved,
            AnyConflict::Conversation(c) => c.resolved,
        }
    }

    pub fn resolution_strategy(&self) -> Option<ResolutionStrategy> {
        match self {
            AnyConflict::Message(c) => c.resolution_strategy,
            AnyConflict::Conversation(c) => c.resolution_strategy,
        }
    }

    pub fn is_deletion(&self) -> bool {
        match self {
            AnyConflict::Message(c) => c.is_deletion(),
            AnyConflict::Conversation(c) => c.is_deletion(),
        }
    }

    pub fn mark_resolved(&mut self, strategy: ResolutionStrategy) {
        match self {
            AnyConflict::Message(c) => c.mark_resolved(strategy),
            AnyConflict::Conversation(c) => c.mark_resolved(strategy),
        }
    }
}

impl From<Conflict<Message>> for AnyConflict {
    fn from(c: Conflict<Message>) -> Self {
        AnyConflict::Message(c)
    }
}

impl From<Conflict<Conversation>> for AnyConflict {
    fn from(c: Conflict<Conversation>) -> Self {
        AnyConflict::Conversation(c)
    }
}

/// Classifies how a local and server message differ, if at all.
pub fn message_divergence(local: Option<&Message>, server: Option<&Message>) -> Option<ConflictType> {
    match (local, server) {
        (None, None) => None,
        (None, Some(_)) | (Some(_), None) => Some(ConflictType::DeletionConflict),
        (Some(l), Some(s)) if l.content != s.content => Some(ConflictType::MessageContent),
        (Some(l), Some(s)) if l.status != s.status => Some(ConflictType::MessageStatus),
        _ => None,
    }
}

/// Classifies how a local and server conversation differ, if at all.
pub fn conversation_divergence(
    local: Option<&Conversation>,
    server: Option<&Conversation>,
) -> Option<ConflictType> {
    match (local, server) {
        (None, None) => None,
        (None, Some(_)) | (Some(_), None) => Some(ConflictType::DeletionConflict),
        (Some(l), Some(s)) if l.title != s.title || l.last_message != s.last_message => {
            Some(ConflictType::ConversationData)
        }
        _ => None,
    }
}

#[cfg(test)]
#[path = "conflict_tests.rs"]
mod tests;
