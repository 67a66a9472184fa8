// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed local store.
//!
//! The [`Database`] struct provides durable keyed storage for messages,
//! conversations, feature access records, and settings, with secondary
//! indices for the by-feature, by-timestamp, and by-status lookups the sync
//! engine relies on.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::{Conversation, FeatureAccess, Message, MessagePatch, MessageStatus};
use crate::snapshot::Snapshot;
use crate::timestamp::Clock;

/// SQL schema for the local store.
pub const SCHEMA: &str = r#"
-- Messages; conversation_id is a weak reference, not a foreign key
CREATE TABLE IF NOT EXISTS messages (
    id TEXT PRIMARY KEY,
    feature_id TEXT NOT NULL,
    content TEXT NOT NULL,
    type TEXT NOT NULL DEFAULT 'text',
    source TEXT NOT NULL DEFAULT 'mobile',
    status TEXT NOT NULL DEFAULT 'pending',
    timestamp INTEGER NOT NULL,
    error TEXT,
    media TEXT,                  -- JSON
    file TEXT,                   -- JSON
    conversation_id TEXT,
    synced INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS conversations (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    timestamp INTEGER NOT NULL,
    last_message TEXT,
    last_message_timestamp INTEGER,
    feature_id TEXT NOT NULL,
    metadata TEXT                -- JSON object
);

CREATE TABLE IF NOT EXISTS feature_access (
    feature_id TEXT PRIMARY KEY,
    feature_name TEXT NOT NULL,
    last_access INTEGER NOT NULL,
    access_count INTEGER NOT NULL DEFAULT 0
);

-- Arbitrary JSON values keyed by name
CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_messages_feature ON messages(feature_id, timestamp DESC, id DESC);
CREATE INDEX IF NOT EXISTS idx_messages_timestamp ON messages(timestamp);
CREATE INDEX IF NOT EXISTS idx_messages_status ON messages(status);
CREATE INDEX IF NOT EXISTS idx_messages_conversation ON messages(conversation_id);
CREATE INDEX IF NOT EXISTS idx_conversations_timestamp ON conversations(timestamp DESC);
CREATE INDEX IF NOT EXISTS idx_conversations_feature ON conversations(feature_id, timestamp DESC);
CREATE INDEX IF NOT EXISTS idx_feature_access_last ON feature_access(last_access DESC);
"#;

const MESSAGE_COLUMNS: &str = "id, feature_id, content, type, source, status, timestamp, error,
     media, file, conversation_id, synced";

const CONVERSATION_COLUMNS: &str =
    "id, title, timestamp, last_message, last_message_timestamp, feature_id, metadata";

fn conversion_error(message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(Error::CorruptedData(message)),
    )
}

/// Parse a string value from the database, returning a rusqlite error on parse failure.
fn parse_db<T: std::str::FromStr>(
    value: &str,
    column: &str,
) -> std::result::Result<T, rusqlite::Error> {
    value
        .parse()
        .map_err(|_| conversion_error(format!("invalid value '{value}' in column '{column}'")))
}

/// Parse an optional JSON column.
fn parse_json_opt<T: serde::de::DeserializeOwned>(
    value: Option<String>,
    column: &str,
) -> std::result::Result<Option<T>, rusqlite::Error> {
    match value {
        None => Ok(None),
        Some(s) => serde_json::from_str(&s)
            .map(Some)
            .map_err(|e| conversion_error(format!("invalid JSON in column '{column}': {e}"))),
    }
}

fn to_json_opt<T: Serialize>(value: Option<&T>) -> Result<Option<String>> {
    value.map(serde_json::to_string).transpose().map_err(Error::from)
}

fn message_from_row(row: &Row<'_>) -> std::result::Result<Message, rusqlite::Error> {
    let type_str: String = row.get(3)?;
    let source_str: String = row.get(4)?;
    let status_str: String = row.get(5)?;
    Ok(Message {
        id: row.get(0)?,
        feature_id: row.get(1)?,
        content: row.get(2)?,
        message_type: parse_db(&type_str, "type")?,
        source: parse_db(&source_str, "source")?,
        status: parse_db(&status_str, "status")?,
        timestamp: row.get(6)?,
        error: row.get(7)?,
        media: parse_json_opt(row.get(8)?, "media")?,
        file: parse_json_opt(row.get(9)?, "file")?,
        conversation_id: row.get(10)?,
        synced: row.get(11)?,
    })
}

fn conversation_from_row(row: &Row<'_>) -> std::result::Result<Conversation, rusqlite::Error> {
    Ok(Conversation {
        id: row.get(0)?,
        title: row.get(1)?,
        timestamp: row.get(2)?,
        last_message: row.get(3)?,
        last_message_timestamp: row.get(4)?,
        feature_id: row.get(5)?,
        metadata: parse_json_opt(row.get(6)?, "metadata")?,
    })
}

fn access_from_row(row: &Row<'_>) -> std::result::Result<FeatureAccess, rusqlite::Error> {
    let count: i64 = row.get(3)?;
    Ok(FeatureAccess {
        feature_id: row.get(0)?,
        feature_name: row.get(1)?,
        last_access: row.get(2)?,
        access_count: count.max(0) as u64,
    })
}

fn upsert_message(conn: &Connection, msg: &Message) -> Result<()> {
    conn.execute(
        "INSERT INTO messages (id, feature_id, content, type, source, status, timestamp,
         error, media, file, conversation_id, synced)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
         ON CONFLICT(id) DO UPDATE SET
             feature_id = excluded.feature_id,
             content = excluded.content,
             type = excluded.type,
             source = excluded.source,
             status = excluded.status,
             timestamp = excluded.timestamp,
             error = excluded.error,
             media = excluded.media,
             file = excluded.file,
             conversation_id = excluded.conversation_id,
             synced = excluded.synced",
        params![
            msg.id,
            msg.feature_id,
            msg.content,
            msg.message_type.as_str(),
            msg.source.as_str(),
            msg.status.as_str(),
            msg.timestamp,
            msg.error,
            to_json_opt(msg.media.as_ref())?,
            to_json_opt(msg.file.as_ref())?,
            msg.conversation_id,
            msg.synced,
        ],
    )?;
    Ok(())
}

fn upsert_conversation(conn: &Connection, conv: &Conversation) -> Result<()> {
    conn.execute(
        "INSERT INTO conversations (id, title, timestamp, last_message,
         last_message_timestamp, feature_id, metadata)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(id) DO UPDATE SET
             title = excluded.title,
             timestamp = excluded.timestamp,
             last_message = excluded.last_message,
             last_message_timestamp = excluded.last_message_timestamp,
             feature_id = excluded.feature_id,
             metadata = excluded.metadata",
        params![
            conv.id,
            conv.title,
            conv.timestamp,
            conv.last_message,
            conv.last_message_timestamp,
            conv.feature_id,
            to_json_opt(conv.metadata.as_ref())?,
        ],
    )?;
    Ok(())
}

fn upsert_access(conn: &Connection, access: &FeatureAccess) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO feature_access (feature_id, feature_name, last_access, access_count)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            access.feature_id,
            access.feature_name,
            access.last_access,
            access.access_count as i64,
        ],
    )?;
    Ok(())
}

fn upsert_setting(conn: &Connection, key: &str, value: &serde_json::Value) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
        params![key, serde_json::to_string(value)?],
    )?;
    Ok(())
}

/// Run schema creation on a database connection.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// Message counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: u64,
    pub sent: u64,
    pub received: u64,
    pub failed: u64,
}

impl StatusCounts {
    pub fn total(&self) -> u64 {
        self.pending + self.sent + self.received + self.failed
    }
}

/// SQLite database connection with local store operations.
pub struct Database {
    /// The underlying SQLite connection.
    pub conn: Connection,
}

impl Database {
    /// Open a database connection at the given path, creating and migrating if needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )?;

        let db = Database { conn };
        run_migrations(&db.conn)?;
        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        run_migrations(&db.conn)?;
        Ok(db)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Messages
    // ─────────────────────────────────────────────────────────────────────

    /// Insert or replace a message by id.
    pub fn put_message(&self, msg: &Message) -> Result<()> {
        upsert_message(&self.conn, msg)
    }

    /// Insert or replace many messages in one transaction.
    pub fn save_messages(&mut self, messages: &[Message]) -> Result<()> {
        let tx = self.conn.transaction()?;
        for msg in messages {
            upsert_message(&tx, msg)?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn get_message(&self, id: &str) -> Result<Option<Message>> {
        let sql = format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1");
        let msg = self.conn.query_row(&sql, params![id], message_from_row).optional()?;
        Ok(msg)
    }

    /// Apply a partial update. Returns the updated message, or `None` if no
    /// message has that id.
    pub fn update_message(
        &self,
        id: &str,
        patch: &MessagePatch,
        clock: &dyn Clock,
    ) -> Result<Option<Message>> {
        let Some(mut msg) = self.get_message(id)? else {
            return Ok(None);
        };
        patch.apply(&mut msg, clock)?;
        upsert_message(&self.conn, &msg)?;
        Ok(Some(msg))
    }

    /// Messages for a feature, newest first. Ties on timestamp break by id
    /// so pages never overlap.
    pub fn messages_by_feature(
        &self,
        feature_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Message>> {
        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE feature_id = ?1
             ORDER BY timestamp DESC, id DESC LIMIT ?2 OFFSET ?3"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![feature_id, limit as i64, offset as i64], message_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>().map_err(Error::from)
    }

    pub fn messages_by_status(&self, status: MessageStatus) -> Result<Vec<Message>> {
        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE status = ?1 ORDER BY timestamp, id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![status.as_str()], message_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>().map_err(Error::from)
    }

    /// All messages with status `pending`, oldest first.
    pub fn pending_messages(&self) -> Result<Vec<Message>> {
        self.messages_by_status(MessageStatus::Pending)
    }

    /// Returns true if a message was removed.
    pub fn delete_message(&self, id: &str) -> Result<bool> {
        let n = self.conn.execute("DELETE FROM messages WHERE id = ?1", params![id])?;
        Ok(n > 0)
    }

    /// Delete messages older than `cutoff_ms`. Returns the number removed.
    pub fn cleanup_before(&self, cutoff_ms: i64) -> Result<usize> {
        let n = self.conn.execute("DELETE FROM messages WHERE timestamp < ?1", params![cutoff_ms])?;
        Ok(n)
    }

    pub fn count_by_status(&self) -> Result<StatusCounts> {
        let mut stmt = self.conn.prepare("SELECT status, COUNT(*) FROM messages GROUP BY status")?;
        let rows = stmt.query_map([], |row| {
            let status: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            Ok((parse_db::<MessageStatus>(&status, "status")?, count.max(0) as u64))
        })?;
        let mut counts = StatusCounts::default();
        for row in rows {
            let (status, count) = row?;
            match status {
                MessageStatus::Pending => counts.pending = count,
                MessageStatus::Sent => counts.sent = count,
                MessageStatus::Received => counts.received = count,
                MessageStatus::Failed => counts.failed = count,
            }
        }
        Ok(counts)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Conversations
    // ─────────────────────────────────────────────────────────────────────

    pub fn save_conversation(&self, conv: &Conversation) -> Result<()> {
        upsert_conversation(&self.conn, conv)
    }

    pub fn get_conversation(&self, id: &str) -> Result<Option<Conversation>> {
        let sql = format!("SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE id = ?1");
        let conv = self.conn.query_row(&sql, params![id], conversation_from_row).optional()?;
        Ok(conv)
    }

    /// Conversations for a feature, newest first.
    pub fn conversations_by_feature(&self, feature_id: &str) -> Result<Vec<Conversation>> {
        let sql = format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE feature_id = ?1
             ORDER BY timestamp DESC, id DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![feature_id], conversation_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>().map_err(Error::from)
    }

    /// Delete a conversation and every message that references it, in one
    /// transaction. Messages go first. Returns the number of messages removed.
    pub fn delete_conversation(&mut self, id: &str) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let removed =
            tx.execute("DELETE FROM messages WHERE conversation_id = ?1", params![id])?;
        tx.execute("DELETE FROM conversations WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(removed)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Feature access
    // ─────────────────────────────────────────────────────────────────────

    /// Record one access. Creates the record on first access; afterwards the
    /// stored name is kept and only the count and time move.
    pub fn update_feature_access(
        &self,
        feature_id: &str,
        feature_name: &str,
        now_ms: i64,
    ) -> Result<FeatureAccess> {
        self.conn.execute(
            "INSERT INTO feature_access (feature_id, feature_name, last_access, access_count)
             VALUES (?1, ?2, ?3, 1)
             ON CONFLICT(feature_id) DO UPDATE SET
                 last_access = excluded.last_access,
                 access_count = access_count + 1",
            params![feature_id, feature_name, now_ms],
        )?;
        let access = self.conn.query_row(
            "SELECT feature_id, feature_name, last_access, access_count
             FROM feature_access WHERE feature_id = ?1",
            params![feature_id],
            access_from_row,
        )?;
        Ok(access)
    }

    /// The `limit` most recently accessed features, most recent first.
    pub fn recent_features(&self, limit: usize) -> Result<Vec<FeatureAccess>> {
        let mut stmt = self.conn.prepare(
            "SELECT feature_id, feature_name, last_access, access_count
             FROM feature_access ORDER BY last_access DESC, feature_id LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], access_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>().map_err(Error::from)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Settings
    // ─────────────────────────────────────────────────────────────────────

    pub fn save_setting(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        upsert_setting(&self.conn, key, value)
    }

    pub fn get_setting(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let raw: Option<String> = self
            .conn
            .query_row("SELECT value FROM settings WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?;
        match raw {
            Some(s) => Ok(Some(serde_json::from_str(&s).map_err(|e| {
                Error::CorruptedData(format!("setting '{key}' is not valid JSON: {e}"))
            })?)),
            None => Ok(None),
        }
    }

    pub fn all_settings(&self) -> Result<BTreeMap<String, serde_json::Value>> {
        let mut stmt = self.conn.prepare("SELECT key, value FROM settings ORDER BY key")?;
        let rows = stmt.query_map([], |row| {
            let key: String = row.get(0)?;
            let raw: String = row.get(1)?;
            let value = serde_json::from_str(&raw)
                .map_err(|e| conversion_error(format!("setting '{key}' is not valid JSON: {e}")))?;
            Ok((key, value))
        })?;
        rows.collect::<std::result::Result<BTreeMap<_, _>, _>>().map_err(Error::from)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Backup
    // ─────────────────────────────────────────────────────────────────────

    pub fn export_snapshot(&self) -> Result<Snapshot> {
        let messages = {
            let sql = format!("SELECT {MESSAGE_COLUMNS} FROM messages ORDER BY timestamp, id");
            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt.query_map([], message_from_row)?;
            rows.collect::<std::result::Result<Vec<_>, _>>()?
        };
        let conversations = {
            let sql =
                format!("SELECT {CONVERSATION_COLUMNS} FROM conversations ORDER BY timestamp, id");
            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt.query_map([], conversation_from_row)?;
            rows.collect::<std::result::Result<Vec<_>, _>>()?
        };
        let feature_access = {
            let mut stmt = self.conn.prepare(
                "SELECT feature_id, feature_name, last_access, access_count
                 FROM feature_access ORDER BY feature_id",
            )?;
            let rows = stmt.query_map([], access_from_row)?;
            rows.collect::<std::result::Result<Vec<_>, _>>()?
        };
        Ok(Snapshot { messages, conversations, feature_access, settings: self.all_settings()? })
    }

    /// Upsert everything in the snapshot. Existing records not in the
    /// snapshot are left alone.
    pub fn import_snapshot(&mut self, snapshot: &Snapshot) -> Result<()> {
        let tx = self.conn.transaction()?;
        for msg in &snapshot.messages {
            upsert_message(&tx, msg)?;
        }
        for conv in &snapshot.conversations {
            upsert_conversation(&tx, conv)?;
        }
        for access in &snapshot.feature_access {
            upsert_access(&tx, access)?;
        }
        for (key, value) in &snapshot.settings {
            upsert_setting(&tx, key, value)?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Empty all four tables.
    pub fn clear_all(&mut self) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(
            "DELETE FROM messages;
             DELETE FROM conversations;
             DELETE FROM feature_access;
             DELETE FROM settings;",
        )?;
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "db_tests.rs"]
mod tests;
