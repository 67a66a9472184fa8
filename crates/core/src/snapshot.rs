// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Whole-store backup format.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{BufRead, Write};

use crate::error::Result;
use crate::model::{Conversation, FeatureAccess, Message};

/// Full contents of the local store, as written by `tether export`.
///
/// Every field defaults to empty so a partial backup still imports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub conversations: Vec<Conversation>,
    #[serde(default)]
    pub feature_access: Vec<FeatureAccess>,
    #[serde(default)]
    pub settings: BTreeMap<String, serde_json::Value>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
            && self.conversations.is_empty()
            && self.feature_access.is_empty()
            && self.settings.is_empty()
    }

    /// Total number of records across all tables.
    pub fn record_count(&self) -> usize {
        self.messages.len()
            + self.conversations.len()
            + self.feature_access.len()
            + self.settings.len()
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn read_from<R: BufRead>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
