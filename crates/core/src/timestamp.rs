// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Epoch-millisecond timestamps and the clock they are read from.
//!
//! Every stored timestamp is an integer count of milliseconds since the Unix
//! epoch. Callers and servers hand us many shapes (integers, floats, numeric
//! strings, RFC 3339 strings, `DateTime<Utc>`), so [`TimeInput`] accepts all of
//! them and [`TimeInput::to_millis`] normalizes. Anything unparsable falls back
//! to "now".

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Milliseconds in one day.
pub const DAY_MS: i64 = 86_400_000;

/// Source of the current wall-clock time.
pub trait Clock: Send + Sync {
    /// Returns the current time in milliseconds since Unix epoch.
    fn now_ms(&self) -> i64;
}

/// System clock implementation using `std::time::SystemTime`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as i64).unwrap_or(0)
    }
}

impl<C: Clock> Clock for &C {
    fn now_ms(&self) -> i64 {
        (*self).now_ms()
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now_ms(&self) -> i64 {
        (**self).now_ms()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(now_ms: i64) -> Self {
        ManualClock { now: AtomicI64::new(now_ms) }
    }

    pub fn set(&self, now_ms: i64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ms: i64) {
        self.now.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// A timestamp in whatever shape the caller supplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeInput {
    Millis(i64),
    Float(f64),
    Text(String),
}

impl TimeInput {
    /// Normalizes to epoch milliseconds, or `None` if the value is not a time.
    pub fn to_millis(&self) -> Option<i64> {
        match self {
            TimeInput::Millis(ms) => Some(*ms),
            TimeInput::Float(f) if f.is_finite() => Some(f.trunc() as i64),
            TimeInput::Float(_) => None,
            TimeInput::Text(s) => parse_text(s),
        }
    }

    /// Normalizes to epoch milliseconds, substituting `clock`'s now when the
    /// value cannot be interpreted.
    pub fn resolve(&self, clock: &dyn Clock) -> i64 {
        self.to_millis().unwrap_or_else(|| clock.now_ms())
    }
}

impl From<i64> for TimeInput {
    fn from(ms: i64) -> Self {
        TimeInput::Millis(ms)
    }
}

impl From<DateTime<Utc>> for TimeInput {
    fn from(dt: DateTime<Utc>) -> Self {
        TimeInput::Millis(dt.timestamp_millis())
    }
}

impl From<&str> for TimeInput {
    fn from(s: &str) -> Self {
        TimeInput::Text(s.to_string())
    }
}

fn parse_text(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(ms) = s.parse::<i64>() {
        return Some(ms);
    }
    if let Ok(f) = s.parse::<f64>() {
        return f.is_finite().then(|| f.trunc() as i64);
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.timestamp_millis())
}

/// Converts epoch milliseconds to a UTC datetime for display.
pub fn to_datetime(ms: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
}

/// Serde default for a missing timestamp field.
pub fn now_millis() -> i64 {
    SystemClock.now_ms()
}

/// Serde helper: deserializes any [`TimeInput`] shape into epoch millis.
pub fn deserialize_millis<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let input = Option::<TimeInput>::deserialize(deserializer)?;
    Ok(input.as_ref().map_or_else(|| SystemClock.now_ms(), |i| i.resolve(&SystemClock)))
}

/// Serde helper for optional timestamps; `null` stays `None`.
pub fn deserialize_opt_millis<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let input = Option::<TimeInput>::deserialize(deserializer)?;
    Ok(input.map(|i| i.resolve(&SystemClock)))
}

#[cfg(test)]
#[path = "timestamp_tests.rs"]
mod tests;
