// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

//! Sync operations awaiting confirmation by the remote authority.
//!
//! Operations are idempotent by construction: an upsert is keyed by the
//! record's own id, and deleting an already-deleted record is a no-op, so a
//! retried operation can never duplicate a remote record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// The kind of record an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Session,
    Annotation,
}

impl RecordKind {
    /// Returns the string representation used in storage and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Session => "session",
            RecordKind::Annotation => "annotation",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "session" => Ok(RecordKind::Session),
            "annotation" => Ok(RecordKind::Annotation),
            _ => Err(Error::InvalidRecordKind(s.to_string())),
        }
    }
}

/// What the remote should do with the record.
///
/// Creates and updates are both upserts; the payload is read from the local
/// store when the operation is sent, so it always carries the latest state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpAction {
    Upsert,
    Delete,
}

impl OpAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpAction::Upsert => "upsert",
            OpAction::Delete => "delete",
        }
    }
}

impl fmt::Display for OpAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OpAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "upsert" => Ok(OpAction::Upsert),
            "delete" => Ok(OpAction::Delete),
            _ => Err(Error::InvalidAction(s.to_string())),
        }
    }
}

/// A mutation against the remote authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOp {
    pub kind: RecordKind,
    pub record_id: String,
    pub action: OpAction,
}

impl SyncOp {
    pub fn upsert(kind: RecordKind, record_id: impl Into<String>) -> Self {
        SyncOp {
            kind,
            record_id: record_id.into(),
            action: OpAction::Upsert,
        }
    }

    pub fn delete(kind: RecordKind, record_id: impl Into<String>) -> Self {
        SyncOp {
            kind,
            record_id: record_id.into(),
            action: OpAction::Delete,
        }
    }
}

/// A durable, not-yet-confirmed operation.
///
/// Entries are coalesced per record, so there is at most one per
/// `(kind, record_id)`. They are removed only on confirmed success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    /// Database-assigned identifier.
    pub id: i64,
    pub op: SyncOp,
    /// Local version of the record when the entry was last refreshed.
    pub version: u64,
    /// Failed attempts so far.
    pub retry_count: u32,
    pub enqueued_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_attempt_at: Option<DateTime<Utc>>,
    /// Earliest time the next attempt may be made.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_attempt_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl QueueEntry {
    /// Returns true if backoff allows an attempt at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.next_attempt_at {
            Some(t) => t <= now,
            None => true,
        }
    }
}

#[cfg(test)]
#[path = "op_tests.rs"]
mod tests;
