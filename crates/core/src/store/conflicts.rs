// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::op::RecordKind;

use super::{fmt_ts, parse_db, parse_timestamp, LocalStore};

/// The remote copy of a record whose local copy is in conflict.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConflictCopy {
    pub kind: RecordKind,
    pub record_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_revision: Option<String>,
    /// The remote record as JSON.
    pub payload: serde_json::Value,
    pub detected_at: DateTime<Utc>,
}

fn copy_from_row(row: &Row<'_>) -> rusqlite::Result<ConflictCopy> {
    let kind_str: String = row.get(0)?;
    let payload_str: String = row.get(3)?;
    let detected_str: String = row.get(4)?;

    let payload = serde_json::from_str(&payload_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            Box::new(Error::CorruptedData(format!("invalid conflict payload: {e}"))),
        )
    })?;

    Ok(ConflictCopy {
        kind: parse_db(&kind_str, "kind")?,
        record_id: row.get(1)?,
        remote_revision: row.get(2)?,
        payload,
        detected_at: parse_timestamp(&detected_str, "detected_at")?,
    })
}

/// Keep the remote copy alongside the local one, replacing any older copy.
pub(super) fn save_copy_in(
    conn: &Connection,
    kind: RecordKind,
    record_id: &str,
    remote_revision: Option<&str>,
    payload: &serde_json::Value,
    now: DateTime<Utc>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO conflict_copies (kind, record_id, remote_revision, payload, detected_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(kind, record_id) DO UPDATE SET
             remote_revision = excluded.remote_revision,
             payload = excluded.payload,
             detected_at = excluded.detected_at",
        params![
            kind.as_str(),
            record_id,
            remote_revision,
            serde_json::to_string(payload)?,
            fmt_ts(now),
        ],
    )?;
    Ok(())
}

pub(super) fn find_copy_in(
    conn: &Connection,
    kind: RecordKind,
    record_id: &str,
) -> Result<Option<ConflictCopy>> {
    let copy = conn
        .query_row(
            "SELECT kind, record_id, remote_revision, payload, detected_at
             FROM conflict_copies WHERE kind = ?1 AND record_id = ?2",
            params![kind.as_str(), record_id],
            copy_from_row,
        )
        .optional()?;
    Ok(copy)
}

impl LocalStore {
    /// All stored remote copies, oldest detection first.
    pub fn conflicts(&self) -> Result<Vec<ConflictCopy>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT kind, record_id, remote_revision, payload, detected_at
             FROM conflict_copies ORDER BY detected_at, record_id",
        )?;
        let copies = stmt
            .query_map([], copy_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(copies)
    }

    pub fn conflict_copy(&self, kind: RecordKind, record_id: &str) -> Result<Option<ConflictCopy>> {
        find_copy_in(&self.conn(), kind, record_id)
    }
}
