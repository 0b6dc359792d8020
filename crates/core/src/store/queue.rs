// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::Result;
use crate::op::{OpAction, QueueEntry, RecordKind, SyncOp};

use super::{
    fmt_ts, from_sql_int, parse_db, parse_timestamp, parse_timestamp_opt,
    to_sql_int, LocalStore,
};

const QUEUE_COLUMNS: &str = "id, kind, record_id, action, version, retry_count,
    enqueued_at, last_attempt_at, next_attempt_at, last_error";

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<QueueEntry> {
    let kind_str: String = row.get(1)?;
    let action_str: String = row.get(3)?;
    let version: i64 = row.get(4)?;
    let enqueued_str: String = row.get(6)?;
    let attempt_str: Option<String> = row.get(7)?;
    let next_str: Option<String> = row.get(8)?;

    Ok(QueueEntry {
        id: row.get(0)?,
        op: SyncOp {
            kind: parse_db(&kind_str, "kind")?,
            record_id: row.get(2)?,
            action: parse_db(&action_str, "action")?,
        },
        version: from_sql_int(version),
        retry_count: row.get(5)?,
        enqueued_at: parse_timestamp(&enqueued_str, "enqueued_at")?,
        last_attempt_at: parse_timestamp_opt(attempt_str, "last_attempt_at")?,
        next_attempt_at: parse_timestamp_opt(next_str, "next_attempt_at")?,
        last_error: row.get(9)?,
    })
}

/// Add or refresh the queue entry for a record.
///
/// Coalesces per `(kind, record_id)`: the action and version are replaced,
/// retry bookkeeping is kept so backoff is not reset by further edits.
pub(super) fn enqueue_in(
    conn: &Connection,
    op: &SyncOp,
    version: u64,
    now: DateTime<Utc>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO sync_queue (kind, record_id, action, version, retry_count, enqueued_at)
         VALUES (?1, ?2, ?3, ?4, 0, ?5)
         ON CONFLICT(kind, record_id) DO UPDATE SET
             action = excluded.action,
             version = excluded.version",
        params![
            op.kind.as_str(),
            op.record_id,
            op.action.as_str(),
            to_sql_int(version),
            fmt_ts(now),
        ],
    )?;
    Ok(())
}

pub(super) fn has_pending_delete_in(
    conn: &Connection,
    kind: RecordKind,
    record_id: &str,
) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sync_queue WHERE kind = ?1 AND record_id = ?2 AND action = ?3",
        params![kind.as_str(), record_id, OpAction::Delete.as_str()],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

impl LocalStore {
    /// Durably record an operation against the remote authority.
    pub fn enqueue(&self, op: &SyncOp, version: u64) -> Result<()> {
        enqueue_in(&self.conn(), op, version, self.now())
    }

    /// All queued operations in the order they were first enqueued.
    pub fn queue_entries(&self) -> Result<Vec<QueueEntry>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {QUEUE_COLUMNS} FROM sync_queue ORDER BY id"
        ))?;
        let entries = stmt
            .query_map([], entry_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn queue_entry(&self, kind: RecordKind, record_id: &str) -> Result<Option<QueueEntry>> {
        let entry = self
            .conn()
            .query_row(
                &format!(
                    "SELECT {QUEUE_COLUMNS} FROM sync_queue WHERE kind = ?1 AND record_id = ?2"
                ),
                params![kind.as_str(), record_id],
                entry_from_row,
            )
            .optional()?;
        Ok(entry)
    }

    pub fn queue_len(&self) -> Result<usize> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM sync_queue", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    pub fn has_pending_delete(&self, kind: RecordKind, record_id: &str) -> Result<bool> {
        has_pending_delete_in(&self.conn(), kind, record_id)
    }

    /// Record a failed attempt and schedule the next one.
    ///
    /// Returns the new retry count.
    pub fn record_failure(
        &self,
        entry_id: i64,
        error: &str,
        next_attempt_at: DateTime<Utc>,
    ) -> Result<u32> {
        let conn = self.conn();
        conn.execute(
            "UPDATE sync_queue
             SET retry_count = retry_count + 1, last_attempt_at = ?2,
                 next_attempt_at = ?3, last_error = ?4
             WHERE id = ?1",
            params![
                entry_id,
                fmt_ts(self.now()),
                fmt_ts(next_attempt_at),
                error
            ],
        )?;
        let retries: Option<u32> = conn
            .query_row(
                "SELECT retry_count FROM sync_queue WHERE id = ?1",
                params![entry_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(retries.unwrap_or(0))
    }

    /// Remove an entry after confirmed success.
    ///
    /// Only removes it if it still describes the acknowledged operation: an
    /// entry refreshed by a later mutation stays queued. Returns whether the
    /// entry was removed.
    pub fn complete_entry(&self, entry: &QueueEntry) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM sync_queue WHERE id = ?1 AND action = ?2 AND version = ?3",
            params![
                entry.id,
                entry.op.action.as_str(),
                to_sql_int(entry.version)
            ],
        )?;
        Ok(affected > 0)
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
