// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use crate::error::Result;
use crate::id::new_id;

/// SQL schema for the local store.
pub const SCHEMA: &str = r#"
-- Sessions; timer fields are owned by the session clock,
-- sync_state/remote_revision by the sync engine
CREATE TABLE IF NOT EXISTS sessions (
    id TEXT PRIMARY KEY,
    owner_device_id TEXT NOT NULL,
    owner_user_id TEXT,
    start_time TEXT NOT NULL,
    end_time TEXT,
    accumulated_pause_ms INTEGER NOT NULL DEFAULT 0,
    activity_mode TEXT NOT NULL,
    is_running INTEGER NOT NULL DEFAULT 0,
    sync_state TEXT NOT NULL DEFAULT 'pending',
    remote_revision TEXT,
    local_version INTEGER NOT NULL DEFAULT 0,
    last_checkpoint_at TEXT
);

-- Pause intervals, ordered by seq; only the last may have a NULL ended_at
CREATE TABLE IF NOT EXISTS pause_intervals (
    session_id TEXT NOT NULL,
    seq INTEGER NOT NULL,
    started_at TEXT NOT NULL,
    ended_at TEXT,
    PRIMARY KEY (session_id, seq),
    FOREIGN KEY (session_id) REFERENCES sessions(id) ON DELETE CASCADE
);

-- Append-only event markers
CREATE TABLE IF NOT EXISTS event_markers (
    session_id TEXT NOT NULL,
    seq INTEGER NOT NULL,
    at TEXT NOT NULL,
    PRIMARY KEY (session_id, seq),
    FOREIGN KEY (session_id) REFERENCES sessions(id) ON DELETE CASCADE
);

-- Labels attached to sessions (pulled annotations may precede their session)
CREATE TABLE IF NOT EXISTS annotations (
    id TEXT PRIMARY KEY,
    session_id TEXT NOT NULL,
    owner_user_id TEXT,
    label TEXT NOT NULL,
    note TEXT,
    created_at TEXT NOT NULL,
    sync_state TEXT NOT NULL DEFAULT 'pending',
    remote_revision TEXT,
    local_version INTEGER NOT NULL DEFAULT 0
);

-- Durable outbound queue, coalesced per record
CREATE TABLE IF NOT EXISTS sync_queue (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    kind TEXT NOT NULL,
    record_id TEXT NOT NULL,
    action TEXT NOT NULL,
    version INTEGER NOT NULL DEFAULT 0,
    retry_count INTEGER NOT NULL DEFAULT 0,
    enqueued_at TEXT NOT NULL,
    last_attempt_at TEXT,
    next_attempt_at TEXT,
    last_error TEXT,
    UNIQUE (kind, record_id)
);

-- Remote copies of records whose local copy is in conflict
CREATE TABLE IF NOT EXISTS conflict_copies (
    kind TEXT NOT NULL,
    record_id TEXT NOT NULL,
    remote_revision TEXT,
    payload TEXT NOT NULL,
    detected_at TEXT NOT NULL,
    PRIMARY KEY (kind, record_id)
);

-- Device configuration singleton
CREATE TABLE IF NOT EXISTS device_config (
    device_id TEXT PRIMARY KEY,
    owner_user_id TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS device_counters (
    name TEXT PRIMARY KEY,
    value INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS device_flags (
    name TEXT PRIMARY KEY,
    value INTEGER NOT NULL DEFAULT 0
);

-- Indexes for the two polled queries
CREATE INDEX IF NOT EXISTS idx_sessions_running ON sessions(is_running);
CREATE INDEX IF NOT EXISTS idx_sessions_sync_state ON sessions(sync_state);
CREATE INDEX IF NOT EXISTS idx_annotations_session ON annotations(session_id);
CREATE INDEX IF NOT EXISTS idx_annotations_sync_state ON annotations(sync_state);
"#;

/// Create the schema and seed the device singleton on a database connection.
pub fn run_migrations(conn: &Connection, now: DateTime<Utc>) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    ensure_device_row(conn, now)?;
    Ok(())
}

/// Creates the device singleton on first open of the store.
fn ensure_device_row(conn: &Connection, now: DateTime<Utc>) -> Result<()> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM device_config", [], |row| row.get(0))?;
    if count == 0 {
        conn.execute(
            "INSERT INTO device_config (device_id, created_at) VALUES (?1, ?2)",
            params![new_id(), now.to_rfc3339()],
        )?;
        tracing::debug!("created device singleton");
    }
    Ok(())
}
