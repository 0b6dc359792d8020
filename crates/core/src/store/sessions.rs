// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{Error, Result};
use crate::id::resolve_prefix;
use crate::op::{RecordKind, SyncOp};
use crate::session::{ClockState, PauseInterval, Session, SyncState};

use super::annotations::annotation_ids_in;
use super::queue::enqueue_in;
use super::{
    fmt_ts, fmt_ts_opt, from_sql_int, parse_db, parse_timestamp, parse_timestamp_opt,
    to_sql_int, LocalStore,
};

const SESSION_COLUMNS: &str = "id, owner_device_id, owner_user_id, start_time, end_time,
    accumulated_pause_ms, activity_mode, is_running, sync_state, remote_revision,
    local_version, last_checkpoint_at";

/// Filter for [`LocalStore::query_sessions`]. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionQuery {
    /// `Some(true)` for sessions without an end time, `Some(false)` for stopped ones.
    pub open: Option<bool>,
    pub running: Option<bool>,
    pub sync_state: Option<SyncState>,
    pub owner_device_id: Option<String>,
    /// Maximum number of sessions, newest first.
    pub limit: Option<usize>,
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<Session> {
    let start_str: String = row.get(3)?;
    let end_str: Option<String> = row.get(4)?;
    let paused: i64 = row.get(5)?;
    let mode_str: String = row.get(6)?;
    let sync_str: String = row.get(8)?;
    let version: i64 = row.get(10)?;
    let checkpoint_str: Option<String> = row.get(11)?;

    Ok(Session {
        id: row.get(0)?,
        owner_device_id: row.get(1)?,
        owner_user_id: row.get(2)?,
        start_time: parse_timestamp(&start_str, "start_time")?,
        end_time: parse_timestamp_opt(end_str, "end_time")?,
        accumulated_pause_ms: from_sql_int(paused),
        pause_intervals: Vec::new(),
        activity_mode: parse_db(&mode_str, "activity_mode")?,
        is_running: row.get(7)?,
        event_markers: Vec::new(),
        sync_state: parse_db(&sync_str, "sync_state")?,
        remote_revision: row.get(9)?,
        local_version: from_sql_int(version),
        last_checkpoint_at: parse_timestamp_opt(checkpoint_str, "last_checkpoint_at")?,
    })
}

/// Fill in the pause intervals and event markers of a loaded session.
fn load_children(conn: &Connection, session: &mut Session) -> Result<()> {
    let mut stmt = conn.prepare(
        "SELECT started_at, ended_at FROM pause_intervals WHERE session_id = ?1 ORDER BY seq",
    )?;
    session.pause_intervals = stmt
        .query_map(params![session.id], |row| {
            let start: String = row.get(0)?;
            let end: Option<String> = row.get(1)?;
            Ok(PauseInterval {
                start: parse_timestamp(&start, "started_at")?,
                end: parse_timestamp_opt(end, "ended_at")?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut stmt =
        conn.prepare("SELECT at FROM event_markers WHERE session_id = ?1 ORDER BY seq")?;
    session.event_markers = stmt
        .query_map(params![session.id], |row| {
            let at: String = row.get(0)?;
            parse_timestamp(&at, "at")
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(())
}

pub(super) fn find_session_in(conn: &Connection, id: &str) -> Result<Option<Session>> {
    let sql = format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1");
    let session = conn
        .query_row(&sql, params![id], session_from_row)
        .optional()?;
    match session {
        Some(mut s) => {
            load_children(conn, &mut s)?;
            Ok(Some(s))
        }
        None => Ok(None),
    }
}

/// Insert or overwrite the session row and replace its child rows.
pub(super) fn write_session_in(
    conn: &Connection,
    session: &Session,
    local_version: u64,
    sync_state: SyncState,
) -> Result<()> {
    conn.execute(
        "INSERT INTO sessions (id, owner_device_id, owner_user_id, start_time, end_time,
             accumulated_pause_ms, activity_mode, is_running, sync_state, remote_revision,
             local_version, last_checkpoint_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
         ON CONFLICT(id) DO UPDATE SET
             owner_device_id = excluded.owner_device_id,
             owner_user_id = excluded.owner_user_id,
             end_time = excluded.end_time,
             accumulated_pause_ms = excluded.accumulated_pause_ms,
             activity_mode = excluded.activity_mode,
             is_running = excluded.is_running,
             sync_state = excluded.sync_state,
             remote_revision = excluded.remote_revision,
             local_version = excluded.local_version,
             last_checkpoint_at = excluded.last_checkpoint_at",
        params![
            session.id,
            session.owner_device_id,
            session.owner_user_id,
            fmt_ts(session.start_time),
            fmt_ts_opt(session.end_time),
            to_sql_int(session.accumulated_pause_ms),
            session.activity_mode.as_str(),
            session.is_running,
            sync_state.as_str(),
            session.remote_revision,
            to_sql_int(local_version),
            fmt_ts_opt(session.last_checkpoint_at),
        ],
    )?;

    conn.execute(
        "DELETE FROM pause_intervals WHERE session_id = ?1",
        params![session.id],
    )?;
    for (seq, pause) in session.pause_intervals.iter().enumerate() {
        conn.execute(
            "INSERT INTO pause_intervals (session_id, seq, started_at, ended_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                session.id,
                to_sql_int(seq as u64),
                fmt_ts(pause.start),
                fmt_ts_opt(pause.end),
            ],
        )?;
    }

    conn.execute(
        "DELETE FROM event_markers WHERE session_id = ?1",
        params![session.id],
    )?;
    for (seq, at) in session.event_markers.iter().enumerate() {
        conn.execute(
            "INSERT INTO event_markers (session_id, seq, at) VALUES (?1, ?2, ?3)",
            params![session.id, to_sql_int(seq as u64), fmt_ts(*at)],
        )?;
    }
    Ok(())
}

/// Delete a session with its child rows.
pub(super) fn remove_session_in(conn: &Connection, id: &str) -> Result<()> {
    conn.execute("DELETE FROM pause_intervals WHERE session_id = ?1", params![id])?;
    conn.execute("DELETE FROM event_markers WHERE session_id = ?1", params![id])?;
    conn.execute("DELETE FROM sessions WHERE id = ?1", params![id])?;
    Ok(())
}

/// Sync state after a local mutation: conflicts stay flagged until resolved.
pub(super) fn after_local_write(current: SyncState) -> SyncState {
    match current {
        SyncState::Conflict => SyncState::Conflict,
        SyncState::Pending | SyncState::Synced => SyncState::Pending,
    }
}

fn reject_delete(session: &Session) -> Error {
    let from = session.state();
    Error::InvalidTransition {
        from: from.to_string(),
        action: "delete".to_string(),
        hint: "stop, then delete".to_string(),
    }
}

impl LocalStore {
    /// Persist a newly started session and queue its upload.
    ///
    /// Fails with [`Error::SessionAlreadyActive`] if another session of the
    /// same device is still open. Returns the stored local version.
    pub fn create_session(&self, session: &Session) -> Result<u64> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        if session.is_open() {
            let active: Option<String> = tx
                .query_row(
                    "SELECT id FROM sessions
                     WHERE owner_device_id = ?1 AND end_time IS NULL AND id != ?2
                     LIMIT 1",
                    params![session.owner_device_id, session.id],
                    |row| row.get(0),
                )
                .optional()?;
            if let Some(active) = active {
                return Err(Error::SessionAlreadyActive(active));
            }
        }
        if find_session_in(&tx, &session.id)?.is_some() {
            return Err(Error::InvalidInput(format!(
                "session already exists: {}",
                session.id
            )));
        }

        let version = 1;
        write_session_in(&tx, session, version, SyncState::Pending)?;
        enqueue_in(
            &tx,
            &SyncOp::upsert(RecordKind::Session, session.id.clone()),
            version,
            self.now(),
        )?;
        tx.commit()?;
        Ok(version)
    }

    /// Persist a local mutation of an existing session and queue its upload.
    ///
    /// The stored version is bumped and the record becomes pending (a
    /// conflicted record stays in conflict). Returns the new local version.
    pub fn update_session(&self, session: &Session) -> Result<u64> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let current = find_session_in(&tx, &session.id)?
            .ok_or_else(|| Error::SessionNotFound(session.id.clone()))?;
        if current.end_time.is_some() && session.end_time != current.end_time {
            return Err(Error::InvalidTransition {
                from: ClockState::Stopped.to_string(),
                action: "modify".to_string(),
                hint: ClockState::Stopped.valid_actions().to_string(),
            });
        }

        let version = current.local_version + 1;
        let mut updated = session.clone();
        updated.remote_revision = current.remote_revision;
        write_session_in(&tx, &updated, version, after_local_write(current.sync_state))?;
        enqueue_in(
            &tx,
            &SyncOp::upsert(RecordKind::Session, session.id.clone()),
            version,
            self.now(),
        )?;
        tx.commit()?;
        Ok(version)
    }

    /// Record a checkpoint without creating a new local version.
    pub fn touch_checkpoint(&self, id: &str, at: DateTime<Utc>) -> Result<()> {
        let affected = self.conn().execute(
            "UPDATE sessions SET last_checkpoint_at = ?1 WHERE id = ?2",
            params![fmt_ts(at), id],
        )?;
        if affected == 0 {
            return Err(Error::SessionNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Get a session by ID.
    pub fn get_session(&self, id: &str) -> Result<Session> {
        self.find_session(id)?
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))
    }

    pub fn find_session(&self, id: &str) -> Result<Option<Session>> {
        find_session_in(&self.conn(), id)
    }

    /// Resolve a full or abbreviated session id.
    pub fn resolve_session_id(&self, prefix: &str) -> Result<String> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT id FROM sessions WHERE substr(id, 1, ?2) = ?1")?;
        let ids = stmt
            .query_map(params![prefix, to_sql_int(prefix.len() as u64)], |row| {
                row.get::<_, String>(0)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        resolve_prefix(prefix, ids.iter().map(String::as_str))
            .ok_or_else(|| Error::SessionNotFound(prefix.to_string()))
    }

    /// List sessions matching `query`, newest first.
    pub fn query_sessions(&self, query: &SessionQuery) -> Result<Vec<Session>> {
        let mut sql = format!("SELECT {SESSION_COLUMNS} FROM sessions");
        let mut conditions = Vec::new();
        let mut params_vec: Vec<String> = Vec::new();

        match query.open {
            Some(true) => conditions.push("end_time IS NULL".to_string()),
            Some(false) => conditions.push("end_time IS NOT NULL".to_string()),
            None => {}
        }
        match query.running {
            Some(true) => conditions.push("is_running = 1".to_string()),
            Some(false) => conditions.push("is_running = 0".to_string()),
            None => {}
        }
        if let Some(state) = query.sync_state {
            conditions.push("sync_state = ?".to_string());
            params_vec.push(state.as_str().to_string());
        }
        if let Some(device) = &query.owner_device_id {
            conditions.push("owner_device_id = ?".to_string());
            params_vec.push(device.clone());
        }

        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY start_time DESC, id DESC");
        if let Some(limit) = query.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        let conn = self.conn();
        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec
            .iter()
            .map(|s| s as &dyn rusqlite::ToSql)
            .collect();

        let mut sessions = stmt
            .query_map(params_refs.as_slice(), session_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        for session in &mut sessions {
            load_children(&conn, session)?;
        }
        Ok(sessions)
    }

    /// All sessions without an end time.
    pub fn open_sessions(&self) -> Result<Vec<Session>> {
        self.query_sessions(&SessionQuery {
            open: Some(true),
            ..SessionQuery::default()
        })
    }

    /// The open session started on `device_id`, if any.
    pub fn open_session_for_device(&self, device_id: &str) -> Result<Option<Session>> {
        let mut sessions = self.query_sessions(&SessionQuery {
            open: Some(true),
            owner_device_id: Some(device_id.to_string()),
            limit: Some(1),
            ..SessionQuery::default()
        })?;
        Ok(sessions.pop())
    }

    /// All sessions with local changes not yet confirmed by the remote.
    pub fn pending_sessions(&self) -> Result<Vec<Session>> {
        self.query_sessions(&SessionQuery {
            sync_state: Some(SyncState::Pending),
            ..SessionQuery::default()
        })
    }

    pub fn conflicted_sessions(&self) -> Result<Vec<Session>> {
        self.query_sessions(&SessionQuery {
            sync_state: Some(SyncState::Conflict),
            ..SessionQuery::default()
        })
    }

    /// Delete a stopped session and its annotations, queueing remote deletes.
    ///
    /// Open sessions must be stopped first.
    pub fn delete_session(&self, id: &str) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let session =
            find_session_in(&tx, id)?.ok_or_else(|| Error::SessionNotFound(id.to_string()))?;
        if session.is_open() {
            return Err(reject_delete(&session));
        }

        let now = self.now();
        for annotation_id in &annotation_ids_in(&tx, id)? {
            tx.execute("DELETE FROM annotations WHERE id = ?1", params![annotation_id])?;
            tx.execute(
                "DELETE FROM conflict_copies WHERE kind = ?1 AND record_id = ?2",
                params![RecordKind::Annotation.as_str(), annotation_id],
            )?;
            enqueue_in(
                &tx,
                &SyncOp::delete(RecordKind::Annotation, annotation_id.clone()),
                0,
                now,
            )?;
        }

        remove_session_in(&tx, id)?;
        tx.execute(
            "DELETE FROM conflict_copies WHERE kind = ?1 AND record_id = ?2",
            params![RecordKind::Session.as_str(), id],
        )?;
        enqueue_in(&tx, &SyncOp::delete(RecordKind::Session, id), 0, now)?;
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "sessions_tests.rs"]
mod tests;
