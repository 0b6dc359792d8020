// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::annotation::Annotation;
use crate::error::{Error, Result};
use crate::op::{RecordKind, SyncOp};
use crate::session::SyncState;

use super::queue::enqueue_in;
use super::sessions::find_session_in;
use super::{fmt_ts, from_sql_int, parse_db, parse_timestamp, to_sql_int, LocalStore};

const ANNOTATION_COLUMNS: &str = "id, session_id, owner_user_id, label, note, created_at,
    sync_state, remote_revision, local_version";

fn annotation_from_row(row: &Row<'_>) -> rusqlite::Result<Annotation> {
    let created_str: String = row.get(5)?;
    let sync_str: String = row.get(6)?;
    let version: i64 = row.get(8)?;

    Ok(Annotation {
        id: row.get(0)?,
        session_id: row.get(1)?,
        owner_user_id: row.get(2)?,
        label: row.get(3)?,
        note: row.get(4)?,
        created_at: parse_timestamp(&created_str, "created_at")?,
        sync_state: parse_db(&sync_str, "sync_state")?,
        remote_revision: row.get(7)?,
        local_version: from_sql_int(version),
    })
}

pub(super) fn find_annotation_in(conn: &Connection, id: &str) -> Result<Option<Annotation>> {
    let annotation = conn
        .query_row(
            &format!("SELECT {ANNOTATION_COLUMNS} FROM annotations WHERE id = ?1"),
            params![id],
            annotation_from_row,
        )
        .optional()?;
    Ok(annotation)
}

pub(super) fn write_annotation_in(
    conn: &Connection,
    annotation: &Annotation,
    local_version: u64,
    sync_state: SyncState,
) -> Result<()> {
    conn.execute(
        "INSERT INTO annotations (id, session_id, owner_user_id, label, note, created_at,
             sync_state, remote_revision, local_version)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT(id) DO UPDATE SET
             session_id = excluded.session_id,
             owner_user_id = excluded.owner_user_id,
             label = excluded.label,
             note = excluded.note,
             sync_state = excluded.sync_state,
             remote_revision = excluded.remote_revision,
             local_version = excluded.local_version",
        params![
            annotation.id,
            annotation.session_id,
            annotation.owner_user_id,
            annotation.label,
            annotation.note,
            fmt_ts(annotation.created_at),
            sync_state.as_str(),
            annotation.remote_revision,
            to_sql_int(local_version),
        ],
    )?;
    Ok(())
}

pub(super) fn annotation_ids_in(conn: &Connection, session_id: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT id FROM annotations WHERE session_id = ?1 ORDER BY id")?;
    let ids = stmt
        .query_map(params![session_id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(ids)
}

impl LocalStore {
    /// Attach a new annotation to an existing session and queue its upload.
    pub fn create_annotation(&self, annotation: &Annotation) -> Result<u64> {
        if annotation.label.trim().is_empty() {
            return Err(Error::InvalidInput("annotation label cannot be empty".to_string()));
        }

        let mut conn = self.conn();
        let tx = conn.transaction()?;

        if find_session_in(&tx, &annotation.session_id)?.is_none() {
            return Err(Error::SessionNotFound(annotation.session_id.clone()));
        }

        let version = 1;
        write_annotation_in(&tx, annotation, version, SyncState::Pending)?;
        enqueue_in(
            &tx,
            &SyncOp::upsert(RecordKind::Annotation, annotation.id.clone()),
            version,
            self.now(),
        )?;
        tx.commit()?;
        Ok(version)
    }

    pub fn get_annotation(&self, id: &str) -> Result<Annotation> {
        find_annotation_in(&self.conn(), id)?
            .ok_or_else(|| Error::AnnotationNotFound(id.to_string()))
    }

    pub fn find_annotation(&self, id: &str) -> Result<Option<Annotation>> {
        find_annotation_in(&self.conn(), id)
    }

    /// Annotations of a session, oldest first.
    pub fn annotations_for(&self, session_id: &str) -> Result<Vec<Annotation>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ANNOTATION_COLUMNS} FROM annotations
             WHERE session_id = ?1 ORDER BY created_at, id"
        ))?;
        let annotations = stmt
            .query_map(params![session_id], annotation_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(annotations)
    }

    /// Delete an annotation and queue the remote delete.
    pub fn delete_annotation(&self, id: &str) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let affected = tx.execute("DELETE FROM annotations WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(Error::AnnotationNotFound(id.to_string()));
        }
        tx.execute(
            "DELETE FROM conflict_copies WHERE kind = ?1 AND record_id = ?2",
            params![RecordKind::Annotation.as_str(), id],
        )?;
        enqueue_in(
            &tx,
            &SyncOp::delete(RecordKind::Annotation, id),
            0,
            self.now(),
        )?;
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "annotations_tests.rs"]
mod tests;
