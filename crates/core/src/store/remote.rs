// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

//! Bookkeeping owned by the sync engine: acknowledgements and pulled copies.

use rusqlite::{params, Connection};
use serde::Serialize;

use crate::annotation::{Annotation, AnnotationRecord};
use crate::error::Result;
use crate::op::{OpAction, RecordKind};
use crate::session::{SessionRecord, SyncState};

use super::annotations::{find_annotation_in, write_annotation_in};
use super::conflicts::{find_copy_in, save_copy_in};
use super::queue::has_pending_delete_in;
use super::sessions::{find_session_in, write_session_in};
use super::{table, to_sql_int, LocalStore};

/// What pulling one remote record did to the local store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    /// No local copy existed; the remote copy was stored as synced.
    Inserted,
    /// A synced local copy was replaced by a different remote revision.
    Updated,
    /// Nothing changed locally.
    Unchanged,
    /// The local copy has unconfirmed changes. It was flagged and the remote
    /// copy was kept aside.
    Conflict,
    /// A local delete is queued for the record; the remote copy was ignored.
    Deleted,
}

/// The parts of a local record that decide how a pulled copy is merged.
#[derive(Debug)]
struct LocalView {
    sync_state: SyncState,
    remote_revision: Option<String>,
    same_content: bool,
}

/// Decide how to apply a pulled copy.
///
/// `copy_revision` is the revision of an already-stored conflict copy, if any.
fn decide(
    local: Option<LocalView>,
    remote_revision: Option<&str>,
    copy_revision: Option<Option<String>>,
) -> PullOutcome {
    let Some(local) = local else {
        return PullOutcome::Inserted;
    };
    // A revision only identifies a copy when both sides carry one; without
    // it, content equality is the only evidence the copies agree.
    let known = matches!(
        (local.remote_revision.as_deref(), remote_revision),
        (Some(local_rev), Some(remote_rev)) if local_rev == remote_rev
    );
    match local.sync_state {
        SyncState::Synced if known => PullOutcome::Unchanged,
        SyncState::Synced if remote_revision.is_none() && local.same_content => {
            PullOutcome::Unchanged
        }
        SyncState::Synced => PullOutcome::Updated,
        SyncState::Pending if known || local.same_content => PullOutcome::Unchanged,
        SyncState::Pending => PullOutcome::Conflict,
        SyncState::Conflict => match copy_revision {
            Some(rev) if rev.as_deref() == remote_revision => PullOutcome::Unchanged,
            _ => PullOutcome::Conflict,
        },
    }
}

fn flag_conflict_in(conn: &Connection, kind: RecordKind, id: &str) -> Result<()> {
    conn.execute(
        &format!("UPDATE {} SET sync_state = ?1 WHERE id = ?2", table(kind)),
        params![SyncState::Conflict.as_str(), id],
    )?;
    tracing::warn!(kind = kind.as_str(), id, "remote copy diverged from pending local edit");
    Ok(())
}

fn stored_copy_revision(
    conn: &Connection,
    kind: RecordKind,
    id: &str,
) -> Result<Option<Option<String>>> {
    Ok(find_copy_in(conn, kind, id)?.map(|copy| copy.remote_revision))
}

fn to_payload<T: Serialize>(record: &T) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(record)?)
}

impl LocalStore {
    /// Record a confirmed upload of `version` at `revision`.
    ///
    /// The record becomes synced, and its queue entry is removed, only if
    /// `version` is still its current local version. A mutation that landed
    /// while the upload was in flight keeps the record pending. The revision
    /// is stored either way, since the remote now holds that revision.
    /// Returns whether the record is now synced.
    pub fn mark_synced(
        &self,
        kind: RecordKind,
        id: &str,
        version: u64,
        revision: Option<&str>,
    ) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let affected = tx.execute(
            &format!(
                "UPDATE {} SET remote_revision = ?3,
                     sync_state = CASE WHEN local_version = ?2 AND sync_state = 'pending'
                                  THEN 'synced' ELSE sync_state END
                 WHERE id = ?1",
                table(kind)
            ),
            params![id, to_sql_int(version), revision],
        )?;
        if affected == 0 {
            return Ok(false);
        }

        let synced: bool = tx.query_row(
            &format!(
                "SELECT sync_state = 'synced' AND local_version = ?2 FROM {} WHERE id = ?1",
                table(kind)
            ),
            params![id, to_sql_int(version)],
            |row| row.get(0),
        )?;
        if synced {
            tx.execute(
                "DELETE FROM sync_queue
                 WHERE kind = ?1 AND record_id = ?2 AND action = ?3 AND version <= ?4",
                params![
                    kind.as_str(),
                    id,
                    OpAction::Upsert.as_str(),
                    to_sql_int(version)
                ],
            )?;
        }
        tx.commit()?;
        Ok(synced)
    }

    /// Merge a pulled session into the store.
    ///
    /// Absent locally: inserted as synced. Synced locally: replaced when the
    /// revision differs. Pending locally with an unknown remote revision:
    /// flagged as a conflict, neither copy overwritten. Records in conflict
    /// and records with a queued delete are never touched.
    pub fn apply_remote_session(
        &self,
        record: SessionRecord,
        revision: Option<&str>,
    ) -> Result<PullOutcome> {
        let now = self.now();
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        if has_pending_delete_in(&tx, RecordKind::Session, &record.id)? {
            return Ok(PullOutcome::Deleted);
        }

        let local = find_session_in(&tx, &record.id)?;
        let view = local.as_ref().map(|s| LocalView {
            sync_state: s.sync_state,
            remote_revision: s.remote_revision.clone(),
            same_content: SessionRecord::from(s) == record,
        });
        let copy_revision = stored_copy_revision(&tx, RecordKind::Session, &record.id)?;
        let outcome = decide(view, revision, copy_revision);

        match outcome {
            PullOutcome::Inserted | PullOutcome::Updated => {
                let version = local.as_ref().map_or(0, |s| s.local_version) + 1;
                let mut session = record.into_session(revision.map(str::to_string));
                session.last_checkpoint_at = local.and_then(|s| s.last_checkpoint_at);
                write_session_in(&tx, &session, version, SyncState::Synced)?;
            }
            PullOutcome::Conflict => {
                flag_conflict_in(&tx, RecordKind::Session, &record.id)?;
                save_copy_in(
                    &tx,
                    RecordKind::Session,
                    &record.id,
                    revision,
                    &to_payload(&record)?,
                    now,
                )?;
            }
            PullOutcome::Unchanged | PullOutcome::Deleted => {}
        }
        tx.commit()?;
        Ok(outcome)
    }

    /// Merge a pulled annotation into the store, with the same rules as
    /// [`LocalStore::apply_remote_session`].
    pub fn apply_remote_annotation(
        &self,
        record: AnnotationRecord,
        revision: Option<&str>,
    ) -> Result<PullOutcome> {
        let now = self.now();
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        if has_pending_delete_in(&tx, RecordKind::Annotation, &record.id)? {
            return Ok(PullOutcome::Deleted);
        }

        let local: Option<Annotation> = find_annotation_in(&tx, &record.id)?;
        let view = local.as_ref().map(|a| LocalView {
            sync_state: a.sync_state,
            remote_revision: a.remote_revision.clone(),
            same_content: AnnotationRecord::from(a) == record,
        });
        let copy_revision = stored_copy_revision(&tx, RecordKind::Annotation, &record.id)?;
        let outcome = decide(view, revision, copy_revision);

        match outcome {
            PullOutcome::Inserted | PullOutcome::Updated => {
                let version = local.as_ref().map_or(0, |a| a.local_version) + 1;
                let annotation = record.into_annotation(revision.map(str::to_string));
                write_annotation_in(&tx, &annotation, version, SyncState::Synced)?;
            }
            PullOutcome::Conflict => {
                flag_conflict_in(&tx, RecordKind::Annotation, &record.id)?;
                save_copy_in(
                    &tx,
                    RecordKind::Annotation,
                    &record.id,
                    revision,
                    &to_payload(&record)?,
                    now,
                )?;
            }
            PullOutcome::Unchanged | PullOutcome::Deleted => {}
        }
        tx.commit()?;
        Ok(outcome)
    }
}

#[cfg(test)]
#[path = "remote_tests.rs"]
mod tests;
