// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

use serde::Serialize;
use stint_core::RecordKind;

/// Tally of one sync pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Records uploaded and acknowledged.
    pub pushed: usize,
    /// Deletes acknowledged by the remote.
    pub deleted: usize,
    /// Remote records inserted locally.
    pub pulled: usize,
    /// Synced local records replaced by a newer remote revision.
    pub updated: usize,
    /// Records newly flagged as conflicting.
    pub conflicts: usize,
    /// Operations that failed and stay queued.
    pub failed: usize,
    /// Entries that reached the retry limit during this pass.
    pub persistent_failures: Vec<PersistentFailure>,
}

impl SyncReport {
    /// Returns true if the pass neither moved nor failed anything.
    pub fn is_empty(&self) -> bool {
        self == &SyncReport::default()
    }
}

/// A queued operation that keeps failing. It stays queued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistentFailure {
    pub kind: RecordKind,
    pub record_id: String,
    pub retry_count: u32,
    pub reason: String,
}

/// Sync status events for the host.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    Started,
    Succeeded(SyncReport),
    Failed { reason: String },
    PersistentFailure(PersistentFailure),
    ConflictDetected { kind: RecordKind, record_id: String },
    ConnectivityChanged { online: bool },
}
