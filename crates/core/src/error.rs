// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

//! Error types for stint-core operations.

use thiserror::Error;

/// All possible errors that can occur in stint-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("annotation not found: {0}")]
    AnnotationNotFound(String),

    #[error("invalid session transition: cannot {action} while {from}\n  hint: from '{from}' you can: {hint}")]
    InvalidTransition {
        from: String,
        action: String,
        hint: String,
    },

    #[error("no active session\n  hint: start one with 'stint start'")]
    NoActiveSession,

    #[error("a session is already active: {0}\n  hint: stop it before starting another")]
    SessionAlreadyActive(String),

    #[error("invalid activity mode: '{0}'\n  hint: valid modes are: flow, pomodoro")]
    InvalidMode(String),

    #[error("invalid sync state: '{0}'\n  hint: valid states are: pending, synced, conflict")]
    InvalidSyncState(String),

    #[error("invalid record kind: '{0}'\n  hint: valid kinds are: session, annotation")]
    InvalidRecordKind(String),

    #[error("invalid queue action: '{0}'")]
    InvalidAction(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupted data: {0}")]
    CorruptedData(String),
}

impl Error {
    /// Returns true for local persistence faults.
    ///
    /// These are retried on the next checkpoint or drain instead of being
    /// surfaced as usage errors.
    pub fn is_storage_failure(&self) -> bool {
        matches!(self, Error::Database(_) | Error::Io(_))
    }
}

/// A specialized Result type for stint-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
