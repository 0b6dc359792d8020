// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

use thiserror::Error;

use crate::sync::RemoteError;

/// All possible errors that can occur in the stint library.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error("not initialized: run 'stint init' first")]
    NotInitialized,

    #[error("already initialized at {0}")]
    AlreadyInitialized(String),

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

    #[error("a session is already active: {0}\n  hint: stop it with 'stint stop' before starting another")]
    SessionAlreadyActive(String),

    #[error("invalid activity mode: '{0}'\n  hint: valid modes are: flow, pomodoro")]
    InvalidMode(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("remote sync is not configured\n  hint: set [remote] url in config.toml or STINT_REMOTE_URL")]
    RemoteNotConfigured,

    #[error("no user is associated with this device\n  hint: run 'stint login <user-id>' first")]
    NoOwner,

    #[error("another stint process holds the state directory lock: {0}")]
    InstanceLocked(String),

    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("operation timed out after {0}s")]
    Timeout(u64),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("corrupted data in database: {0}")]
    CorruptedData(String),
}

/// A specialized Result type for stint operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns true for local persistence faults, which are retried
    /// rather than surfaced.
    pub fn is_storage_failure(&self) -> bool {
        matches!(self, Error::Database(_) | Error::Io(_))
    }
}

impl From<stint_core::Error> for Error {
    fn from(e: stint_core::Error) -> Self {
        match e {
            stint_core::Error::SessionNotFound(id) => Error::SessionNotFound(id),
            stint_core::Error::AnnotationNotFound(id) => Error::AnnotationNotFound(id),
            stint_core::Error::InvalidTransition { from, action, hint } => {
                Error::InvalidTransition { from, action, hint }
            }
            stint_core::Error::NoActiveSession => Error::NoActiveSession,
            stint_core::Error::SessionAlreadyActive(id) => Error::SessionAlreadyActive(id),
            stint_core::Error::InvalidMode(s) => Error::InvalidMode(s),
            stint_core::Error::InvalidSyncState(s) => {
                Error::CorruptedData(format!("invalid sync state: {}", s))
            }
            stint_core::Error::InvalidRecordKind(s) => {
                Error::InvalidInput(format!("invalid record kind: {}", s))
            }
            stint_core::Error::InvalidAction(s) => {
                Error::CorruptedData(format!("invalid queue action: {}", s))
            }
            stint_core::Error::InvalidInput(s) => Error::InvalidInput(s),
            stint_core::Error::Database(e) => Error::Database(e),
            stint_core::Error::Io(e) => Error::Io(e),
            stint_core::Error::Json(e) => Error::Json(e),
            stint_core::Error::CorruptedData(s) => Error::CorruptedData(s),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
