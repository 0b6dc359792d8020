// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

//! Remote authority abstraction.
//!
//! The remote is a record-oriented API: idempotent upsert keyed by record
//! id, delete, and a query filtered by owner. The trait exists so the sync
//! engine can be driven by an in-memory remote in tests.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use stint_core::{Annotation, AnnotationRecord, RecordKind, Session, SessionRecord};

/// Error type for remote operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RemoteError {
    /// The remote could not be reached.
    #[error("network failure: {0}")]
    Network(String),

    /// The call did not complete within the request timeout.
    #[error("request timed out")]
    Timeout,

    /// The remote answered with a non-success status.
    #[error("rejected by remote ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The response could not be decoded.
    #[error("invalid response: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Returns true if the failure says nothing about the record itself,
    /// only that the remote is unreachable right now.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, RemoteError::Network(_) | RemoteError::Timeout)
    }
}

/// Result type for remote operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Boxed future returned by [`Remote`] methods.
pub type RemoteFuture<'a, T> = Pin<Box<dyn Future<Output = RemoteResult<T>> + Send + 'a>>;

/// A record as exchanged with the remote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordEnvelope {
    pub kind: RecordKind,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_user_id: Option<String>,
    /// Assigned by the remote; absent on upload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    pub payload: serde_json::Value,
}

impl RecordEnvelope {
    pub fn session(session: &Session) -> serde_json::Result<Self> {
        Ok(RecordEnvelope {
            kind: RecordKind::Session,
            id: session.id.clone(),
            owner_user_id: session.owner_user_id.clone(),
            revision: None,
            payload: serde_json::to_value(SessionRecord::from(session))?,
        })
    }

    pub fn annotation(annotation: &Annotation) -> serde_json::Result<Self> {
        Ok(RecordEnvelope {
            kind: RecordKind::Annotation,
            id: annotation.id.clone(),
            owner_user_id: annotation.owner_user_id.clone(),
            revision: None,
            payload: serde_json::to_value(AnnotationRecord::from(annotation))?,
        })
    }
}

/// Acknowledgement of an upsert.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    /// Revision the remote now holds for the record.
    #[serde(default)]
    pub revision: Option<String>,
}

/// The remote authority.
///
/// `upsert` must be idempotent: sending the same record twice yields one
/// remote record.
pub trait Remote: Send + Sync {
    /// Lightweight reachability check.
    fn probe(&self) -> RemoteFuture<'_, ()>;

    /// Create or replace the record keyed by `record.id`.
    fn upsert(&self, record: RecordEnvelope) -> RemoteFuture<'_, Ack>;

    /// Delete a record. Deleting an unknown record succeeds.
    fn delete(&self, kind: RecordKind, id: &str) -> RemoteFuture<'_, ()>;

    /// All records owned by `owner_user_id`.
    fn fetch(&self, owner_user_id: &str) -> RemoteFuture<'_, Vec<RecordEnvelope>>;
}

#[cfg(test)]
#[path = "remote_tests.rs"]
pub(crate) mod tests;
