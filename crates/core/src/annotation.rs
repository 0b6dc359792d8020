// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

//! Labels and notes attached to a session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::SyncState;

/// A label (with optional free-text note) attached to a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: String,
    /// The session this annotation belongs to.
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_user_id: Option<String>,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub sync_state: SyncState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_revision: Option<String>,
    pub local_version: u64,
}

impl Annotation {
    /// Creates a pending annotation.
    pub fn new(
        id: String,
        session_id: String,
        label: String,
        note: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Annotation {
            id,
            session_id,
            owner_user_id: None,
            label,
            note,
            created_at,
            sync_state: SyncState::Pending,
            remote_revision: None,
            local_version: 0,
        }
    }
}

/// The replicated subset of an [`Annotation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    pub id: String,
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_user_id: Option<String>,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Annotation> for AnnotationRecord {
    fn from(a: &Annotation) -> Self {
        AnnotationRecord {
            id: a.id.clone(),
            session_id: a.session_id.clone(),
            owner_user_id: a.owner_user_id.clone(),
            label: a.label.clone(),
            note: a.note.clone(),
            created_at: a.created_at,
        }
    }
}

impl AnnotationRecord {
    /// Builds a local annotation from a remote copy, marked synced.
    pub fn into_annotation(self, revision: Option<String>) -> Annotation {
        Annotation {
            id: self.id,
            session_id: self.session_id,
            owner_user_id: self.owner_user_id,
            label: self.label,
            note: self.note,
            created_at: self.created_at,
            sync_state: SyncState::Synced,
            remote_revision: revision,
            local_version: 0,
        }
    }
}
