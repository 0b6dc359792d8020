// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

use chrono::{DateTime, Utc};
use serde::Serialize;
use stint_core::{ActivityMode, ClockState, Session};

/// Point-in-time view of a session for the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub state: ClockState,
    pub mode: ActivityMode,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub paused_ms: u64,
    /// Number of event markers logged so far.
    pub events: usize,
}

impl SessionSnapshot {
    pub fn of(session: &Session, now: DateTime<Utc>) -> Self {
        SessionSnapshot {
            session_id: session.id.clone(),
            state: session.state(),
            mode: session.activity_mode,
            started_at: session.start_time,
            elapsed_ms: session.elapsed_ms(now),
            paused_ms: session.paused_ms(now),
            events: session.event_markers.len(),
        }
    }
}

/// Elapsed time recomputed after a suspension gap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub session_id: String,
    /// Last value reported to the host.
    pub previous_ms: u64,
    /// Freshly computed value.
    pub current_ms: u64,
}

impl Reconciliation {
    /// Time accounted for while away. Negative if the wall clock went back.
    pub fn delta_ms(&self) -> i64 {
        let current = i64::try_from(self.current_ms).unwrap_or(i64::MAX);
        let previous = i64::try_from(self.previous_ms).unwrap_or(i64::MAX);
        current.saturating_sub(previous)
    }
}

/// Events published by the session clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClockEvent {
    Started(SessionSnapshot),
    Paused(SessionSnapshot),
    Resumed(SessionSnapshot),
    Stopped { session_id: String, elapsed_ms: u64 },
    EventLogged { session_id: String, count: usize },
    /// Periodic elapsed-time update while running.
    Tick { session_id: String, elapsed_ms: u64 },
    Reconciled(Reconciliation),
    Recovered(SessionSnapshot),
    /// A write failed and will be retried on the next checkpoint.
    StorageFailure { reason: String },
}
