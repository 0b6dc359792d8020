// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

//! Core session types for the stint activity tracker.
//!
//! A [`Session`] is one contiguous, possibly paused, timed activity. Elapsed
//! time is never counted up tick by tick; it is always derived from absolute
//! timestamps:
//!
//! ```text
//! elapsed = until - start_time - accumulated_pause - open_pause
//! ```
//!
//! where `until` is `end_time` for a stopped session and "now" otherwise.
//! Missed ticks therefore never cause drift.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::clock::millis_between;
use crate::error::{Error, Result};

/// The kind of activity being tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityMode {
    /// Open-ended focused work.
    #[default]
    Flow,
    /// Fixed-length work interval.
    Pomodoro,
}

impl ActivityMode {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityMode::Flow => "flow",
            ActivityMode::Pomodoro => "pomodoro",
        }
    }
}

impl fmt::Display for ActivityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ActivityMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "flow" => Ok(ActivityMode::Flow),
            "pomodoro" => Ok(ActivityMode::Pomodoro),
            _ => Err(Error::InvalidMode(s.to_string())),
        }
    }
}

/// Reconciliation status of a record against the remote authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// Local changes not yet confirmed by the remote.
    Pending,
    /// Local copy matches the last acknowledged remote revision.
    Synced,
    /// Local pending changes collided with an independent remote copy.
    Conflict,
}

impl SyncState {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncState::Pending => "pending",
            SyncState::Synced => "synced",
            SyncState::Conflict => "conflict",
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SyncState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(SyncState::Pending),
            "synced" => Ok(SyncState::Synced),
            "conflict" => Ok(SyncState::Conflict),
            _ => Err(Error::InvalidSyncState(s.to_string())),
        }
    }
}

/// Lifecycle state of the session clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockState {
    /// No session is open.
    Idle,
    /// Open and counting.
    Running,
    /// Open with an unclosed pause interval.
    Paused,
    /// Finalized. Terminal.
    Stopped,
}

impl ClockState {
    /// Returns the string representation used in display.
    pub fn as_str(&self) -> &'static str {
        match self {
            ClockState::Idle => "idle",
            ClockState::Running => "running",
            ClockState::Paused => "paused",
            ClockState::Stopped => "stopped",
        }
    }

    /// Actions that are valid from this state, for error hints.
    pub fn valid_actions(&self) -> &'static str {
        match self {
            ClockState::Idle => "start",
            ClockState::Running => "pause, stop, mark",
            ClockState::Paused => "resume, stop, mark",
            ClockState::Stopped => "nothing (the session is finalized)",
        }
    }
}

impl fmt::Display for ClockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A span of time during which a session was paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauseInterval {
    /// When the pause began.
    pub start: DateTime<Utc>,
    /// When the pause ended. `None` while the session is still paused.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
}

impl PauseInterval {
    /// Length of this pause, measuring an open pause up to `now`.
    pub fn duration_ms(&self, now: DateTime<Utc>) -> u64 {
        millis_between(self.start, self.end.unwrap_or(now))
    }

    /// Returns true if the pause has not been closed yet.
    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }
}

/// The unit of tracked activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque unique identifier, immutable.
    pub id: String,
    /// The local store instance the session was started on.
    pub owner_device_id: String,
    /// Authenticated owner, populated once known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_user_id: Option<String>,
    /// Set once at creation.
    pub start_time: DateTime<Utc>,
    /// Set exactly once, on stop.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Total time spent in closed pauses.
    pub accumulated_pause_ms: u64,
    /// Chronological, non-overlapping pauses; only the last may be open.
    pub pause_intervals: Vec<PauseInterval>,
    pub activity_mode: ActivityMode,
    /// True iff the session is open and not paused.
    pub is_running: bool,
    /// Append-only timestamps of domain events logged during the session.
    pub event_markers: Vec<DateTime<Utc>>,
    pub sync_state: SyncState,
    /// Revision marker from the remote authority, for conflict detection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_revision: Option<String>,
    /// Bumped by the local store on every local mutation.
    pub local_version: u64,
    /// Last time the session clock checkpointed this session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_checkpoint_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Creates a running session starting at `now`.
    pub fn start(
        id: String,
        owner_device_id: String,
        owner_user_id: Option<String>,
        activity_mode: ActivityMode,
        now: DateTime<Utc>,
    ) -> Self {
        Session {
            id,
            owner_device_id,
            owner_user_id,
            start_time: now,
            end_time: None,
            accumulated_pause_ms: 0,
            pause_intervals: Vec::new(),
            activity_mode,
            is_running: true,
            event_markers: Vec::new(),
            sync_state: SyncState::Pending,
            remote_revision: None,
            local_version: 0,
            last_checkpoint_at: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ClockState {
        if self.end_time.is_some() {
            ClockState::Stopped
        } else if self.open_pause().is_some() {
            ClockState::Paused
        } else {
            ClockState::Running
        }
    }

    /// Returns true while the session has no end time.
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }

    /// The currently open pause, if the session is paused.
    pub fn open_pause(&self) -> Option<&PauseInterval> {
        self.pause_intervals.last().filter(|p| p.is_open())
    }

    /// Latest timestamp already recorded on this session.
    ///
    /// New boundaries are clamped to this so a wall clock stepping backwards
    /// can never reorder pause intervals.
    fn latest_boundary(&self) -> DateTime<Utc> {
        let mut latest = self.start_time;
        if let Some(last) = self.pause_intervals.last() {
            latest = latest.max(last.end.unwrap_or(last.start));
        }
        latest
    }

    fn invalid(&self, action: &str) -> Error {
        let from = self.state();
        Error::InvalidTransition {
            from: from.to_string(),
            action: action.to_string(),
            hint: from.valid_actions().to_string(),
        }
    }

    /// Running → Paused.
    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.state() != ClockState::Running {
            return Err(self.invalid("pause"));
        }
        let start = now.max(self.latest_boundary());
        self.pause_intervals.push(PauseInterval { start, end: None });
        self.is_running = false;
        Ok(())
    }

    /// Paused → Running. Returns the length of the pause that was closed.
    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<u64> {
        if self.state() != ClockState::Paused {
            return Err(self.invalid("resume"));
        }
        let closed = self.close_open_pause(now);
        self.is_running = true;
        Ok(closed)
    }

    /// Running or Paused → Stopped. An open pause is closed first.
    pub fn stop(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.state() == ClockState::Stopped {
            return Err(self.invalid("stop"));
        }
        self.close_open_pause(now);
        self.end_time = Some(now.max(self.latest_boundary()));
        self.is_running = false;
        Ok(())
    }

    /// Appends an event marker. Returns the number of markers recorded.
    pub fn log_event(&mut self, now: DateTime<Utc>) -> Result<usize> {
        if !self.is_open() {
            return Err(self.invalid("mark"));
        }
        let at = match self.event_markers.last() {
            Some(last) => now.max(*last),
            None => now.max(self.start_time),
        };
        self.event_markers.push(at);
        Ok(self.event_markers.len())
    }

    fn close_open_pause(&mut self, now: DateTime<Utc>) -> u64 {
        let Some(open) = self.pause_intervals.last_mut().filter(|p| p.is_open()) else {
            return 0;
        };
        let end = now.max(open.start);
        open.end = Some(end);
        let duration = millis_between(open.start, end);
        self.accumulated_pause_ms = self.accumulated_pause_ms.saturating_add(duration);
        duration
    }

    /// Total paused time, including an open pause measured up to `now`.
    pub fn paused_ms(&self, now: DateTime<Utc>) -> u64 {
        let until = self.end_time.unwrap_or(now);
        let open = self.open_pause().map_or(0, |p| p.duration_ms(until));
        self.accumulated_pause_ms.saturating_add(open)
    }

    /// Active time at `now`, never negative.
    ///
    /// For a stopped session `now` is ignored and the result is stable.
    pub fn elapsed_ms(&self, now: DateTime<Utc>) -> u64 {
        let until = self.end_time.unwrap_or(now);
        millis_between(self.start_time, until).saturating_sub(self.paused_ms(until))
    }
}

/// The replicated subset of a [`Session`], as exchanged with the remote.
///
/// Local bookkeeping (`sync_state`, `local_version`, checkpoints) never
/// leaves the device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub owner_device_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_user_id: Option<String>,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    pub accumulated_pause_ms: u64,
    #[serde(default)]
    pub pause_intervals: Vec<PauseInterval>,
    pub activity_mode: ActivityMode,
    pub is_running: bool,
    #[serde(default)]
    pub event_markers: Vec<DateTime<Utc>>,
}

impl From<&Session> for SessionRecord {
    fn from(s: &Session) -> Self {
        SessionRecord {
            id: s.id.clone(),
            owner_device_id: s.owner_device_id.clone(),
            owner_user_id: s.owner_user_id.clone(),
            start_time: s.start_time,
            end_time: s.end_time,
            accumulated_pause_ms: s.accumulated_pause_ms,
            pause_intervals: s.pause_intervals.clone(),
            activity_mode: s.activity_mode,
            is_running: s.is_running,
            event_markers: s.event_markers.clone(),
        }
    }
}

impl SessionRecord {
    /// Builds a local session from a remote copy, marked synced at `revision`.
    pub fn into_session(self, revision: Option<String>) -> Session {
        Session {
            id: self.id,
            owner_device_id: self.owner_device_id,
            owner_user_id: self.owner_user_id,
            start_time: self.start_time,
            end_time: self.end_time,
            accumulated_pause_ms: self.accumulated_pause_ms,
            pause_intervals: self.pause_intervals,
            activity_mode: self.activity_mode,
            is_running: self.is_running,
            event_markers: self.event_markers,
            sync_state: SyncState::Synced,
            remote_revision: revision,
            local_version: 0,
            last_checkpoint_at: None,
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
