// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

//! Online/offline signal shared by the probe task, the drain loop and the
//! host.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::Notify;

/// Connectivity state visible to background tasks and callers.
///
/// Uses atomic fields for lock-free reads.
#[derive(Debug, Default)]
pub struct SharedConnectivity {
    online: AtomicBool,
    /// Millis since the epoch of the last probe, 0 if none ran yet.
    last_probe_ms: AtomicI64,
    came_online: Notify,
    probe_requested: Notify,
}

impl SharedConnectivity {
    /// Create a new state. Starts offline until a probe succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Acquire)
    }

    /// Set the state. Returns true if it changed.
    ///
    /// An offline→online transition wakes one waiter of [`Self::came_online`],
    /// or the next one to wait if nobody is waiting yet.
    pub fn set_online(&self, online: bool) -> bool {
        let was = self.online.swap(online, Ordering::AcqRel);
        if online && !was {
            self.came_online.notify_one();
        }
        was != online
    }

    pub fn record_probe(&self, at: DateTime<Utc>) {
        self.last_probe_ms
            .store(at.timestamp_millis(), Ordering::Release);
    }

    pub fn last_probe_at(&self) -> Option<DateTime<Utc>> {
        match self.last_probe_ms.load(Ordering::Acquire) {
            0 => None,
            ms => DateTime::from_timestamp_millis(ms),
        }
    }

    /// Resolves on the next offline→online transition.
    pub async fn came_online(&self) {
        self.came_online.notified().await;
    }

    /// Ask the probe task to check reachability now.
    pub fn request_probe(&self) {
        self.probe_requested.notify_one();
    }

    pub async fn probe_requested(&self) {
        self.probe_requested.notified().await;
    }

    /// Human-readable status for display.
    pub fn status_string(&self) -> String {
        match (self.is_online(), self.last_probe_at()) {
            (true, _) => "online".to_string(),
            (false, None) => "offline (not probed yet)".to_string(),
            (false, Some(at)) => format!("offline (last probe {})", at.format("%H:%M:%S")),
        }
    }
}

#[cfg(test)]
#[path = "connectivity_tests.rs"]
mod tests;
