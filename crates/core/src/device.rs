// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

//! Per-store device configuration singleton.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Counter incremented each time a session is started on this device.
pub const COUNTER_SESSIONS_STARTED: &str = "sessions_started";
/// Counter incremented after each completed sync pass.
pub const COUNTER_SYNC_PASSES: &str = "sync_passes";

/// Identity and small mutable settings of one local store instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Generated once, on first open of the store.
    pub device_id: String,
    /// Authenticated identity, once one has been associated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub counters: BTreeMap<String, i64>,
    #[serde(default)]
    pub flags: BTreeMap<String, bool>,
}

impl DeviceConfig {
    /// Value of a named counter, zero if never incremented.
    pub fn counter(&self, name: &str) -> i64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    /// Value of a feature flag, false if never set.
    pub fn flag(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(false)
    }
}
