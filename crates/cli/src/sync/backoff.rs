// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

//! Capped exponential retry delay for queue entries.

use std::cmp;
use std::time::Duration;

/// Retry delay policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub initial_delay_ms: u64,
    pub max_delay_secs: u64,
}

impl Backoff {
    /// Delay before the next attempt after `retry_count` failures:
    /// `initial * 2^(retry_count - 1)`, capped at the maximum.
    pub fn delay(&self, retry_count: u32) -> Duration {
        let cap = self.max_delay_secs.saturating_mul(1000);
        if retry_count == 0 {
            return Duration::from_millis(cmp::min(self.initial_delay_ms, cap));
        }
        let shift = cmp::min(retry_count - 1, 63);
        let factor = 1u64.checked_shl(shift).unwrap_or(u64::MAX);
        let delay = self.initial_delay_ms.saturating_mul(factor);
        Duration::from_millis(cmp::min(delay, cap))
    }
}

#[cfg(test)]
#[path = "backoff_tests.rs"]
mod tests;
