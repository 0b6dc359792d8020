// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

//! Wall-clock sources.
//!
//! All persisted timestamps are wall-clock UTC so records stay comparable
//! across process restarts. The [`ClockSource`] trait lets tests drive time
//! by hand.

use chrono::{DateTime, TimeDelta, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Trait for getting the current wall clock time.
///
/// This allows injecting a manual clock for testing.
pub trait ClockSource: Send + Sync {
    /// Returns the current wall-clock time.
    fn now(&self) -> DateTime<Utc>;
}

/// System clock implementation using [`Utc::now`].
///
/// Truncated to millisecond precision, the resolution the store persists,
/// so a reloaded session computes exactly what the in-memory one did.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl ClockSource for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        let now = Utc::now();
        DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
    }
}

impl<C: ClockSource> ClockSource for &C {
    fn now(&self) -> DateTime<Utc> {
        (*self).now()
    }
}

impl<C: ClockSource + ?Sized> ClockSource for Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same underlying instant, so a test can hand one copy
/// to the engine and advance another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    millis: Arc<AtomicI64>,
}

impl ManualClock {
    /// Creates a manual clock frozen at the given instant.
    pub fn new(start: DateTime<Utc>) -> Self {
        ManualClock {
            millis: Arc::new(AtomicI64::new(start.timestamp_millis())),
        }
    }

    /// Creates a manual clock frozen at `ms` milliseconds after the Unix epoch.
    pub fn at_millis(ms: i64) -> Self {
        ManualClock {
            millis: Arc::new(AtomicI64::new(ms)),
        }
    }

    /// Moves the clock forward (or backward, for negative values) by `ms`.
    pub fn advance_ms(&self, ms: i64) {
        self.millis.fetch_add(ms, Ordering::SeqCst);
    }

    /// Jumps the clock to an absolute instant.
    pub fn set(&self, at: DateTime<Utc>) {
        self.millis.store(at.timestamp_millis(), Ordering::SeqCst);
    }
}

impl ClockSource for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let ms = self.millis.load(Ordering::SeqCst);
        DateTime::from_timestamp_millis(ms).unwrap_or(DateTime::UNIX_EPOCH)
    }
}

/// Milliseconds from `earlier` to `later`, clamped at zero.
pub fn millis_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> u64 {
    let delta: TimeDelta = later - earlier;
    u64::try_from(delta.num_milliseconds()).unwrap_or(0)
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
