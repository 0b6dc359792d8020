// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

//! SQLite-backed durable local store.
//!
//! The [`LocalStore`] holds sessions, annotations, the outbound sync queue,
//! conflict copies and the device singleton. Every write that touches one
//! record runs in a single transaction, so a crash never leaves a record
//! half-written or a mutation without its queue entry.
//!
//! The connection sits behind a mutex: the session clock and the sync
//! engine share one store and their writes are serialized.

mod annotations;
mod conflicts;
mod device;
mod queue;
mod remote;
mod schema;
mod sessions;

pub use conflicts::ConflictCopy;
pub use remote::PullOutcome;
pub use schema::{run_migrations, SCHEMA};
pub use sessions::SessionQuery;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::clock::{ClockSource, SystemClock};
use crate::error::{Error, Result};
use crate::op::RecordKind;

/// SQLite database connection with session store operations.
pub struct LocalStore {
    conn: Mutex<Connection>,
    clock: Arc<dyn ClockSource>,
}

impl LocalStore {
    /// Open a store at the given path, creating and migrating if needed.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_clock(path, Arc::new(SystemClock))
    }

    /// Open a store that stamps queue and conflict bookkeeping with `clock`.
    pub fn open_with_clock(path: &Path, clock: Arc<dyn ClockSource>) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        // WAL keeps readers from blocking the checkpoint writer
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;",
        )?;

        run_migrations(&conn, clock.now())?;
        Ok(LocalStore {
            conn: Mutex::new(conn),
            clock,
        })
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self> {
        Self::open_in_memory_with_clock(Arc::new(SystemClock))
    }

    /// Open an in-memory store driven by `clock` (for testing).
    pub fn open_in_memory_with_clock(clock: Arc<dyn ClockSource>) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        run_migrations(&conn, clock.now())?;
        Ok(LocalStore {
            conn: Mutex::new(conn),
            clock,
        })
    }

    /// Current time according to the store's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A panic while holding the lock cannot leave SQLite mid-transaction:
        // an uncommitted transaction rolls back when dropped.
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Table holding records of the given kind.
fn table(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Session => "sessions",
        RecordKind::Annotation => "annotations",
    }
}

/// Format a timestamp for storage.
///
/// Fixed-width millisecond RFC3339 so stored values sort chronologically.
fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn fmt_ts_opt(ts: Option<DateTime<Utc>>) -> Option<String> {
    ts.map(fmt_ts)
}

/// Parse a string value from the database, returning a rusqlite error on parse failure.
fn parse_db<T: std::str::FromStr>(
    value: &str,
    column: &str,
) -> std::result::Result<T, rusqlite::Error> {
    value.parse().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(Error::CorruptedData(format!(
                "invalid value '{value}' in column '{column}'"
            ))),
        )
    })
}

/// Parse an RFC3339 timestamp from the database.
fn parse_timestamp(
    value: &str,
    column: &str,
) -> std::result::Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(Error::CorruptedData(format!(
                    "invalid timestamp '{value}' in column '{column}'"
                ))),
            )
        })
}

fn parse_timestamp_opt(
    value: Option<String>,
    column: &str,
) -> std::result::Result<Option<DateTime<Utc>>, rusqlite::Error> {
    value.map(|v| parse_timestamp(&v, column)).transpose()
}

/// SQLite integers are signed; counters and versions are stored as i64.
fn to_sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn from_sql_int(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
