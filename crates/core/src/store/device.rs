// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;

use crate::device::DeviceConfig;
use crate::error::{Error, Result};
use crate::op::{RecordKind, SyncOp};
use crate::session::SyncState;

use super::queue::enqueue_in;
use super::sessions::after_local_write;
use super::{from_sql_int, parse_db, parse_timestamp, table, to_sql_int, LocalStore};

/// Id, local version and sync state of every record of `kind` without an owner.
fn ownerless_in(conn: &Connection, kind: RecordKind) -> Result<Vec<(String, i64, String)>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, local_version, sync_state FROM {} WHERE owner_user_id IS NULL",
        table(kind)
    ))?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

impl LocalStore {
    /// The device singleton, created on first open.
    pub fn device_config(&self) -> Result<DeviceConfig> {
        let conn = self.conn();
        let (device_id, owner_user_id, created_at) = conn.query_row(
            "SELECT device_id, owner_user_id, created_at FROM device_config LIMIT 1",
            [],
            |row| {
                let created_str: String = row.get(2)?;
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    parse_timestamp(&created_str, "created_at")?,
                ))
            },
        )?;

        let mut stmt = conn.prepare("SELECT name, value FROM device_counters")?;
        let counters = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<std::result::Result<BTreeMap<_, _>, _>>()?;

        let mut stmt = conn.prepare("SELECT name, value FROM device_flags")?;
        let flags = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, bool>(1)?)))?
            .collect::<std::result::Result<BTreeMap<_, _>, _>>()?;

        Ok(DeviceConfig {
            device_id,
            owner_user_id,
            created_at,
            counters,
            flags,
        })
    }

    pub fn device_id(&self) -> Result<String> {
        let id = self
            .conn()
            .query_row("SELECT device_id FROM device_config LIMIT 1", [], |row| {
                row.get(0)
            })?;
        Ok(id)
    }

    /// Set (or clear) the authenticated owner on the device singleton only.
    ///
    /// See [`LocalStore::assign_owner`] to also adopt existing records.
    pub fn set_owner_user_id(&self, user_id: Option<&str>) -> Result<()> {
        self.conn()
            .execute("UPDATE device_config SET owner_user_id = ?1", params![user_id])?;
        Ok(())
    }

    /// Increment a named counter and return its new value.
    pub fn increment_counter(&self, name: &str) -> Result<i64> {
        let value = self.conn().query_row(
            "INSERT INTO device_counters (name, value) VALUES (?1, 1)
             ON CONFLICT(name) DO UPDATE SET value = value + 1
             RETURNING value",
            params![name],
            |row| row.get(0),
        )?;
        Ok(value)
    }

    pub fn set_flag(&self, name: &str, value: bool) -> Result<()> {
        self.conn().execute(
            "INSERT INTO device_flags (name, value) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET value = excluded.value",
            params![name, value],
        )?;
        Ok(())
    }

    /// Value of a feature flag, false if never set.
    pub fn flag(&self, name: &str) -> Result<bool> {
        let value: Option<bool> = self
            .conn()
            .query_row(
                "SELECT value FROM device_flags WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.unwrap_or(false))
    }

    /// Associate every ownerless record with `user_id`.
    ///
    /// Sets the device owner, then stamps each session and annotation whose
    /// owner is still unknown, marking it pending and queueing its upload.
    /// Returns the number of records adopted.
    pub fn assign_owner(&self, user_id: &str) -> Result<usize> {
        if user_id.trim().is_empty() {
            return Err(Error::InvalidInput("user id cannot be empty".to_string()));
        }

        let now = self.now();
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        tx.execute(
            "UPDATE device_config SET owner_user_id = ?1",
            params![user_id],
        )?;

        let mut adopted = 0;
        for kind in [RecordKind::Session, RecordKind::Annotation] {
            for (id, version, sync_str) in ownerless_in(&tx, kind)? {
                let current: SyncState = parse_db(&sync_str, "sync_state")?;
                let version = from_sql_int(version) + 1;
                tx.execute(
                    &format!(
                        "UPDATE {} SET owner_user_id = ?1, local_version = ?2, sync_state = ?3
                         WHERE id = ?4",
                        table(kind)
                    ),
                    params![
                        user_id,
                        to_sql_int(version),
                        after_local_write(current).as_str(),
                        id
                    ],
                )?;
                enqueue_in(&tx, &SyncOp::upsert(kind, id), version, now)?;
                adopted += 1;
            }
        }

        tx.commit()?;
        Ok(adopted)
    }
}

#[cfg(test)]
#[path = "device_tests.rs"]
mod tests;
