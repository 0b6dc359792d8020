// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

//! Host facade: one process-wide owner of the store, the session clock and
//! the sync engine.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use stint_core::{ClockSource, LocalStore, SystemClock};
use tracing::{debug, info, warn};

use crate::clock::{SessionClock, SessionSnapshot};
use crate::config::{db_path, lock_path, Config};
use crate::error::{Error, Result};
use crate::sync::{HttpRemote, Remote, SyncEngine};

pub struct Engine {
    state_dir: PathBuf,
    store: Arc<LocalStore>,
    clock: SessionClock,
    sync: Option<Arc<SyncEngine>>,
    lock: Mutex<Option<File>>,
}

impl Engine {
    /// Open the state directory with the system clock and, when sync is
    /// enabled, the configured HTTP remote.
    pub fn open(state_dir: &Path, config: &Config) -> Result<Self> {
        let remote: Option<Arc<dyn Remote>> = match config.remote_url() {
            Some(url) if config.is_sync_enabled() => Some(Arc::new(HttpRemote::new(
                &url,
                config.remote_token().map(str::to_string),
                config.sync.request_timeout(),
            )?)),
            _ => None,
        };
        Self::open_with(state_dir, config, Arc::new(SystemClock), remote)
    }

    /// Open with an explicit clock source and remote.
    pub fn open_with(
        state_dir: &Path,
        config: &Config,
        clock: Arc<dyn ClockSource>,
        remote: Option<Arc<dyn Remote>>,
    ) -> Result<Self> {
        let lock_file = acquire_lock(&lock_path(state_dir))?;
        let store = Arc::new(LocalStore::open_with_clock(
            &db_path(state_dir),
            Arc::clone(&clock),
        )?);
        let session_clock =
            SessionClock::new(Arc::clone(&store), clock, config.clock.clone())?;
        let sync = remote.map(|remote| {
            Arc::new(SyncEngine::new(
                Arc::clone(&store),
                remote,
                config.sync.clone(),
            ))
        });
        debug!(dir = %state_dir.display(), sync = sync.is_some(), "engine opened");

        Ok(Engine {
            state_dir: state_dir.to_path_buf(),
            store,
            clock: session_clock,
            sync,
            lock: Mutex::new(Some(lock_file)),
        })
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    pub fn clock(&self) -> &SessionClock {
        &self.clock
    }

    /// The sync engine, if a remote is configured.
    pub fn sync(&self) -> Option<&Arc<SyncEngine>> {
        self.sync.as_ref()
    }

    /// Adopt this device's open session, if the last process left one.
    pub async fn recover(&self) -> Result<Option<SessionSnapshot>> {
        self.clock.recover().await
    }

    /// Start the connectivity probe and queue drain loops.
    pub fn start_background(&self) {
        if let Some(sync) = &self.sync {
            sync.start();
        }
    }

    /// Stop every periodic activity and release the instance lock.
    pub async fn shutdown(&self) {
        self.clock.shutdown().await;
        if let Some(sync) = &self.sync {
            sync.shutdown().await;
        }
        let lock = self
            .lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(file) = lock {
            use fs2::FileExt;
            if let Err(e) = file.unlock() {
                warn!(error = %e, "failed to release instance lock");
            }
        }
        info!("engine shut down");
    }
}

/// Exclusive, non-blocking lock on the state directory.
fn acquire_lock(lock_path: &Path) -> Result<File> {
    use fs2::FileExt;

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path)?;

    file.try_lock_exclusive()
        .map_err(|_| Error::InstanceLocked(lock_path.display().to_string()))?;

    Ok(file)
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
