// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

use std::path::Path;

use stint_core::{ActivityMode, LocalStore};

use crate::config::{db_path, init_state_dir, Config, RemoteConfig};
use crate::error::Result;

pub fn run(state_dir: &Path, remote: Option<String>, mode: Option<String>) -> Result<()> {
    let device_id = init(state_dir, remote, mode)?;

    println!("Initialized stint at {}", state_dir.display());
    println!("Device: {}", device_id);
    Ok(())
}

/// Write the config and create the store. Returns the new device id.
pub(crate) fn init(
    state_dir: &Path,
    remote: Option<String>,
    mode: Option<String>,
) -> Result<String> {
    let mut config = Config::default();
    if let Some(mode) = mode {
        config.default_mode = mode.parse::<ActivityMode>()?;
    }
    if let Some(url) = remote {
        config.remote = Some(RemoteConfig { url, token: None });
    }

    init_state_dir(state_dir, &config)?;
    let store = LocalStore::open(&db_path(state_dir))?;
    Ok(store.device_id()?)
}

#[cfg(test)]
#[path = "init_tests.rs"]
mod tests;
