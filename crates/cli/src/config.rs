// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

//! State directory and configuration management.
//!
//! Everything stint persists lives in one state directory:
//! - `config.toml`: clock cadence, sync tuning and the optional remote
//! - `stint.db`: the local store
//! - `stint.lock`: single-instance lock held by the running engine
//! - `stint.log`: log output for long-running commands

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use stint_core::ActivityMode;

use crate::env;
use crate::error::{Error, Result};

const STATE_DIR_NAME: &str = "stint";
const FALLBACK_STATE_DIR: &str = ".stint";
const CONFIG_FILE_NAME: &str = "config.toml";
const DB_FILE_NAME: &str = "stint.db";
const LOCK_FILE_NAME: &str = "stint.lock";
const LOG_FILE_NAME: &str = "stint.log";

/// Configuration stored in `<state dir>/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Mode used by `stint start` when `--mode` is not given.
    #[serde(default)]
    pub default_mode: ActivityMode,
    #[serde(default)]
    pub clock: ClockConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    /// Remote authority (optional - if absent, runs in local-only mode).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteConfig>,
}

/// Cadence of the session clock's periodic activities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClockConfig {
    /// Elapsed-time recomputation for observers (default: 1000).
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Crash-recovery checkpoint cadence (default: 5000).
    #[serde(default = "default_checkpoint_interval_ms")]
    pub checkpoint_interval_ms: u64,
    /// A tick arriving this much later than scheduled is treated as a
    /// suspension (default: 3000).
    #[serde(default = "default_suspend_threshold_ms")]
    pub suspend_threshold_ms: u64,
}

/// Sync engine tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Set to false to keep the remote configured but stop syncing.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Active reachability probe interval in seconds (default: 30).
    #[serde(default = "default_probe_interval_secs")]
    pub probe_interval_secs: u64,
    /// Periodic queue drain interval in seconds (default: 60).
    #[serde(default = "default_drain_interval_secs")]
    pub drain_interval_secs: u64,
    /// Timeout for each remote call in seconds (default: 10).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Failures after which an entry is reported as persistent (default: 8).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Initial delay for exponential backoff in milliseconds (default: 1000).
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// Maximum delay between attempts in seconds (default: 300).
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: u64,
}

/// Remote authority connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the record API, e.g. `https://sync.example.com/v1`.
    pub url: String,
    /// Optional bearer token sent with every request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

fn default_tick_interval_ms() -> u64 {
    1_000
}

fn default_checkpoint_interval_ms() -> u64 {
    5_000
}

fn default_suspend_threshold_ms() -> u64 {
    3_000
}

fn default_true() -> bool {
    true
}

fn default_probe_interval_secs() -> u64 {
    30
}

fn default_drain_interval_secs() -> u64 {
    60
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    8
}

fn default_initial_delay_ms() -> u64 {
    1_000
}

fn default_max_delay_secs() -> u64 {
    300
}

impl Default for ClockConfig {
    fn default() -> Self {
        ClockConfig {
            tick_interval_ms: default_tick_interval_ms(),
            checkpoint_interval_ms: default_checkpoint_interval_ms(),
            suspend_threshold_ms: default_suspend_threshold_ms(),
        }
    }
}

impl ClockConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn checkpoint_interval(&self) -> Duration {
        Duration::from_millis(self.checkpoint_interval_ms.max(1))
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            enabled: true,
            probe_interval_secs: default_probe_interval_secs(),
            drain_interval_secs: default_drain_interval_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_secs: default_max_delay_secs(),
        }
    }
}

impl SyncConfig {
    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs.max(1))
    }

    pub fn drain_interval(&self) -> Duration {
        Duration::from_secs(self.drain_interval_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Failure count at which an entry is reported; never below one.
    pub fn retry_limit(&self) -> u32 {
        self.max_retries.max(1)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            default_mode: ActivityMode::default(),
            clock: ClockConfig::default(),
            sync: SyncConfig::default(),
            remote: None,
        }
    }
}

impl Config {
    /// Loads configuration from the given state directory.
    pub fn load(state_dir: &Path) -> Result<Self> {
        let config_path = state_dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Err(Error::NotInitialized);
        }
        let content = fs::read_to_string(&config_path)
            .map_err(|e| Error::Config(format!("failed to read config: {}", e)))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Saves configuration to the given state directory.
    pub fn save(&self, state_dir: &Path) -> Result<()> {
        let config_path = state_dir.join(CONFIG_FILE_NAME);
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
        fs::write(&config_path, content)?;
        Ok(())
    }

    /// The remote URL in effect, with `STINT_REMOTE_URL` taking precedence.
    pub fn remote_url(&self) -> Option<String> {
        env::remote_url().or_else(|| self.remote.as_ref().map(|r| r.url.clone()))
    }

    pub fn remote_token(&self) -> Option<&str> {
        self.remote.as_ref().and_then(|r| r.token.as_deref())
    }

    /// Returns true if a remote is configured and syncing is enabled.
    pub fn is_sync_enabled(&self) -> bool {
        self.sync.enabled && self.remote_url().is_some()
    }
}

/// Resolve the state directory: `$STINT_HOME`, then the platform's local
/// data directory, then `./.stint`.
pub fn state_dir() -> PathBuf {
    if let Some(dir) = env::stint_home() {
        return dir;
    }
    dirs::data_local_dir()
        .map(|d| d.join(STATE_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(FALLBACK_STATE_DIR))
}

pub fn db_path(state_dir: &Path) -> PathBuf {
    state_dir.join(DB_FILE_NAME)
}

pub fn lock_path(state_dir: &Path) -> PathBuf {
    state_dir.join(LOCK_FILE_NAME)
}

pub fn log_path(state_dir: &Path) -> PathBuf {
    state_dir.join(LOG_FILE_NAME)
}

/// Returns true if `state_dir` holds a config file.
pub fn is_initialized(state_dir: &Path) -> bool {
    state_dir.join(CONFIG_FILE_NAME).is_file()
}

/// Initialize a state directory with a default config.
///
/// The directory itself may already exist (e.g. created by the installer);
/// an existing `config.toml` is an error.
pub fn init_state_dir(state_dir: &Path, config: &Config) -> Result<PathBuf> {
    if is_initialized(state_dir) {
        return Err(Error::AlreadyInitialized(state_dir.display().to_string()));
    }

    fs::create_dir_all(state_dir)?;
    config.save(state_dir)?;

    Ok(state_dir.to_path_buf())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
