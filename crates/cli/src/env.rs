// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

//! Centralized environment variable access.
//!
//! All runtime environment variables used by stint are defined here
//! with typed accessor functions. The variable name constants are generated
//! by `build.rs` and live in the [`vars`] submodule.

use std::path::PathBuf;

/// Generated environment variable name constants.
pub mod vars {
    include!(concat!(env!("OUT_DIR"), "/env_vars.rs"));
}

/// Returns the value of `STINT_HOME` if set and non-empty.
pub fn stint_home() -> Option<PathBuf> {
    non_empty(vars::STINT_HOME).map(PathBuf::from)
}

/// Returns the value of `STINT_REMOTE_URL` if set and non-empty.
///
/// Overrides `[remote] url` from `config.toml`.
pub fn remote_url() -> Option<String> {
    non_empty(vars::STINT_REMOTE_URL)
}

/// Returns the value of `STINT_USER` if set and non-empty.
pub fn user() -> Option<String> {
    non_empty(vars::STINT_USER)
}

/// Returns true if `RUST_LOG` is set, in which case it wins over `--verbose`.
pub fn log_filter_set() -> bool {
    std::env::var(vars::RUST_LOG).is_ok()
}

fn non_empty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
