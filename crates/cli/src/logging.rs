// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

//! Tracing subscriber setup for the binary.

use std::fs;
use std::path::Path;

use tracing_subscriber::EnvFilter;

use crate::env;

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set. Otherwise the level is `info` when logging to
/// a file or with `--verbose`, and `warn` on a plain stderr. With a log file
/// the output is appended there with ANSI disabled, falling back to stderr
/// if the file cannot be opened.
pub fn setup_logging(log_file: Option<&Path>, verbose: bool) {
    let default_level = if verbose || log_file.is_some() {
        "info"
    } else {
        "warn"
    };
    let filter = if env::log_filter_set() {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    } else {
        EnvFilter::new(default_level)
    };

    let file = log_file.and_then(|path| {
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()
    });

    // A second initialization (e.g. from tests) is ignored.
    if let Some(file) = file {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(file)
            .with_ansi(false)
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }
}
