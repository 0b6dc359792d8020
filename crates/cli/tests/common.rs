// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

// Allow unused items: test helpers are shared across multiple test binaries,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;

pub use predicates::prelude::*;
pub use tempfile::TempDir;

/// `stint` with its state directory pinned to `home`.
pub fn stint(home: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("stint");
    cmd.env("STINT_HOME", home)
        .env_remove("STINT_REMOTE_URL")
        .env_remove("STINT_USER")
        .env_remove("RUST_LOG");
    cmd
}

/// Helper to create an initialized state directory
pub fn init_temp() -> TempDir {
    let temp = TempDir::new().unwrap();
    stint(temp.path()).arg("init").assert().success();
    temp
}

/// Helper to run a command and return its stdout
pub fn stdout(temp: &TempDir, args: &[&str]) -> String {
    let output = stint(temp.path()).args(args).output().unwrap();
    assert!(output.status.success(), "stint {:?} failed: {:?}", args, output);
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Helper to start a session and return its ID
pub fn start_session(temp: &TempDir) -> String {
    let out = stdout(temp, &["start"]);
    out.split_whitespace()
        .nth(1)
        .unwrap()
        .to_string()
}
