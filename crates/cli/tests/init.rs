// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

mod common;
use common::*;

#[test]
fn creates_state_dir() {
    let temp = TempDir::new().unwrap();
    let home = temp.path().join("stint");

    stint(&home)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized stint"))
        .stdout(predicate::str::contains("Device: "));

    assert!(home.join("config.toml").exists());
    assert!(home.join("stint.db").exists());
}

#[test]
fn fails_if_already_initialized() {
    let temp = init_temp();

    stint(temp.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already initialized"));
}

#[test]
fn commands_require_init() {
    let temp = TempDir::new().unwrap();

    stint(temp.path())
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("stint init"));
}

#[test]
fn init_records_remote_and_mode() {
    let temp = TempDir::new().unwrap();

    stint(temp.path())
        .args(["init", "--remote", "https://sync.example.com", "--mode", "pomodoro"])
        .assert()
        .success();

    let config = std::fs::read_to_string(temp.path().join("config.toml")).unwrap();
    assert!(config.contains("https://sync.example.com"));
    assert!(config.contains("pomodoro"));
}
