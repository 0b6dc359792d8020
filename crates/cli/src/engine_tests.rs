// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use crate::config::init_state_dir;
use crate::sync::MemoryRemote;
use stint_core::{ActivityMode, ManualClock};
use tempfile::TempDir;

fn setup() -> (TempDir, Config) {
    let temp = TempDir::new().unwrap();
    let config = Config::default();
    init_state_dir(temp.path(), &config).unwrap();
    (temp, config)
}

fn open(temp: &TempDir, config: &Config, clock: &ManualClock) -> Result<Engine> {
    Engine::open_with(
        temp.path(),
        config,
        Arc::new(clock.clone()),
        Some(Arc::new(MemoryRemote::default())),
    )
}

#[tokio::test]
async fn second_engine_on_same_dir_is_locked_out() {
    let (temp, config) = setup();
    let clock = ManualClock::at_millis(1_700_000_000_000);
    let first = open(&temp, &config, &clock).unwrap();

    let second = open(&temp, &config, &clock);

    assert!(matches!(second, Err(Error::InstanceLocked(_))));
    first.shutdown().await;
}

#[tokio::test]
async fn shutdown_releases_the_lock() {
    let (temp, config) = setup();
    let clock = ManualClock::at_millis(1_700_000_000_000);
    let first = open(&temp, &config, &clock).unwrap();
    first.shutdown().await;

    let second = open(&temp, &config, &clock).unwrap();
    second.shutdown().await;
}

#[tokio::test]
async fn open_session_survives_restart() {
    let (temp, config) = setup();
    let clock = ManualClock::at_millis(1_700_000_000_000);
    let first = open(&temp, &config, &clock).unwrap();
    let started = first.clock().start(ActivityMode::Flow).await.unwrap();
    clock.advance_ms(42_000);
    first.shutdown().await;
    drop(first);

    let second = open(&temp, &config, &clock).unwrap();
    let recovered = second.recover().await.unwrap().unwrap();

    assert_eq!(recovered.session_id, started.session_id);
    assert_eq!(recovered.elapsed_ms, 42_000);
    second.shutdown().await;
}

#[tokio::test]
async fn stopping_a_session_leaves_other_queue_entries_alone() {
    let (temp, config) = setup();
    let clock = ManualClock::at_millis(1_700_000_000_000);
    let engine = open(&temp, &config, &clock).unwrap();
    engine.clock().start(ActivityMode::Flow).await.unwrap();
    engine.clock().stop().await.unwrap();
    let queued = engine.store().queue_len().unwrap();

    engine.clock().start(ActivityMode::Pomodoro).await.unwrap();
    engine.clock().stop().await.unwrap();

    assert_eq!(engine.store().queue_len().unwrap(), queued + 1);
    engine.shutdown().await;
}

#[test]
fn open_without_remote_has_no_sync_engine() {
    let (temp, config) = setup();
    let engine = Engine::open_with(
        temp.path(),
        &config,
        Arc::new(ManualClock::at_millis(0)),
        None,
    )
    .unwrap();

    assert!(engine.sync().is_none());
    assert_eq!(engine.state_dir(), temp.path());
}
