// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

//! Test infrastructure for running commands against a temporary state
//! directory with a manual clock and an in-memory remote.

use std::sync::Arc;

use stint_core::ManualClock;
use tempfile::TempDir;

use crate::config::{init_state_dir, Config};
use crate::engine::Engine;
use crate::sync::MemoryRemote;

pub const T0: i64 = 1_700_000_000_000;

pub struct TestContext {
    pub engine: Engine,
    pub config: Config,
    pub clock: ManualClock,
    pub remote: MemoryRemote,
    _temp_dir: TempDir,
}

impl TestContext {
    pub fn new() -> Self {
        Self::build(true)
    }

    /// A context whose engine has no remote configured.
    pub fn offline() -> Self {
        Self::build(false)
    }

    fn build(with_remote: bool) -> Self {
        let temp_dir = TempDir::new().expect("temp dir");
        let config = Config::default();
        init_state_dir(temp_dir.path(), &config).unwrap();
        let clock = ManualClock::at_millis(T0);
        let remote = MemoryRemote::default();
        let engine = Engine::open_with(
            temp_dir.path(),
            &config,
            Arc::new(clock.clone()),
            with_remote.then(|| Arc::new(remote.clone()) as Arc<dyn crate::sync::Remote>),
        )
        .unwrap();
        TestContext {
            engine,
            config,
            clock,
            remote,
            _temp_dir: temp_dir,
        }
    }

    /// Start, run for `secs`, and stop a session. Returns its id.
    pub async fn finished_session(&self, secs: i64) -> String {
        let clock = self.engine.clock();
        let started = clock
            .start(stint_core::ActivityMode::Flow)
            .await
            .unwrap();
        self.clock.advance_ms(secs * 1000);
        clock.stop().await.unwrap();
        started.session_id
    }
}
