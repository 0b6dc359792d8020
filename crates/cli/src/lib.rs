// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

//! stint - an offline-first activity session tracker.
//!
//! This crate provides the runtime around [`stint_core`]: the session
//! clock with its periodic tick and checkpoint activities, the sync engine
//! that drains the durable queue against a remote authority, and the
//! `stint` command line.
//!
//! # Main Components
//!
//! - [`Engine`] - process-wide owner of the store, clock and sync engine
//! - [`SessionClock`](clock::SessionClock) - session lifecycle and crash recovery
//! - [`SyncEngine`](sync::SyncEngine) - push/pull with conflict detection
//! - [`Config`] - `config.toml` in the state directory
//! - [`Error`] - Error types for all operations
//!
//! # Embedding
//!
//! ```rust,ignore
//! use stint::{config, Config, Engine};
//!
//! let dir = config::state_dir();
//! let config = Config::load(&dir)?;
//! let engine = Engine::open(&dir, &config)?;
//! engine.recover().await?;
//! engine.start_background();
//! engine.clock().start(config.default_mode).await?;
//! // ...
//! engine.shutdown().await;
//! ```

mod cli;
mod commands;
mod display;
mod logging;

pub mod clock;
pub mod config;
pub mod engine;
pub mod env;
pub mod error;
pub mod sync;

pub use cli::{Cli, Command, EngineCommand, LimitArgs, ListFilterArgs, OutputFormat};
pub use config::Config;
pub use engine::Engine;
pub use error::{Error, Result};

/// Execute a parsed command line. This is the main entry point of the
/// binary and installs the global log subscriber.
pub fn run(cli: Cli) -> Result<()> {
    let state_dir = config::state_dir();
    let log_file = match (&cli.log_file, &cli.command) {
        (Some(path), _) => Some(path.clone()),
        (None, Command::Engine(EngineCommand::Watch)) => Some(config::log_path(&state_dir)),
        (None, _) => None,
    };
    logging::setup_logging(log_file.as_deref(), cli.verbose);

    match cli.command {
        Command::Init { remote, mode } => commands::init::run(&state_dir, remote, mode),
        Command::Engine(command) => {
            let config = Config::load(&state_dir)?;
            let rt = tokio::runtime::Runtime::new()
                .map_err(|e| Error::Io(std::io::Error::other(format!("tokio: {}", e))))?;
            rt.block_on(commands::execute(&state_dir, &config, command))
        }
    }
}
