// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

pub mod annotate;
pub mod init;
pub mod lifecycle;
pub mod list;
pub mod login;
pub mod show;
pub mod sync;
#[cfg(test)]
#[path = "mod_tests.rs"]
pub mod testing;
pub mod watch;

use std::path::Path;

use serde::Serialize;

use crate::cli::EngineCommand;
use crate::config::Config;
use crate::engine::Engine;
use crate::error::Result;

/// Open the engine, adopt any session the last process left open, run the
/// command, and shut down whatever the outcome.
pub async fn execute(state_dir: &Path, config: &Config, command: EngineCommand) -> Result<()> {
    let engine = Engine::open(state_dir, config)?;
    let result = match engine.recover().await {
        Ok(_) => dispatch(&engine, config, command).await,
        Err(e) => Err(e),
    };
    engine.shutdown().await;
    result
}

async fn dispatch(engine: &Engine, config: &Config, command: EngineCommand) -> Result<()> {
    match command {
        EngineCommand::Start { mode } => lifecycle::start(engine, config, mode).await,
        EngineCommand::Pause => lifecycle::pause(engine).await,
        EngineCommand::Resume => lifecycle::resume(engine).await,
        EngineCommand::Stop => lifecycle::stop(engine).await,
        EngineCommand::Mark => lifecycle::mark(engine).await,
        EngineCommand::Status { output } => lifecycle::status(engine, output).await,
        EngineCommand::List {
            filter,
            limits,
            output,
        } => list::run(engine.store(), &filter, &limits, output),
        EngineCommand::Show { id, output } => show::run(engine.store(), &id, output),
        EngineCommand::Delete { id } => show::delete(engine.store(), &id),
        EngineCommand::Annotate { args, note } => annotate::run(engine, &args, note).await,
        EngineCommand::Login { user_id } => login::run(engine.store(), user_id),
        EngineCommand::Sync { output } => sync::run(engine, output).await,
        EngineCommand::Queue { output } => sync::queue(engine.store(), output),
        EngineCommand::Conflicts { output } => sync::conflicts(engine.store(), output),
        EngineCommand::Watch => watch::run(engine).await,
    }
}

/// Print a value as pretty JSON.
pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
