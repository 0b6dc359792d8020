// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

use serde::Serialize;
use stint_core::ActivityMode;

use crate::cli::OutputFormat;
use crate::clock::SessionSnapshot;
use crate::config::Config;
use crate::display::{format_duration, format_snapshot};
use crate::engine::Engine;
use crate::error::Result;

use super::print_json;

/// JSON output structure for the status command.
#[derive(Debug, Serialize)]
struct StatusJson {
    session: Option<SessionSnapshot>,
    device_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    owner_user_id: Option<String>,
    queued: usize,
    /// Sessions flagged as diverged from the remote.
    conflicted: usize,
    sync_enabled: bool,
}

impl StatusJson {
    fn collect(engine: &Engine, session: Option<SessionSnapshot>) -> Result<Self> {
        let store = engine.store();
        let device = store.device_config()?;
        Ok(StatusJson {
            session,
            device_id: device.device_id,
            owner_user_id: device.owner_user_id,
            queued: store.queue_len()?,
            conflicted: store.conflicted_sessions()?.len(),
            sync_enabled: engine.sync().is_some(),
        })
    }
}

pub async fn start(engine: &Engine, config: &Config, mode: Option<String>) -> Result<()> {
    let mode = match mode {
        Some(m) => m.parse::<ActivityMode>()?,
        None => config.default_mode,
    };
    let snapshot = engine.clock().start(mode).await?;
    println!("Started {} ({})", snapshot.session_id, snapshot.mode);
    Ok(())
}

pub async fn pause(engine: &Engine) -> Result<()> {
    let snapshot = engine.clock().pause().await?;
    println!(
        "Paused {} at {}",
        snapshot.session_id,
        format_duration(snapshot.elapsed_ms)
    );
    Ok(())
}

pub async fn resume(engine: &Engine) -> Result<()> {
    let snapshot = engine.clock().resume().await?;
    println!(
        "Resumed {} at {}",
        snapshot.session_id,
        format_duration(snapshot.elapsed_ms)
    );
    Ok(())
}

pub async fn stop(engine: &Engine) -> Result<()> {
    let snapshot = engine.clock().stop().await?;
    println!(
        "Stopped {}: {} active, {} paused",
        snapshot.session_id,
        format_duration(snapshot.elapsed_ms),
        format_duration(snapshot.paused_ms)
    );
    Ok(())
}

pub async fn mark(engine: &Engine) -> Result<()> {
    let snapshot = engine.clock().log_event().await?;
    println!(
        "Marked event {} at {}",
        snapshot.events,
        format_duration(snapshot.elapsed_ms)
    );
    Ok(())
}

pub async fn status(engine: &Engine, format: OutputFormat) -> Result<()> {
    let status = StatusJson::collect(engine, engine.clock().status().await)?;
    match format {
        OutputFormat::Text => {
            match &status.session {
                Some(snapshot) => println!("{}", format_snapshot(snapshot)),
                None => println!("No active session"),
            }
            if status.conflicted > 0 {
                println!(
                    "{} session(s) in conflict, see 'stint conflicts'",
                    status.conflicted
                );
            }
        }
        OutputFormat::Json => print_json(&status)?,
    }
    Ok(())
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
