// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

use std::sync::Arc;

use stint_core::LocalStore;

use crate::cli::OutputFormat;
use crate::display::{format_conflict, format_queue_entry, format_report};
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::sync::{SyncEngine, SyncReport};

use super::print_json;

/// A full pass against the remote, ignoring backoff.
pub(crate) async fn sync_now(engine: &Engine) -> Result<SyncReport> {
    let sync: &Arc<SyncEngine> = engine.sync().ok_or(Error::RemoteNotConfigured)?;
    if engine.store().device_config()?.owner_user_id.is_none() {
        return Err(Error::NoOwner);
    }
    sync.force_sync().await
}

pub async fn run(engine: &Engine, format: OutputFormat) -> Result<()> {
    let report = sync_now(engine).await?;
    match format {
        OutputFormat::Text => {
            println!("{}", format_report(&report));
            for failure in &report.persistent_failures {
                eprintln!(
                    "warning: {} {} has failed {} times: {}",
                    failure.kind, failure.record_id, failure.retry_count, failure.reason
                );
            }
        }
        OutputFormat::Json => print_json(&report)?,
    }
    Ok(())
}

pub fn queue(store: &LocalStore, format: OutputFormat) -> Result<()> {
    let entries = store.queue_entries()?;
    match format {
        OutputFormat::Text => {
            if entries.is_empty() {
                println!("Nothing queued");
            }
            for entry in &entries {
                println!("{}", format_queue_entry(entry));
            }
        }
        OutputFormat::Json => print_json(&entries)?,
    }
    Ok(())
}

pub fn conflicts(store: &LocalStore, format: OutputFormat) -> Result<()> {
    let copies = store.conflicts()?;
    match format {
        OutputFormat::Text => {
            if copies.is_empty() {
                println!("No conflicts");
            }
            for copy in &copies {
                println!("{}", format_conflict(copy));
            }
        }
        OutputFormat::Json => print_json(&copies)?,
    }
    Ok(())
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
