// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

use serde::Serialize;
use stint_core::{Annotation, LocalStore};

use crate::cli::OutputFormat;
use crate::display::format_session_details;
use crate::error::Result;

use super::list::SessionJson;
use super::print_json;

#[derive(Serialize)]
struct ShowJson<'a> {
    #[serde(flatten)]
    session: SessionJson<'a>,
    annotations: &'a [Annotation],
}

pub fn run(store: &LocalStore, id: &str, format: OutputFormat) -> Result<()> {
    let id = store.resolve_session_id(id)?;
    let session = store.get_session(&id)?;
    let annotations = store.annotations_for(&id)?;
    let now = store.now();

    match format {
        OutputFormat::Text => {
            println!("{}", format_session_details(&session, &annotations, now))
        }
        OutputFormat::Json => print_json(&ShowJson {
            session: SessionJson::new(&session, now),
            annotations: &annotations,
        })?,
    }
    Ok(())
}

/// Delete a stopped session locally and queue the remote delete.
pub fn delete(store: &LocalStore, id: &str) -> Result<()> {
    let id = store.resolve_session_id(id)?;
    store.delete_session(&id)?;
    println!("Deleted {}", id);
    Ok(())
}

#[cfg(test)]
#[path = "show_tests.rs"]
mod tests;
