// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

use stint_core::id::new_id;
use stint_core::Annotation;

use crate::engine::Engine;
use crate::error::{Error, Result};

/// Split `[ID] LABEL`. Without an id the open session is labelled.
async fn target(engine: &Engine, args: &[String]) -> Result<(String, String)> {
    match args {
        [label] => {
            let snapshot = engine
                .clock()
                .status()
                .await
                .ok_or(Error::NoActiveSession)?;
            Ok((snapshot.session_id, label.clone()))
        }
        [id, label] => Ok((engine.store().resolve_session_id(id)?, label.clone())),
        _ => Err(Error::InvalidInput(
            "expected a label, optionally preceded by a session id".to_string(),
        )),
    }
}

pub async fn run(engine: &Engine, args: &[String], note: Option<String>) -> Result<()> {
    let annotation = annotate(engine, args, note).await?;
    println!(
        "Annotated {} with '{}' ({})",
        annotation.session_id, annotation.label, annotation.id
    );
    Ok(())
}

pub(crate) async fn annotate(
    engine: &Engine,
    args: &[String],
    note: Option<String>,
) -> Result<Annotation> {
    let (session_id, label) = target(engine, args).await?;
    let store = engine.store();

    let mut annotation = Annotation::new(
        new_id(),
        session_id,
        label.trim().to_string(),
        note,
        store.now(),
    );
    annotation.owner_user_id = store.device_config()?.owner_user_id;
    let version = store.create_annotation(&annotation)?;
    annotation.local_version = version;
    Ok(annotation)
}

#[cfg(test)]
#[path = "annotate_tests.rs"]
mod tests;
