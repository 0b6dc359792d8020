// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use crate::commands::testing::TestContext;
use stint_core::{ActivityMode, RecordKind};

fn args(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn label_alone_targets_the_open_session() {
    let ctx = TestContext::offline();
    let open = ctx.engine.clock().start(ActivityMode::Flow).await.unwrap();

    let annotation = annotate(&ctx.engine, &args(&["deep-work"]), None)
        .await
        .unwrap();

    assert_eq!(annotation.session_id, open.session_id);
    let stored = ctx.engine.store().annotations_for(&open.session_id).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].label, "deep-work");
    ctx.engine.shutdown().await;
}

#[tokio::test]
async fn label_alone_without_open_session_fails() {
    let ctx = TestContext::offline();

    let err = annotate(&ctx.engine, &args(&["focus"]), None)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::NoActiveSession));
    ctx.engine.shutdown().await;
}

#[tokio::test]
async fn explicit_id_targets_a_past_session_and_inherits_owner() {
    let ctx = TestContext::offline();
    let id = ctx.finished_session(30).await;
    ctx.engine.store().set_owner_user_id(Some("user-1")).unwrap();

    let annotation = annotate(
        &ctx.engine,
        &args(&[&id[..10], "review"]),
        Some("pairing".to_string()),
    )
    .await
    .unwrap();

    assert_eq!(annotation.session_id, id);
    let stored = ctx.engine.store().get_annotation(&annotation.id).unwrap();
    assert_eq!(stored.owner_user_id.as_deref(), Some("user-1"));
    assert_eq!(stored.note.as_deref(), Some("pairing"));
    assert!(ctx
        .engine
        .store()
        .queue_entry(RecordKind::Annotation, &annotation.id)
        .unwrap()
        .is_some());
    ctx.engine.shutdown().await;
}
