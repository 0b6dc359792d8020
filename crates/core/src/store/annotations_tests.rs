// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use crate::clock::{ClockSource, ManualClock};
use crate::session::{ActivityMode, Session};
use std::sync::Arc;

fn setup() -> (LocalStore, ManualClock) {
    let clock = ManualClock::at_millis(1_700_000_000_000);
    let store = LocalStore::open_in_memory_with_clock(Arc::new(clock.clone())).unwrap();
    let device = store.device_id().unwrap();
    let session = Session::start(
        "s-1".to_string(),
        device,
        None,
        ActivityMode::Flow,
        clock.now(),
    );
    store.create_session(&session).unwrap();
    (store, clock)
}

fn annotation(id: &str, label: &str, clock: &ManualClock) -> Annotation {
    Annotation::new(
        id.to_string(),
        "s-1".to_string(),
        label.to_string(),
        Some("note".to_string()),
        clock.now(),
    )
}

#[test]
fn create_and_list_annotations() {
    let (store, clock) = setup();
    store.create_annotation(&annotation("a-1", "focus", &clock)).unwrap();
    clock.advance_ms(10);
    store.create_annotation(&annotation("a-2", "review", &clock)).unwrap();

    let annotations = store.annotations_for("s-1").unwrap();
    let labels: Vec<_> = annotations.iter().map(|a| a.label.as_str()).collect();
    assert_eq!(labels, vec!["focus", "review"]);
    assert_eq!(annotations[0].note.as_deref(), Some("note"));
    assert_eq!(annotations[0].sync_state, SyncState::Pending);
    assert_eq!(annotations[0].local_version, 1);
    assert!(store
        .queue_entry(RecordKind::Annotation, "a-1")
        .unwrap()
        .is_some());
}

#[test]
fn annotation_requires_existing_session() {
    let (store, clock) = setup();
    let mut orphan = annotation("a-1", "focus", &clock);
    orphan.session_id = "missing".to_string();

    let err = store.create_annotation(&orphan).unwrap_err();

    assert!(matches!(err, Error::SessionNotFound(id) if id == "missing"));
}

#[test]
fn empty_label_is_rejected() {
    let (store, clock) = setup();
    let err = store
        .create_annotation(&annotation("a-1", "  ", &clock))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[test]
fn delete_annotation_queues_delete() {
    let (store, clock) = setup();
    store.create_annotation(&annotation("a-1", "focus", &clock)).unwrap();

    store.delete_annotation("a-1").unwrap();

    assert!(matches!(
        store.get_annotation("a-1"),
        Err(Error::AnnotationNotFound(_))
    ));
    assert!(store
        .has_pending_delete(RecordKind::Annotation, "a-1")
        .unwrap());
}

#[test]
fn deleting_missing_annotation_fails() {
    let (store, _) = setup();
    assert!(matches!(
        store.delete_annotation("nope"),
        Err(Error::AnnotationNotFound(_))
    ));
}
