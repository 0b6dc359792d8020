// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use crate::annotation::Annotation;
use crate::clock::{ClockSource, ManualClock};
use crate::device::COUNTER_SESSIONS_STARTED;
use crate::id::is_valid_id;
use crate::session::{ActivityMode, Session};
use std::sync::Arc;

fn setup() -> (LocalStore, ManualClock) {
    let clock = ManualClock::at_millis(1_700_000_000_000);
    let store = LocalStore::open_in_memory_with_clock(Arc::new(clock.clone())).unwrap();
    (store, clock)
}

#[test]
fn device_singleton_is_created_on_open() {
    let (store, clock) = setup();
    let config = store.device_config().unwrap();

    assert!(is_valid_id(&config.device_id));
    assert_eq!(config.owner_user_id, None);
    assert_eq!(config.created_at, clock.now());
    assert!(config.counters.is_empty());
}

#[test]
fn counters_increment_from_zero() {
    let (store, _) = setup();
    assert_eq!(store.increment_counter(COUNTER_SESSIONS_STARTED).unwrap(), 1);
    assert_eq!(store.increment_counter(COUNTER_SESSIONS_STARTED).unwrap(), 2);

    let config = store.device_config().unwrap();
    assert_eq!(config.counter(COUNTER_SESSIONS_STARTED), 2);
    assert_eq!(config.counter("never"), 0);
}

#[test]
fn flags_default_to_false() {
    let (store, _) = setup();
    assert!(!store.flag("beta_sync").unwrap());

    store.set_flag("beta_sync", true).unwrap();
    assert!(store.flag("beta_sync").unwrap());
    assert!(store.device_config().unwrap().flag("beta_sync"));

    store.set_flag("beta_sync", false).unwrap();
    assert!(!store.flag("beta_sync").unwrap());
}

#[test]
fn set_owner_only_touches_singleton() {
    let (store, clock) = setup();
    let device = store.device_id().unwrap();
    let session = Session::start("s-1".into(), device, None, ActivityMode::Flow, clock.now());
    store.create_session(&session).unwrap();

    store.set_owner_user_id(Some("user-1")).unwrap();

    assert_eq!(
        store.device_config().unwrap().owner_user_id.as_deref(),
        Some("user-1")
    );
    assert_eq!(store.get_session("s-1").unwrap().owner_user_id, None);
}

#[test]
fn assign_owner_adopts_ownerless_records() {
    let (store, clock) = setup();
    let device = store.device_id().unwrap();
    let mut session = Session::start("s-1".into(), device, None, ActivityMode::Flow, clock.now());
    store.create_session(&session).unwrap();
    session.stop(clock.now()).unwrap();
    store.update_session(&session).unwrap();
    store
        .mark_synced(RecordKind::Session, "s-1", 2, Some("rev-1"))
        .unwrap();
    let annotation = Annotation::new(
        "a-1".into(),
        "s-1".into(),
        "focus".into(),
        None,
        clock.now(),
    );
    store.create_annotation(&annotation).unwrap();

    let adopted = store.assign_owner("user-1").unwrap();

    assert_eq!(adopted, 2);
    let session = store.get_session("s-1").unwrap();
    assert_eq!(session.owner_user_id.as_deref(), Some("user-1"));
    assert_eq!(session.sync_state, SyncState::Pending);
    assert_eq!(session.local_version, 3);
    let entry = store.queue_entry(RecordKind::Session, "s-1").unwrap().unwrap();
    assert_eq!(entry.version, 3);
    assert_eq!(
        store.get_annotation("a-1").unwrap().owner_user_id.as_deref(),
        Some("user-1")
    );

    assert_eq!(store.assign_owner("user-1").unwrap(), 0);
}

#[test]
fn assign_owner_rejects_blank_user() {
    let (store, _) = setup();
    assert!(matches!(
        store.assign_owner(" "),
        Err(Error::InvalidInput(_))
    ));
}
