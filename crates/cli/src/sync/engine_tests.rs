// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use crate::sync::MemoryRemote;
use std::time::Duration;
use stint_core::id::new_id;
use stint_core::{ActivityMode, Annotation, ClockSource, ManualClock, Session};

struct Harness {
    store: Arc<LocalStore>,
    clock: ManualClock,
    remote: MemoryRemote,
    engine: Arc<SyncEngine>,
    device: String,
}

fn harness_with(config: SyncConfig) -> Harness {
    let clock = ManualClock::at_millis(1_700_000_000_000);
    let store = Arc::new(LocalStore::open_in_memory_with_clock(Arc::new(clock.clone())).unwrap());
    store.set_owner_user_id(Some("user-1")).unwrap();
    let device = store.device_id().unwrap();
    let remote = MemoryRemote::new();
    let engine = Arc::new(SyncEngine::new(
        Arc::clone(&store),
        Arc::new(remote.clone()),
        config,
    ));
    Harness {
        store,
        clock,
        remote,
        engine,
        device,
    }
}

fn harness() -> Harness {
    harness_with(SyncConfig::default())
}

impl Harness {
    /// A finished session owned by user-1, already persisted and queued.
    fn finished_session(&self) -> Session {
        let mut session = Session::start(
            new_id(),
            self.device.clone(),
            Some("user-1".to_string()),
            ActivityMode::Flow,
            self.clock.now(),
        );
        session
            .stop(self.clock.now() + TimeDelta::seconds(30))
            .unwrap();
        self.store.create_session(&session).unwrap();
        self.store.get_session(&session.id).unwrap()
    }
}

fn drain_events(rx: &mut broadcast::Receiver<SyncEvent>) -> Vec<SyncEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn offline_creates_sync_once_online() {
    let h = harness();
    let ids: Vec<String> = (0..3).map(|_| h.finished_session().id).collect();

    let report = h.engine.process_queue().await.unwrap();
    assert!(report.is_empty());
    assert!(h.remote.is_empty());

    assert!(h.engine.probe().await);
    let report = h.engine.process_queue().await.unwrap();

    assert_eq!(report.pushed, 3);
    assert_eq!(h.remote.len(), 3);
    assert_eq!(h.remote.upsert_calls(), 3);
    for id in &ids {
        let local = h.store.get_session(id).unwrap();
        assert_eq!(local.sync_state, SyncState::Synced);
        assert!(local.remote_revision.is_some());
    }
    assert_eq!(h.store.queue_len().unwrap(), 0);
}

#[tokio::test]
async fn retried_push_does_not_duplicate() {
    let h = harness();
    let session = h.finished_session();
    h.engine.force_sync().await.unwrap();

    // The same upload again, as after a lost acknowledgement.
    h.engine
        .enqueue(&SyncOp::upsert(RecordKind::Session, session.id.clone()))
        .unwrap();
    let report = h.engine.force_sync().await.unwrap();

    assert_eq!(report.pushed, 1);
    assert_eq!(h.remote.upsert_calls(), 2);
    assert_eq!(h.remote.len(), 1);
    assert_eq!(h.store.queue_len().unwrap(), 0);
}

#[tokio::test]
async fn push_happens_before_pull() {
    let h = harness();
    let session = h.finished_session();

    let report = h.engine.force_sync().await.unwrap();

    assert_eq!(report.pushed, 1);
    assert_eq!(report.pulled, 0);
    assert_eq!(report.conflicts, 0);
    assert_eq!(
        h.store.get_session(&session.id).unwrap().sync_state,
        SyncState::Synced
    );
}

#[tokio::test]
async fn pull_inserts_records_from_other_devices() {
    let h = harness();
    let mut other = Session::start(
        new_id(),
        "other-device".to_string(),
        Some("user-1".to_string()),
        ActivityMode::Pomodoro,
        h.clock.now(),
    );
    other.stop(h.clock.now() + TimeDelta::minutes(25)).unwrap();
    let revision = h.remote.seed(RecordEnvelope::session(&other).unwrap());

    let report = h.engine.pull("user-1").await.unwrap();

    assert_eq!(report.pulled, 1);
    let local = h.store.get_session(&other.id).unwrap();
    assert_eq!(local.sync_state, SyncState::Synced);
    assert_eq!(local.remote_revision, Some(revision));
    assert_eq!(local.elapsed_ms(h.clock.now()), 25 * 60 * 1000);
}

#[tokio::test]
async fn pull_flags_pending_collision_as_conflict() {
    let h = harness();
    let local = h.finished_session();
    let mut remote_copy = local.clone();
    remote_copy.activity_mode = ActivityMode::Pomodoro;
    h.remote
        .seed(RecordEnvelope::session(&remote_copy).unwrap());
    let mut rx = h.engine.subscribe();

    let report = h.engine.pull("user-1").await.unwrap();

    assert_eq!(report.conflicts, 1);
    let stored = h.store.get_session(&local.id).unwrap();
    assert_eq!(stored.sync_state, SyncState::Conflict);
    assert_eq!(stored.activity_mode, ActivityMode::Flow);
    assert_eq!(
        h.remote
            .get(RecordKind::Session, &local.id)
            .unwrap()
            .payload["activity_mode"],
        "pomodoro"
    );
    assert!(drain_events(&mut rx).contains(&SyncEvent::ConflictDetected {
        kind: RecordKind::Session,
        record_id: local.id.clone(),
    }));

    // The conflicted record is not pushed over the remote copy.
    let report = h.engine.force_sync().await.unwrap();
    assert_eq!(report.pushed, 0);
    assert_eq!(report.conflicts, 0);
    assert_eq!(h.remote.upsert_calls(), 0);
    assert_eq!(h.store.conflicts().unwrap().len(), 1);
}

#[tokio::test]
async fn rejected_push_backs_off() {
    let h = harness();
    let session = h.finished_session();
    h.remote.reject_next_upserts(1);
    h.engine.probe().await;

    let report = h.engine.process_queue().await.unwrap();
    assert_eq!(report.failed, 1);
    let entry = h
        .store
        .queue_entry(RecordKind::Session, &session.id)
        .unwrap()
        .unwrap();
    assert_eq!(entry.retry_count, 1);
    assert_eq!(
        entry.next_attempt_at,
        Some(h.clock.now() + TimeDelta::milliseconds(1_000))
    );
    assert_eq!(
        h.store.get_session(&session.id).unwrap().sync_state,
        SyncState::Pending
    );

    let report = h.engine.process_queue().await.unwrap();
    assert_eq!(report.pushed, 0);
    assert_eq!(h.remote.upsert_calls(), 1);

    h.clock.advance_ms(1_000);
    let report = h.engine.process_queue().await.unwrap();
    assert_eq!(report.pushed, 1);
    assert_eq!(h.store.queue_len().unwrap(), 0);
}

#[tokio::test]
async fn persistent_failure_is_reported_once_and_entry_kept() {
    let mut config = SyncConfig::default();
    config.max_retries = 2;
    let h = harness_with(config);
    let session = h.finished_session();
    h.remote.reject_next_upserts(10);
    let mut rx = h.engine.subscribe();

    let mut persistent = Vec::new();
    for _ in 0..4 {
        let report = h.engine.force_sync().await.unwrap();
        persistent.extend(report.persistent_failures);
    }

    assert_eq!(persistent.len(), 1);
    assert_eq!(persistent[0].record_id, session.id);
    assert_eq!(persistent[0].retry_count, 2);
    let events = drain_events(&mut rx);
    let reported = events
        .iter()
        .filter(|e| matches!(e, SyncEvent::PersistentFailure(_)))
        .count();
    assert_eq!(reported, 1);
    let entry = h
        .store
        .queue_entry(RecordKind::Session, &session.id)
        .unwrap()
        .unwrap();
    assert_eq!(entry.retry_count, 4);
}

#[tokio::test]
async fn zero_max_retries_reports_the_first_failure() {
    let mut config = SyncConfig::default();
    config.max_retries = 0;
    let h = harness_with(config);
    let session = h.finished_session();
    h.remote.reject_next_upserts(10);

    let mut persistent = Vec::new();
    for _ in 0..3 {
        let report = h.engine.force_sync().await.unwrap();
        persistent.extend(report.persistent_failures);
    }

    assert_eq!(persistent.len(), 1);
    assert_eq!(persistent[0].record_id, session.id);
    assert_eq!(persistent[0].retry_count, 1);
}

#[tokio::test]
async fn network_failure_marks_engine_offline() {
    let h = harness();
    let session = h.finished_session();
    h.engine.probe().await;
    h.remote.set_online(false);

    let err = h.engine.process_queue().await.unwrap_err();

    assert!(matches!(err, Error::Remote(RemoteError::Network(_))));
    assert!(!h.engine.is_online());
    let entry = h
        .store
        .queue_entry(RecordKind::Session, &session.id)
        .unwrap()
        .unwrap();
    assert_eq!(entry.retry_count, 1);
    assert!(entry.last_error.unwrap().contains("network"));
}

#[tokio::test(start_paused = true)]
async fn slow_remote_times_out() {
    let h = harness();
    h.finished_session();
    h.remote.set_delay(Some(Duration::from_secs(60)));

    let err = h.engine.force_sync().await.unwrap_err();

    assert!(matches!(err, Error::Remote(RemoteError::Timeout)));
    assert_eq!(h.store.queue_len().unwrap(), 1);
}

#[tokio::test]
async fn local_delete_reaches_remote() {
    let h = harness();
    let session = h.finished_session();
    h.engine.force_sync().await.unwrap();
    assert_eq!(h.remote.len(), 1);

    h.store.delete_session(&session.id).unwrap();
    let report = h.engine.force_sync().await.unwrap();

    assert_eq!(report.deleted, 1);
    assert!(h.remote.is_empty());
    assert_eq!(h.store.queue_len().unwrap(), 0);
}

#[tokio::test]
async fn annotations_are_pushed_with_sessions() {
    let h = harness();
    let session = h.finished_session();
    let annotation = Annotation::new(
        new_id(),
        session.id.clone(),
        "deep work".to_string(),
        None,
        h.clock.now(),
    );
    h.store.create_annotation(&annotation).unwrap();

    let report = h.engine.force_sync().await.unwrap();

    assert_eq!(report.pushed, 2);
    assert!(h
        .remote
        .get(RecordKind::Annotation, &annotation.id)
        .is_some());
    assert_eq!(
        h.store.get_annotation(&annotation.id).unwrap().sync_state,
        SyncState::Synced
    );
}

#[tokio::test]
async fn pass_emits_started_then_succeeded() {
    let h = harness();
    h.finished_session();
    let mut rx = h.engine.subscribe();

    h.engine.force_sync().await.unwrap();

    let events = drain_events(&mut rx);
    assert_eq!(events[0], SyncEvent::Started);
    assert!(events
        .iter()
        .any(|e| matches!(e, SyncEvent::Succeeded(r) if r.pushed == 1)));
    assert_eq!(
        h.store
            .device_config()
            .unwrap()
            .counter(stint_core::device::COUNTER_SYNC_PASSES),
        1
    );
}

#[tokio::test]
async fn host_offline_signal_is_trusted() {
    let h = harness();
    h.engine.probe().await;
    let mut rx = h.engine.subscribe();

    h.engine.notify_network_change(false);

    assert!(!h.engine.is_online());
    assert_eq!(
        drain_events(&mut rx),
        vec![SyncEvent::ConnectivityChanged { online: false }]
    );
}

#[tokio::test(start_paused = true)]
async fn background_tasks_drain_when_remote_comes_online() {
    let h = harness();
    h.remote.set_online(false);
    let session = h.finished_session();
    let mut rx = h.engine.subscribe();
    h.engine.start();

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(!h.engine.is_online());
    assert!(h.remote.is_empty());

    h.remote.set_online(true);
    h.engine.notify_network_change(true);

    let pushed = tokio::time::timeout(Duration::from_secs(120), async {
        loop {
            match rx.recv().await {
                Ok(SyncEvent::Succeeded(report)) if report.pushed == 1 => return true,
                Ok(_) => continue,
                Err(_) => return false,
            }
        }
    })
    .await;

    assert!(matches!(pushed, Ok(true)));
    assert_eq!(
        h.store.get_session(&session.id).unwrap().sync_state,
        SyncState::Synced
    );
    h.engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_background_probes() {
    let h = harness();
    h.engine.start();
    tokio::time::sleep(Duration::from_secs(1)).await;

    h.engine.shutdown().await;
    let probes = h.remote.probe_calls();
    tokio::time::sleep(Duration::from_secs(600)).await;

    assert_eq!(h.remote.probe_calls(), probes);
}
