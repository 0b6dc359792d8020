// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

//! The sync engine: durable queue drain, pull with conflict detection and
//! the background connectivity and drain tasks.
//!
//! A pass pushes every due queue entry, then pulls the owner's records, so a
//! record created locally is never mistaken for one missing remotely. Only
//! one pass runs at a time.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::TimeDelta;
use stint_core::device::COUNTER_SYNC_PASSES;
use stint_core::{
    AnnotationRecord, LocalStore, OpAction, PullOutcome, QueueEntry, RecordKind, SessionRecord,
    SyncOp, SyncState,
};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::backoff::Backoff;
use super::connectivity::SharedConnectivity;
use super::events::{PersistentFailure, SyncEvent, SyncReport};
use super::remote::{RecordEnvelope, Remote, RemoteError, RemoteResult};
use crate::config::SyncConfig;
use crate::error::{Error, Result};

const EVENT_CAPACITY: usize = 64;

/// Push/pull engine against one remote authority.
pub struct SyncEngine {
    store: Arc<LocalStore>,
    remote: Arc<dyn Remote>,
    connectivity: Arc<SharedConnectivity>,
    config: SyncConfig,
    backoff: Backoff,
    events: broadcast::Sender<SyncEvent>,
    /// Serializes passes.
    pass_lock: tokio::sync::Mutex<()>,
    cancel_token: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

/// Whether a pass honours backoff timing and the connectivity flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PassMode {
    Scheduled,
    Forced,
}

impl SyncEngine {
    pub fn new(store: Arc<LocalStore>, remote: Arc<dyn Remote>, config: SyncConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let backoff = Backoff {
            initial_delay_ms: config.initial_delay_ms,
            max_delay_secs: config.max_delay_secs,
        };
        SyncEngine {
            store,
            remote,
            connectivity: Arc::new(SharedConnectivity::new()),
            config,
            backoff,
            events,
            pass_lock: tokio::sync::Mutex::new(()),
            cancel_token: CancellationToken::new(),
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    pub fn connectivity(&self) -> Arc<SharedConnectivity> {
        Arc::clone(&self.connectivity)
    }

    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    fn emit(&self, event: SyncEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }

    fn set_online(&self, online: bool) {
        if self.connectivity.set_online(online) {
            info!(online, "connectivity changed");
            self.emit(SyncEvent::ConnectivityChanged { online });
        }
    }

    /// Host network-change notification.
    ///
    /// Going offline is trusted immediately; coming online only triggers a
    /// probe, which confirms reachability before the queue drains.
    pub fn notify_network_change(&self, online: bool) {
        if online {
            self.connectivity.request_probe();
        } else {
            self.set_online(false);
        }
    }

    /// Durably record an operation against the remote.
    ///
    /// Upserts are stamped with the record's current local version.
    pub fn enqueue(&self, op: &SyncOp) -> Result<()> {
        let version = match op.action {
            OpAction::Delete => 0,
            OpAction::Upsert => match op.kind {
                RecordKind::Session => self.store.get_session(&op.record_id)?.local_version,
                RecordKind::Annotation => {
                    self.store.get_annotation(&op.record_id)?.local_version
                }
            },
        };
        self.store.enqueue(op, version)?;
        debug!(kind = %op.kind, id = %op.record_id, action = %op.action, "enqueued");
        Ok(())
    }

    /// Reachability check with the request timeout. Updates connectivity.
    pub async fn probe(&self) -> bool {
        let online = self.call(self.remote.probe()).await.is_ok();
        self.connectivity.record_probe(self.store.now());
        self.set_online(online);
        online
    }

    /// Drain due queue entries, then pull, if the remote is judged reachable.
    ///
    /// Offline, this returns an empty report without touching the remote.
    pub async fn process_queue(&self) -> Result<SyncReport> {
        if !self.is_online() {
            debug!("offline, skipping drain");
            return Ok(SyncReport::default());
        }
        self.run_pass(PassMode::Scheduled).await
    }

    /// Push everything queued, ignoring backoff, then pull.
    ///
    /// Returns an error if the remote could not be reached; failures of
    /// individual records are counted in the report.
    pub async fn force_sync(&self) -> Result<SyncReport> {
        self.run_pass(PassMode::Forced).await
    }

    /// Fetch the owner's remote records and merge them locally.
    pub async fn pull(&self, owner_user_id: &str) -> Result<SyncReport> {
        let _guard = self.pass_lock.lock().await;
        let mut report = SyncReport::default();
        let result = self.pull_into(owner_user_id, &mut report).await;
        self.after_remote_result(&result);
        result.map(|()| report)
    }

    async fn run_pass(&self, mode: PassMode) -> Result<SyncReport> {
        let _guard = self.pass_lock.lock().await;
        self.emit(SyncEvent::Started);
        let mut report = SyncReport::default();

        let result = self.pass(mode, &mut report).await;
        self.after_remote_result(&result);
        match result {
            Ok(()) => {
                if let Err(e) = self.store.increment_counter(COUNTER_SYNC_PASSES) {
                    warn!(error = %e, "failed to count sync pass");
                }
                if report.failed == 0 {
                    info!(
                        pushed = report.pushed,
                        deleted = report.deleted,
                        pulled = report.pulled,
                        updated = report.updated,
                        conflicts = report.conflicts,
                        "sync pass succeeded"
                    );
                    self.emit(SyncEvent::Succeeded(report.clone()));
                } else {
                    let reason = format!("{} operation(s) failed", report.failed);
                    warn!(%reason, "sync pass finished with failures");
                    self.emit(SyncEvent::Failed { reason });
                }
                Ok(report)
            }
            Err(e) => {
                warn!(error = %e, "sync pass failed");
                self.emit(SyncEvent::Failed {
                    reason: e.to_string(),
                });
                Err(e)
            }
        }
    }

    fn after_remote_result(&self, result: &Result<()>) {
        match result {
            Err(Error::Remote(e)) if e.is_connectivity() => self.set_online(false),
            Ok(()) => self.set_online(true),
            Err(_) => {}
        }
    }

    async fn pass(&self, mode: PassMode, report: &mut SyncReport) -> Result<()> {
        self.push(mode, report).await?;
        if let Some(owner) = self.store.device_config()?.owner_user_id {
            self.pull_into(&owner, report).await?;
        } else {
            debug!("no owner associated, skipping pull");
        }
        Ok(())
    }

    async fn push(&self, mode: PassMode, report: &mut SyncReport) -> Result<()> {
        let now = self.store.now();
        for entry in self.store.queue_entries()? {
            if mode == PassMode::Scheduled && !entry.is_due(now) {
                continue;
            }
            let result = match entry.op.action {
                OpAction::Upsert => self.push_upsert(&entry, report).await,
                OpAction::Delete => self.push_delete(&entry, report).await,
            };
            if let Err(e) = result {
                let stop = e.is_connectivity();
                self.record_failure(&entry, &e, report)?;
                if stop {
                    return Err(Error::Remote(e));
                }
            }
        }
        Ok(())
    }

    /// Upload the current local copy. Only remote errors are returned;
    /// local read or write faults are logged and retried on the next pass.
    async fn push_upsert(
        &self,
        entry: &QueueEntry,
        report: &mut SyncReport,
    ) -> std::result::Result<(), RemoteError> {
        let loaded = match self.load_envelope(entry) {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!(error = %e, id = %entry.op.record_id, "cannot read queued record");
                return Ok(());
            }
        };
        let Some((envelope, version, state)) = loaded else {
            // Stale upsert for a record that no longer exists.
            if let Err(e) = self.store.complete_entry(entry) {
                warn!(error = %e, id = %entry.op.record_id, "failed to drop stale entry");
            }
            return Ok(());
        };
        if state == SyncState::Conflict {
            debug!(id = %entry.op.record_id, "record in conflict, not pushing");
            return Ok(());
        }

        let ack = self.call(self.remote.upsert(envelope)).await?;
        match self.store.mark_synced(
            entry.op.kind,
            &entry.op.record_id,
            version,
            ack.revision.as_deref(),
        ) {
            Ok(true) => report.pushed += 1,
            Ok(false) => debug!(id = %entry.op.record_id, "record changed during upload"),
            Err(e) => warn!(error = %e, id = %entry.op.record_id, "failed to record ack"),
        }
        Ok(())
    }

    async fn push_delete(
        &self,
        entry: &QueueEntry,
        report: &mut SyncReport,
    ) -> std::result::Result<(), RemoteError> {
        self.call(self.remote.delete(entry.op.kind, &entry.op.record_id))
            .await?;
        match self.store.complete_entry(entry) {
            Ok(_) => report.deleted += 1,
            Err(e) => warn!(error = %e, id = %entry.op.record_id, "failed to record delete"),
        }
        Ok(())
    }

    fn load_envelope(
        &self,
        entry: &QueueEntry,
    ) -> Result<Option<(RecordEnvelope, u64, SyncState)>> {
        let id = &entry.op.record_id;
        let loaded = match entry.op.kind {
            RecordKind::Session => match self.store.find_session(id)? {
                Some(s) => Some((RecordEnvelope::session(&s)?, s.local_version, s.sync_state)),
                None => None,
            },
            RecordKind::Annotation => match self.store.find_annotation(id)? {
                Some(a) => Some((
                    RecordEnvelope::annotation(&a)?,
                    a.local_version,
                    a.sync_state,
                )),
                None => None,
            },
        };
        Ok(loaded)
    }

    fn record_failure(
        &self,
        entry: &QueueEntry,
        error: &RemoteError,
        report: &mut SyncReport,
    ) -> Result<()> {
        report.failed += 1;
        let now = self.store.now();
        let delay = self.backoff.delay(entry.retry_count.saturating_add(1));
        let next_attempt_at = TimeDelta::from_std(delay)
            .ok()
            .and_then(|d| now.checked_add_signed(d))
            .unwrap_or(now);
        let reason = error.to_string();
        let retry_count = self
            .store
            .record_failure(entry.id, &reason, next_attempt_at)?;
        warn!(
            kind = %entry.op.kind,
            id = %entry.op.record_id,
            retry_count,
            error = %reason,
            "push failed, will retry"
        );

        if retry_count == self.config.retry_limit() {
            let failure = PersistentFailure {
                kind: entry.op.kind,
                record_id: entry.op.record_id.clone(),
                retry_count,
                reason,
            };
            self.emit(SyncEvent::PersistentFailure(failure.clone()));
            report.persistent_failures.push(failure);
        }
        Ok(())
    }

    async fn pull_into(&self, owner_user_id: &str, report: &mut SyncReport) -> Result<()> {
        let records = self.call(self.remote.fetch(owner_user_id)).await?;
        debug!(count = records.len(), "fetched remote records");

        for envelope in records {
            let kind = envelope.kind;
            let id = envelope.id.clone();
            let outcome = match self.apply_envelope(envelope) {
                Ok(outcome) => outcome,
                Err(e) if e.is_storage_failure() => return Err(e),
                Err(e) => {
                    warn!(%kind, %id, error = %e, "skipping malformed remote record");
                    report.failed += 1;
                    continue;
                }
            };
            match outcome {
                PullOutcome::Inserted => report.pulled += 1,
                PullOutcome::Updated => report.updated += 1,
                PullOutcome::Conflict => {
                    info!(%kind, %id, "conflict detected");
                    report.conflicts += 1;
                    self.emit(SyncEvent::ConflictDetected {
                        kind,
                        record_id: id,
                    });
                }
                PullOutcome::Unchanged | PullOutcome::Deleted => {}
            }
        }
        Ok(())
    }

    fn apply_envelope(&self, envelope: RecordEnvelope) -> Result<PullOutcome> {
        let revision = envelope.revision.as_deref();
        let outcome = match envelope.kind {
            RecordKind::Session => {
                let record: SessionRecord = serde_json::from_value(envelope.payload)?;
                check_id(&envelope.id, &record.id)?;
                self.store.apply_remote_session(record, revision)?
            }
            RecordKind::Annotation => {
                let record: AnnotationRecord = serde_json::from_value(envelope.payload)?;
                check_id(&envelope.id, &record.id)?;
                self.store.apply_remote_annotation(record, revision)?
            }
        };
        Ok(outcome)
    }

    /// Run a remote call under the request timeout.
    async fn call<T>(&self, fut: impl Future<Output = RemoteResult<T>>) -> RemoteResult<T> {
        match tokio::time::timeout(self.config.request_timeout(), fut).await {
            Ok(result) => result,
            Err(_) => Err(RemoteError::Timeout),
        }
    }

    /// Start the probe and drain tasks.
    pub fn start(self: &Arc<Self>) {
        let probe = tokio::spawn(Arc::clone(self).probe_loop());
        let drain = tokio::spawn(Arc::clone(self).drain_loop());
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.push(probe);
        tasks.push(drain);
    }

    async fn probe_loop(self: Arc<Self>) {
        let cancel = self.cancel_token.clone();
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                online = self.probe() => debug!(online, "probe finished"),
            }
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(self.config.probe_interval()) => {}
                _ = self.connectivity.probe_requested() => {}
            }
        }
    }

    async fn drain_loop(self: Arc<Self>) {
        let cancel = self.cancel_token.clone();
        let mut interval = tokio::time::interval(self.config.drain_interval());
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = self.connectivity.came_online() => debug!("came online, draining"),
                _ = interval.tick() => {}
            }
            tokio::select! {
                _ = cancel.cancelled() => return,
                result = self.process_queue() => {
                    if let Err(e) = result {
                        debug!(error = %e, "drain ended early");
                    }
                }
            }
        }
    }

    /// Cancel background tasks and wait for them to finish.
    ///
    /// An in-flight pass is abandoned; its queue entries stay queued.
    pub async fn shutdown(&self) {
        self.cancel_token.cancel();
        let tasks: Vec<_> = {
            let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
            tasks.drain(..).collect()
        };
        for task in tasks {
            let _ = task.await;
        }
        debug!("sync engine stopped");
    }
}

fn check_id(envelope_id: &str, record_id: &str) -> Result<()> {
    if envelope_id != record_id {
        return Err(Error::InvalidInput(format!(
            "envelope id {} does not match record id {}",
            envelope_id, record_id
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
