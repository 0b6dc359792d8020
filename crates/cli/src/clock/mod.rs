// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

//! The session clock runtime.
//!
//! Owns at most one open session. Every lifecycle call, tick and checkpoint
//! takes the same lock, so an explicit pause/resume/stop always supersedes a
//! periodic write for the same instant. Elapsed time is always recomputed
//! from the session's timestamps; ticks only trigger the recomputation.

mod events;
mod tasks;

pub use events::{ClockEvent, Reconciliation, SessionSnapshot};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use stint_core::device::COUNTER_SESSIONS_STARTED;
use stint_core::id::new_id;
use stint_core::{ActivityMode, ClockSource, ClockState, LocalStore, Session};
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::ClockConfig;
use crate::error::{Error, Result};

const EVENT_CAPACITY: usize = 256;

/// The open session and its bookkeeping.
struct Active {
    session: Session,
    /// False until the initial create reaches the store.
    persisted: bool,
    /// The in-memory session is newer than the stored one.
    dirty: bool,
    last_displayed_ms: u64,
    last_tick_at: DateTime<Utc>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

pub(crate) struct Shared {
    store: Arc<LocalStore>,
    clock: Arc<dyn ClockSource>,
    config: ClockConfig,
    device_id: String,
    events: broadcast::Sender<ClockEvent>,
    slot: Mutex<Option<Active>>,
    root_cancel: CancellationToken,
}

/// Session lifecycle owner handed to the host.
pub struct SessionClock {
    shared: Arc<Shared>,
}

fn idle_error(action: &str) -> Error {
    let from = ClockState::Idle;
    Error::InvalidTransition {
        from: from.to_string(),
        action: action.to_string(),
        hint: from.valid_actions().to_string(),
    }
}

impl SessionClock {
    pub fn new(
        store: Arc<LocalStore>,
        clock: Arc<dyn ClockSource>,
        config: ClockConfig,
    ) -> Result<Self> {
        let device_id = store.device_id()?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(SessionClock {
            shared: Arc::new(Shared {
                store,
                clock,
                config,
                device_id,
                events,
                slot: Mutex::new(None),
                root_cancel: CancellationToken::new(),
            }),
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClockEvent> {
        self.shared.events.subscribe()
    }

    /// Idle → Running.
    pub async fn start(&self, mode: ActivityMode) -> Result<SessionSnapshot> {
        let shared = &self.shared;
        let mut slot = shared.slot.lock().await;
        shared.settle_stopped(&mut slot)?;
        if let Some(active) = slot.as_ref() {
            return Err(Error::SessionAlreadyActive(active.session.id.clone()));
        }

        let now = shared.clock.now();
        let owner = shared.store.device_config()?.owner_user_id;
        let session = Session::start(new_id(), shared.device_id.clone(), owner, mode, now);
        let mut active = Active {
            session,
            persisted: false,
            dirty: true,
            last_displayed_ms: 0,
            last_tick_at: now,
            cancel: shared.root_cancel.child_token(),
            tasks: Vec::new(),
        };
        shared.persist(&mut active)?;
        if let Err(e) = shared.store.increment_counter(COUNTER_SESSIONS_STARTED) {
            warn!(error = %e, "failed to count session start");
        }

        let snapshot = SessionSnapshot::of(&active.session, now);
        active.tasks = tasks::spawn(
            Arc::clone(shared),
            active.session.id.clone(),
            active.cancel.clone(),
        );
        info!(id = %active.session.id, %mode, "session started");
        *slot = Some(active);
        shared.emit(ClockEvent::Started(snapshot.clone()));
        Ok(snapshot)
    }

    /// Running → Paused. Persisted immediately.
    pub async fn pause(&self) -> Result<SessionSnapshot> {
        let snapshot = self
            .transition("pause", |session, now| session.pause(now).map(|_| ()))
            .await?;
        info!(id = %snapshot.session_id, "session paused");
        self.shared.emit(ClockEvent::Paused(snapshot.clone()));
        Ok(snapshot)
    }

    /// Paused → Running. Persisted immediately.
    pub async fn resume(&self) -> Result<SessionSnapshot> {
        let snapshot = self
            .transition("resume", |session, now| session.resume(now).map(|_| ()))
            .await?;
        info!(id = %snapshot.session_id, "session resumed");
        self.shared.emit(ClockEvent::Resumed(snapshot.clone()));
        Ok(snapshot)
    }

    /// Appends an event marker to the open session.
    pub async fn log_event(&self) -> Result<SessionSnapshot> {
        let snapshot = self
            .transition("mark", |session, now| session.log_event(now).map(|_| ()))
            .await?;
        self.shared.emit(ClockEvent::EventLogged {
            session_id: snapshot.session_id.clone(),
            count: snapshot.events,
        });
        Ok(snapshot)
    }

    /// Running or Paused → Stopped.
    ///
    /// Closes an open pause, persists, and cancels the periodic activities.
    /// If the write fails the stopped session is kept and flushed by the
    /// checkpoint task instead.
    pub async fn stop(&self) -> Result<SessionSnapshot> {
        let shared = &self.shared;
        let mut slot = shared.slot.lock().await;
        shared.settle_stopped(&mut slot)?;
        let Some(active) = slot.as_mut() else {
            return Err(idle_error("stop"));
        };

        let now = shared.clock.now();
        let mut next = active.session.clone();
        next.stop(now)?;
        shared.commit(active, next)?;
        let snapshot = SessionSnapshot::of(&active.session, now);

        let mut tasks = Vec::new();
        if !active.dirty {
            if let Some(mut finished) = slot.take() {
                finished.cancel.cancel();
                tasks = std::mem::take(&mut finished.tasks);
            }
        }
        drop(slot);
        for task in tasks {
            let _ = task.await;
        }

        info!(
            id = %snapshot.session_id,
            elapsed_ms = snapshot.elapsed_ms,
            "session stopped"
        );
        shared.emit(ClockEvent::Stopped {
            session_id: snapshot.session_id.clone(),
            elapsed_ms: snapshot.elapsed_ms,
        });
        Ok(snapshot)
    }

    /// Current open session, computed at now. `None` when idle.
    pub async fn status(&self) -> Option<SessionSnapshot> {
        let slot = self.shared.slot.lock().await;
        let now = self.shared.clock.now();
        slot.as_ref()
            .filter(|a| a.session.is_open())
            .map(|a| SessionSnapshot::of(&a.session, now))
    }

    /// Host is about to be backgrounded: checkpoint now.
    pub async fn on_background(&self) {
        let mut slot = self.shared.slot.lock().await;
        if let Some(active) = slot.as_mut() {
            self.shared.checkpoint(active);
        }
    }

    /// Host returned to the foreground.
    ///
    /// Reloads the session from the store, recomputes elapsed time and
    /// reports the difference to the last displayed value.
    pub async fn on_foreground(&self) -> Option<Reconciliation> {
        let shared = &self.shared;
        let mut slot = shared.slot.lock().await;
        let active = slot.as_mut()?;

        if !active.dirty {
            match shared.store.find_session(&active.session.id) {
                Ok(Some(stored)) => active.session = stored,
                Ok(None) => warn!(id = %active.session.id, "open session missing from store"),
                Err(e) => warn!(error = %e, "failed to reload session, using memory"),
            }
        }

        let now = shared.clock.now();
        let reconciliation = Reconciliation {
            session_id: active.session.id.clone(),
            previous_ms: active.last_displayed_ms,
            current_ms: active.session.elapsed_ms(now),
        };
        active.last_displayed_ms = reconciliation.current_ms;
        active.last_tick_at = now;

        if !active.session.is_open() && !active.dirty {
            if let Some(finished) = slot.take() {
                finished.cancel.cancel();
            }
        }
        info!(
            id = %reconciliation.session_id,
            delta_ms = reconciliation.delta_ms(),
            "reconciled on foreground"
        );
        shared.emit(ClockEvent::Reconciled(reconciliation.clone()));
        Some(reconciliation)
    }

    /// Adopt this device's open session after a restart, if there is one.
    pub async fn recover(&self) -> Result<Option<SessionSnapshot>> {
        let shared = &self.shared;
        let mut slot = shared.slot.lock().await;
        let now = shared.clock.now();
        if let Some(active) = slot.as_ref() {
            return Ok(Some(SessionSnapshot::of(&active.session, now)));
        }

        let Some(session) = shared.store.open_session_for_device(&shared.device_id)? else {
            return Ok(None);
        };
        let snapshot = SessionSnapshot::of(&session, now);
        let cancel = shared.root_cancel.child_token();
        let tasks = tasks::spawn(Arc::clone(shared), session.id.clone(), cancel.clone());
        *slot = Some(Active {
            session,
            persisted: true,
            dirty: false,
            last_displayed_ms: snapshot.elapsed_ms,
            last_tick_at: now,
            cancel,
            tasks,
        });
        info!(
            id = %snapshot.session_id,
            state = %snapshot.state,
            elapsed_ms = snapshot.elapsed_ms,
            "recovered session"
        );
        shared.emit(ClockEvent::Recovered(snapshot.clone()));
        Ok(Some(snapshot))
    }

    /// Final checkpoint, then cancel all periodic activities.
    ///
    /// An open session stays open in the store and is recovered next time.
    pub async fn shutdown(&self) {
        let shared = &self.shared;
        let mut slot = shared.slot.lock().await;
        if let Some(active) = slot.as_mut() {
            shared.checkpoint(active);
            if active.dirty {
                error!(id = %active.session.id, "shutting down with unsaved session state");
            }
        }
        shared.root_cancel.cancel();
        let tasks = slot
            .take()
            .map(|mut a| std::mem::take(&mut a.tasks))
            .unwrap_or_default();
        drop(slot);
        for task in tasks {
            let _ = task.await;
        }
    }

    async fn transition<F>(&self, action: &str, apply: F) -> Result<SessionSnapshot>
    where
        F: FnOnce(&mut Session, DateTime<Utc>) -> stint_core::Result<()>,
    {
        let shared = &self.shared;
        let mut slot = shared.slot.lock().await;
        shared.settle_stopped(&mut slot)?;
        let Some(active) = slot.as_mut() else {
            return Err(idle_error(action));
        };

        let now = shared.clock.now();
        let mut next = active.session.clone();
        apply(&mut next, now)?;
        shared.commit(active, next)?;
        Ok(SessionSnapshot::of(&active.session, now))
    }
}

impl Shared {
    fn emit(&self, event: ClockEvent) {
        let _ = self.events.send(event);
    }

    /// Adopt `next` as the session state and write it through.
    ///
    /// Storage faults keep `next` in memory, marked dirty, and succeed.
    fn commit(&self, active: &mut Active, next: Session) -> Result<()> {
        let previous = std::mem::replace(&mut active.session, next);
        let was_dirty = active.dirty;
        active.dirty = true;
        if let Err(e) = self.persist(active) {
            active.session = previous;
            active.dirty = was_dirty;
            return Err(e);
        }
        Ok(())
    }

    /// Write a dirty session to the store.
    fn persist(&self, active: &mut Active) -> Result<()> {
        if !active.dirty {
            return Ok(());
        }
        let result = if active.persisted {
            self.store.update_session(&active.session)
        } else {
            self.store.create_session(&active.session)
        };
        match result {
            Ok(version) => {
                active.session.local_version = version;
                active.persisted = true;
                active.dirty = false;
                Ok(())
            }
            Err(e) if e.is_storage_failure() => {
                warn!(id = %active.session.id, error = %e, "session write failed, will retry");
                self.emit(ClockEvent::StorageFailure {
                    reason: e.to_string(),
                });
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Periodic durable write for crash recovery.
    ///
    /// Re-saves the full record if an earlier write failed, otherwise only
    /// stamps the checkpoint time.
    fn checkpoint(&self, active: &mut Active) {
        let now = self.clock.now();
        active.session.last_checkpoint_at = Some(now);
        if active.dirty {
            if let Err(e) = self.persist(active) {
                warn!(id = %active.session.id, error = %e, "checkpoint rejected");
            }
            return;
        }
        if let Err(e) = self.store.touch_checkpoint(&active.session.id, now) {
            warn!(id = %active.session.id, error = %e, "checkpoint failed, will retry");
            self.emit(ClockEvent::StorageFailure {
                reason: e.to_string(),
            });
        }
    }

    /// Clear a stopped session from the slot once it is safely stored.
    ///
    /// Fails if its final write still cannot be made, since a new lifecycle
    /// call must not replace it.
    fn settle_stopped(&self, slot: &mut Option<Active>) -> Result<()> {
        let Some(active) = slot.as_mut() else {
            return Ok(());
        };
        if active.session.is_open() {
            return Ok(());
        }
        self.persist(active)?;
        if active.dirty {
            return Err(Error::Io(std::io::Error::other(
                "previous session could not be saved yet",
            )));
        }
        if let Some(finished) = slot.take() {
            finished.cancel.cancel();
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
