// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

//! Periodic activities of an open session: the display tick and the
//! checkpoint writer.

use std::sync::Arc;

use stint_core::millis_between;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{ClockEvent, Reconciliation, Shared};

pub(super) fn spawn(
    shared: Arc<Shared>,
    session_id: String,
    cancel: CancellationToken,
) -> Vec<JoinHandle<()>> {
    vec![
        tokio::spawn(tick_loop(
            Arc::clone(&shared),
            session_id.clone(),
            cancel.clone(),
        )),
        tokio::spawn(checkpoint_loop(shared, session_id, cancel)),
    ]
}

/// What the tick loop should do next.
enum Step {
    Continue,
    Exit,
}

async fn tick_loop(shared: Arc<Shared>, session_id: String, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(shared.config.tick_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Step::Exit = tick(&shared, &session_id).await {
                    break;
                }
            }
        }
    }
    debug!(id = %session_id, "tick loop exited");
}

async fn tick(shared: &Shared, session_id: &str) -> Step {
    let mut slot = shared.slot.lock().await;
    let Some(active) = slot.as_mut().filter(|a| a.session.id == session_id) else {
        return Step::Exit;
    };
    if !active.session.is_open() {
        return Step::Exit;
    }

    let now = shared.clock.now();
    let gap_ms = millis_between(active.last_tick_at, now);
    let expected_ms = shared.config.tick_interval_ms + shared.config.suspend_threshold_ms;
    active.last_tick_at = now;
    let elapsed_ms = active.session.elapsed_ms(now);

    if gap_ms > expected_ms {
        // the process was suspended between ticks
        let reconciliation = Reconciliation {
            session_id: session_id.to_string(),
            previous_ms: active.last_displayed_ms,
            current_ms: elapsed_ms,
        };
        info!(
            id = %session_id,
            gap_ms,
            delta_ms = reconciliation.delta_ms(),
            "resumed after suspension"
        );
        active.last_displayed_ms = elapsed_ms;
        shared.checkpoint(active);
        shared.emit(ClockEvent::Reconciled(reconciliation));
        return Step::Continue;
    }

    if active.session.is_running {
        active.last_displayed_ms = elapsed_ms;
        shared.emit(ClockEvent::Tick {
            session_id: session_id.to_string(),
            elapsed_ms,
        });
    }
    Step::Continue
}

async fn checkpoint_loop(shared: Arc<Shared>, session_id: String, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(shared.config.checkpoint_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                let mut slot = shared.slot.lock().await;
                let Some(active) = slot.as_mut().filter(|a| a.session.id == session_id) else {
                    break;
                };
                shared.checkpoint(active);
                if !active.session.is_open() && !active.dirty {
                    // final write of a stopped session landed
                    if let Some(finished) = slot.take() {
                        finished.cancel.cancel();
                    }
                    break;
                }
            }
        }
    }
    debug!(id = %session_id, "checkpoint loop exited");
}
