// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

//! Foreground mode: follow the open session and keep syncing until Ctrl-C.
//!
//! Job control drives the session clock's host hooks: SIGTSTP checkpoints
//! before the process stops, SIGCONT reconciles elapsed time on return.

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;
use tracing::{info, warn};

use crate::clock::{ClockEvent, Reconciliation};
use crate::display::{format_duration, format_report, format_snapshot};
use crate::engine::Engine;
use crate::error::Result;
use crate::sync::{SharedConnectivity, SyncEvent};

/// Next event from an optional channel; pending forever without one.
async fn next_event<T: Clone>(rx: &mut Option<Receiver<T>>) -> std::result::Result<T, RecvError> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Resolves on SIGTERM where supported, never otherwise.
async fn terminated() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        if let Ok(mut term) = signal(SignalKind::terminate()) {
            term.recv().await;
            return;
        }
    }
    std::future::pending::<()>().await
}

/// A job-control signal delivered to the watching process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HostSignal {
    /// SIGTSTP: about to be stopped.
    Suspend,
    /// SIGCONT: running again.
    Continue,
}

#[cfg(unix)]
struct HostSignals {
    suspend: Option<tokio::signal::unix::Signal>,
    resume: Option<tokio::signal::unix::Signal>,
}

#[cfg(unix)]
impl HostSignals {
    fn install() -> Self {
        use nix::sys::signal::Signal;
        use tokio::signal::unix::{signal, SignalKind};

        let listen = |sig: Signal| match signal(SignalKind::from_raw(sig as i32)) {
            Ok(listener) => Some(listener),
            Err(e) => {
                warn!(signal = sig.as_str(), error = %e, "cannot listen for signal");
                None
            }
        };
        HostSignals {
            suspend: listen(Signal::SIGTSTP),
            resume: listen(Signal::SIGCONT),
        }
    }

    async fn next(&mut self) -> HostSignal {
        tokio::select! {
            _ = recv_signal(&mut self.suspend) => HostSignal::Suspend,
            _ = recv_signal(&mut self.resume) => HostSignal::Continue,
        }
    }
}

#[cfg(unix)]
async fn recv_signal(listener: &mut Option<tokio::signal::unix::Signal>) {
    if let Some(listener) = listener {
        if listener.recv().await.is_some() {
            return;
        }
    }
    std::future::pending::<()>().await
}

/// Stop the process the way the default SIGTSTP action would.
#[cfg(unix)]
fn stop_process() {
    use nix::sys::signal::{raise, Signal};
    if let Err(e) = raise(Signal::SIGSTOP) {
        warn!(error = %e, "failed to stop process");
    }
}

#[cfg(not(unix))]
struct HostSignals;

#[cfg(not(unix))]
impl HostSignals {
    fn install() -> Self {
        HostSignals
    }

    async fn next(&mut self) -> HostSignal {
        std::future::pending().await
    }
}

#[cfg(not(unix))]
fn stop_process() {}

/// Forward a job-control signal to the session clock.
async fn on_host_signal(engine: &Engine, signal: HostSignal) -> Option<Reconciliation> {
    match signal {
        HostSignal::Suspend => {
            engine.clock().on_background().await;
            info!("checkpointed before suspension");
            None
        }
        HostSignal::Continue => engine.clock().on_foreground().await,
    }
}

pub async fn run(engine: &Engine) -> Result<()> {
    let mut clock_events = Some(engine.clock().subscribe());
    let mut sync_events = engine.sync().map(|s| s.subscribe());

    engine.start_background();
    match engine.clock().status().await {
        Some(snapshot) => println!("{}", format_snapshot(&snapshot)),
        None => println!("No active session"),
    }
    if engine.sync().is_none() {
        println!("Sync is not configured; running local only");
    }

    let connectivity = engine.sync().map(|s| s.connectivity());
    let mut host_signals = HostSignals::install();
    let ctrl_c = tokio::signal::ctrl_c();
    let term = terminated();
    tokio::pin!(ctrl_c, term);
    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            _ = &mut term => break,
            signal = host_signals.next() => {
                on_host_signal(engine, signal).await;
                if signal == HostSignal::Suspend {
                    stop_process();
                }
            }
            event = next_event(&mut clock_events) => match event {
                Ok(event) => print_clock_event(&event),
                Err(RecvError::Lagged(n)) => info!(skipped = n, "watch fell behind"),
                Err(RecvError::Closed) => clock_events = None,
            },
            event = next_event(&mut sync_events) => match event {
                Ok(event) => print_sync_event(&event, connectivity.as_deref()),
                Err(RecvError::Lagged(n)) => info!(skipped = n, "watch fell behind"),
                Err(RecvError::Closed) => sync_events = None,
            },
        }
    }
    println!("Shutting down");
    Ok(())
}

fn print_clock_event(event: &ClockEvent) {
    match event {
        ClockEvent::Tick {
            session_id,
            elapsed_ms,
        } => println!("{} {}", session_id, format_duration(*elapsed_ms)),
        ClockEvent::Reconciled(r) => println!(
            "{} resumed after suspension, now {}",
            r.session_id,
            format_duration(r.current_ms)
        ),
        ClockEvent::StorageFailure { reason } => {
            eprintln!("warning: session not saved yet: {}", reason)
        }
        _ => {}
    }
}

fn print_sync_event(event: &SyncEvent, connectivity: Option<&SharedConnectivity>) {
    match event {
        SyncEvent::Succeeded(report) if !report.is_empty() => {
            println!("sync: {}", format_report(report))
        }
        SyncEvent::Failed { reason } => eprintln!("sync failed: {}", reason),
        SyncEvent::PersistentFailure(failure) => eprintln!(
            "warning: {} {} has failed {} times: {}",
            failure.kind, failure.record_id, failure.retry_count, failure.reason
        ),
        SyncEvent::ConflictDetected { kind, record_id } => {
            println!("conflict: {} {} differs from the remote", kind, record_id)
        }
        SyncEvent::ConnectivityChanged { online } => match connectivity {
            Some(connectivity) => println!("sync: {}", connectivity.status_string()),
            None => println!("sync: {}", if *online { "online" } else { "offline" }),
        },
        _ => {}
    }
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod tests;
