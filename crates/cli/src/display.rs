// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

use chrono::{DateTime, Utc};
use stint_core::{Annotation, ConflictCopy, QueueEntry, Session};

use crate::clock::SessionSnapshot;
use crate::sync::SyncReport;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format a millisecond duration as `H:MM:SS` (hours unbounded).
pub fn format_duration(ms: u64) -> String {
    let secs = ms / 1000;
    format!("{}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// One-line view of the open session for `status` and `watch`.
pub fn format_snapshot(snapshot: &SessionSnapshot) -> String {
    format!(
        "{} [{}] {} {}",
        snapshot.session_id,
        snapshot.state,
        snapshot.mode,
        format_duration(snapshot.elapsed_ms)
    )
}

/// Format a single session line for list output
pub fn format_session_line(session: &Session, now: DateTime<Utc>) -> String {
    let sync = match session.sync_state {
        stint_core::SyncState::Synced => String::new(),
        other => format!(" ({})", other),
    };
    format!(
        "- [{}] {} {} {} {}{}",
        session.state(),
        session.id,
        format_timestamp(session.start_time),
        session.activity_mode,
        format_duration(session.elapsed_ms(now)),
        sync
    )
}

/// Format session details for the show command
pub fn format_session_details(
    session: &Session,
    annotations: &[Annotation],
    now: DateTime<Utc>,
) -> String {
    let mut output = Vec::new();

    output.push(format!("[{}] {}", session.state(), session.id));
    output.push(format!("Mode: {}", session.activity_mode));
    output.push(format!("Started: {}", format_timestamp(session.start_time)));
    if let Some(end) = session.end_time {
        output.push(format!("Stopped: {}", format_timestamp(end)));
    }
    output.push(format!(
        "Elapsed: {}",
        format_duration(session.elapsed_ms(now))
    ));
    output.push(format!(
        "Paused: {}",
        format_duration(session.paused_ms(now))
    ));
    output.push(format!("Sync: {}", session.sync_state));
    if let Some(owner) = &session.owner_user_id {
        output.push(format!("Owner: {}", owner));
    }

    if !session.pause_intervals.is_empty() {
        output.push(String::new());
        output.push("Pauses:".to_string());
        for pause in &session.pause_intervals {
            let end = pause
                .end
                .map_or_else(|| "now".to_string(), format_timestamp);
            output.push(format!(
                "  - {} .. {} ({})",
                format_timestamp(pause.start),
                end,
                format_duration(pause.duration_ms(now))
            ));
        }
    }

    if !session.event_markers.is_empty() {
        output.push(String::new());
        output.push("Events:".to_string());
        for marker in &session.event_markers {
            output.push(format!("  - {}", format_timestamp(*marker)));
        }
    }

    if !annotations.is_empty() {
        output.push(String::new());
        output.push("Annotations:".to_string());
        for annotation in annotations {
            output.push(format!("  - {} ({})", annotation.label, annotation.id));
            if let Some(note) = &annotation.note {
                for line in note.lines() {
                    output.push(format!("    {}", line));
                }
            }
        }
    }

    output.join("\n")
}

pub fn format_queue_entry(entry: &QueueEntry) -> String {
    let mut line = format!(
        "- {} {} {} v{}",
        entry.op.action, entry.op.kind, entry.op.record_id, entry.version
    );
    if entry.retry_count > 0 {
        line.push_str(&format!(", {} retries", entry.retry_count));
    }
    if let Some(next) = entry.next_attempt_at {
        line.push_str(&format!(", next at {}", format_timestamp(next)));
    }
    if let Some(error) = &entry.last_error {
        line.push_str(&format!("\n    last error: {}", error));
    }
    line
}

pub fn format_conflict(copy: &ConflictCopy) -> String {
    let revision = copy.remote_revision.as_deref().unwrap_or("unknown");
    format!(
        "- {} {} (remote revision {}, detected {})",
        copy.kind,
        copy.record_id,
        revision,
        format_timestamp(copy.detected_at)
    )
}

/// Summary line of a sync pass. "Up to date" when nothing moved.
pub fn format_report(report: &SyncReport) -> String {
    if report.is_empty() {
        return "Up to date".to_string();
    }
    let counts = [
        (report.pushed, "pushed"),
        (report.deleted, "deleted"),
        (report.pulled, "pulled"),
        (report.updated, "updated"),
        (report.conflicts, "conflicts"),
        (report.failed, "failed"),
    ];
    counts
        .iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, label)| format!("{} {}", n, label))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
#[path = "display_tests.rs"]
mod tests;
