// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

use chrono::{DateTime, Utc};
use serde::Serialize;
use stint_core::{ClockState, LocalStore, Session, SessionQuery, SyncState};

use crate::cli::{LimitArgs, ListFilterArgs, OutputFormat};
use crate::display::format_session_line;
use crate::error::Result;

use super::print_json;

/// Default number of sessions shown without `-n` or `--no-limit`.
pub const DEFAULT_LIMIT: usize = 50;

/// JSON representation of a session with its computed times.
#[derive(Serialize)]
pub(crate) struct SessionJson<'a> {
    #[serde(flatten)]
    session: &'a Session,
    state: ClockState,
    elapsed_ms: u64,
    paused_ms: u64,
}

impl<'a> SessionJson<'a> {
    pub(crate) fn new(session: &'a Session, now: DateTime<Utc>) -> Self {
        SessionJson {
            session,
            state: session.state(),
            elapsed_ms: session.elapsed_ms(now),
            paused_ms: session.paused_ms(now),
        }
    }
}

pub(crate) fn build_query(filter: &ListFilterArgs, limits: &LimitArgs) -> SessionQuery {
    let sync_state = if filter.pending {
        Some(SyncState::Pending)
    } else if filter.conflict {
        Some(SyncState::Conflict)
    } else {
        None
    };
    let limit = if limits.no_limit {
        None
    } else {
        Some(limits.limit.unwrap_or(DEFAULT_LIMIT))
    };
    SessionQuery {
        open: filter.open.then_some(true),
        sync_state,
        limit,
        ..SessionQuery::default()
    }
}

pub fn run(
    store: &LocalStore,
    filter: &ListFilterArgs,
    limits: &LimitArgs,
    format: OutputFormat,
) -> Result<()> {
    let sessions = store.query_sessions(&build_query(filter, limits))?;
    let now = store.now();

    match format {
        OutputFormat::Text => {
            if sessions.is_empty() {
                println!("No sessions");
            }
            for session in &sessions {
                println!("{}", format_session_line(session, now));
            }
        }
        OutputFormat::Json => {
            let json: Vec<_> = sessions.iter().map(|s| SessionJson::new(s, now)).collect();
            print_json(&json)?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "list_tests.rs"]
mod tests;
