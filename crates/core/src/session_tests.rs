// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

#![allow(clippy::unwrap_used)]

use super::*;
use yare::parameterized;

fn at(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(1_700_000_000_000 + ms).unwrap()
}

fn started() -> Session {
    Session::start(
        "ses-1".to_string(),
        "dev-1".to_string(),
        None,
        ActivityMode::Flow,
        at(0),
    )
}

#[test]
fn new_session_is_running_and_pending() {
    let session = started();
    assert_eq!(session.state(), ClockState::Running);
    assert!(session.is_running);
    assert!(session.is_open());
    assert_eq!(session.sync_state, SyncState::Pending);
    assert_eq!(session.elapsed_ms(at(1_500)), 1_500);
}

#[test]
fn pause_resume_stop_scenario() {
    let mut s = started();
    s.pause(at(10_000)).unwrap();
    assert_eq!(s.state(), ClockState::Paused);
    assert!(!s.is_running);

    let closed = s.resume(at(15_000)).unwrap();
    assert_eq!(closed, 5_000);
    assert!(s.is_running);

    s.stop(at(25_000)).unwrap();
    assert_eq!(s.state(), ClockState::Stopped);
    assert_eq!(s.elapsed_ms(at(25_000)), 20_000);
    assert_eq!(
        s.pause_intervals,
        vec![PauseInterval {
            start: at(10_000),
            end: Some(at(15_000)),
        }]
    );
    assert_eq!(s.accumulated_pause_ms, 5_000);
}

#[test]
fn elapsed_excludes_open_pause() {
    let mut s = started();
    s.pause(at(4_000)).unwrap();

    assert_eq!(s.elapsed_ms(at(4_000)), 4_000);
    assert_eq!(s.elapsed_ms(at(9_000)), 4_000);
    assert_eq!(s.paused_ms(at(9_000)), 5_000);
}

#[test]
fn stopping_a_paused_session_closes_the_pause_first() {
    let mut s = started();
    s.pause(at(3_000)).unwrap();
    s.stop(at(8_000)).unwrap();

    assert!(s.open_pause().is_none());
    assert_eq!(s.pause_intervals[0].end, Some(at(8_000)));
    assert_eq!(s.end_time, Some(at(8_000)));
    assert_eq!(s.accumulated_pause_ms, 5_000);
    assert_eq!(s.elapsed_ms(at(8_000)), 3_000);
}

#[test]
fn stopped_elapsed_is_stable() {
    let mut s = started();
    s.stop(at(7_000)).unwrap();

    assert_eq!(s.elapsed_ms(at(7_000)), 7_000);
    assert_eq!(s.elapsed_ms(at(70_000)), 7_000);
    assert_eq!(s.elapsed_ms(at(-5_000)), 7_000);
}

#[parameterized(
    pause_paused = { "pause", true, false },
    resume_running = { "resume", false, false },
    stop_stopped = { "stop", false, true },
    pause_stopped = { "pause", false, true },
    resume_stopped = { "resume", false, true },
    mark_stopped = { "mark", false, true },
)]
fn invalid_transitions_are_rejected(action: &str, paused: bool, stopped: bool) {
    let mut s = started();
    if paused {
        s.pause(at(1_000)).unwrap();
    }
    if stopped {
        s.stop(at(2_000)).unwrap();
    }
    let before = s.clone();

    let result = match action {
        "pause" => s.pause(at(3_000)),
        "resume" => s.resume(at(3_000)).map(|_| ()),
        "stop" => s.stop(at(3_000)),
        _ => s.log_event(at(3_000)).map(|_| ()),
    };

    assert!(matches!(result, Err(Error::InvalidTransition { .. })));
    assert_eq!(s, before);
}

#[test]
fn log_event_appends_while_open() {
    let mut s = started();
    assert_eq!(s.log_event(at(1_000)).unwrap(), 1);
    s.pause(at(2_000)).unwrap();
    assert_eq!(s.log_event(at(2_500)).unwrap(), 2);
    assert_eq!(s.event_markers, vec![at(1_000), at(2_500)]);
    assert_eq!(s.state(), ClockState::Paused);
}

#[test]
fn backwards_clock_never_reorders_pauses() {
    let mut s = started();
    s.pause(at(5_000)).unwrap();
    s.resume(at(6_000)).unwrap();

    // Wall clock stepped back before the previous resume.
    s.pause(at(4_000)).unwrap();
    let second = s.pause_intervals[1];
    assert!(second.start >= s.pause_intervals[0].end.unwrap());

    s.resume(at(3_000)).unwrap();
    assert_eq!(s.pause_intervals[1].duration_ms(at(3_000)), 0);
}

#[test]
fn elapsed_is_zero_before_start() {
    let s = started();
    assert_eq!(s.elapsed_ms(at(-10_000)), 0);
}

#[test]
fn elapsed_matches_formula_for_interleavings() {
    // Deterministic pseudo-random walk over pause/resume/tick steps.
    let mut seed: u64 = 0x5eed;
    for _ in 0..50 {
        let mut s = started();
        let mut now = 0i64;
        let mut expected_paused = 0u64;
        let mut pause_started: Option<i64> = None;

        for _ in 0..40 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            now += ((seed >> 33) % 5_000) as i64;
            match (seed >> 20) % 3 {
                0 if pause_started.is_none() => {
                    s.pause(at(now)).unwrap();
                    pause_started = Some(now);
                }
                1 => {
                    if let Some(p) = pause_started.take() {
                        s.resume(at(now)).unwrap();
                        expected_paused += (now - p) as u64;
                    }
                }
                _ => {}
            }

            let open = pause_started.map_or(0, |p| (now - p) as u64);
            let expected = (now as u64).saturating_sub(expected_paused + open);
            assert_eq!(s.elapsed_ms(at(now)), expected);
            assert_eq!(s.accumulated_pause_ms, expected_paused);
            assert!(s.paused_ms(at(now)) <= now as u64);
        }
    }
}

#[parameterized(
    flow = { "flow", ActivityMode::Flow },
    pomodoro = { "pomodoro", ActivityMode::Pomodoro },
    upper = { "FLOW", ActivityMode::Flow },
)]
fn parse_activity_mode(input: &str, expected: ActivityMode) {
    assert_eq!(input.parse::<ActivityMode>().unwrap(), expected);
}

#[test]
fn parse_unknown_mode_fails() {
    assert!(matches!(
        "sprint".parse::<ActivityMode>(),
        Err(Error::InvalidMode(_))
    ));
}

#[parameterized(
    pending = { "pending", SyncState::Pending },
    synced = { "synced", SyncState::Synced },
    conflict = { "conflict", SyncState::Conflict },
)]
fn sync_state_round_trips_through_str(input: &str, expected: SyncState) {
    let parsed: SyncState = input.parse().unwrap();
    assert_eq!(parsed, expected);
    assert_eq!(parsed.as_str(), input);
}

#[test]
fn record_excludes_local_bookkeeping() {
    let mut s = started();
    s.local_version = 7;
    s.remote_revision = Some("r1".to_string());

    let json = serde_json::to_value(SessionRecord::from(&s)).unwrap();
    assert!(json.get("sync_state").is_none());
    assert!(json.get("local_version").is_none());
    assert_eq!(json["id"], "ses-1");

    let back: SessionRecord = serde_json::from_value(json).unwrap();
    let local = back.into_session(Some("r2".to_string()));
    assert_eq!(local.sync_state, SyncState::Synced);
    assert_eq!(local.remote_revision.as_deref(), Some("r2"));
    assert_eq!(local.start_time, s.start_time);
}
