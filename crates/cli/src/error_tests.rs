// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;

#[test]
fn test_error_not_initialized_display() {
    let err = Error::NotInitialized;
    assert!(err.to_string().contains("not initialized"));
    assert!(err.to_string().contains("stint init"));
}

#[test]
fn test_error_already_initialized_display() {
    let err = Error::AlreadyInitialized("/path/to/stint".to_string());
    assert!(err.to_string().contains("already initialized"));
    assert!(err.to_string().contains("/path/to/stint"));
}

#[test]
fn test_core_transition_error_keeps_hint() {
    let core = stint_core::Error::InvalidTransition {
        from: "paused".to_string(),
        action: "pause".to_string(),
        hint: "resume, stop, mark".to_string(),
    };
    let msg = Error::from(core).to_string();
    assert!(msg.contains("cannot pause while paused"));
    assert!(msg.contains("hint: from 'paused' you can: resume, stop, mark"));
}

#[test]
fn test_core_not_found_maps_to_not_found() {
    let err = Error::from(stint_core::Error::SessionNotFound("abc".to_string()));
    assert!(matches!(err, Error::SessionNotFound(id) if id == "abc"));
}

#[test]
fn test_core_storage_failure_stays_storage_failure() {
    let io = std::io::Error::other("disk full");
    let err = Error::from(stint_core::Error::Io(io));
    assert!(err.is_storage_failure());
    assert!(!Error::NoActiveSession.is_storage_failure());
}

#[test]
fn test_remote_error_display() {
    let err = Error::from(RemoteError::Rejected {
        status: 503,
        message: "maintenance".to_string(),
    });
    let msg = err.to_string();
    assert!(msg.contains("503"));
    assert!(msg.contains("maintenance"));
}

#[test]
fn test_remote_not_configured_hint() {
    assert!(Error::RemoteNotConfigured
        .to_string()
        .contains("STINT_REMOTE_URL"));
}
