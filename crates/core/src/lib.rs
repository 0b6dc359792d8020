// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

//! stint-core: shared library for the stint activity tracker.
//!
//! This crate provides the session data model and elapsed-time formula,
//! clock sources, the sync operation model and the durable local store used
//! by the stint runtime.

pub mod annotation;
pub mod clock;
pub mod device;
pub mod error;
pub mod id;
pub mod op;
pub mod session;
pub mod store;

pub use annotation::{Annotation, AnnotationRecord};
pub use clock::{millis_between, ClockSource, ManualClock, SystemClock};
pub use device::DeviceConfig;
pub use error::{Error, Result};
pub use op::{OpAction, QueueEntry, RecordKind, SyncOp};
pub use session::{
    ActivityMode, ClockState, PauseInterval, Session, SessionRecord, SyncState,
};
pub use store::{ConflictCopy, LocalStore, PullOutcome, SessionQuery};
