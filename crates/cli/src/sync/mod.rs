// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

//! Offline-first sync with the remote authority.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ LocalStore  │────►│ SyncEngine  │────►│   Remote    │
//! │ (queue)     │◄────│             │◄────│   (trait)   │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                            ▲
//!                     ┌─────────────┐
//!                     │Connectivity │  (probe + host signal)
//!                     └─────────────┘
//! ```
//!
//! # Features
//!
//! - Durable, coalesced queue drained whenever the remote is reachable
//! - Push before pull within one pass
//! - Conflicts flagged, never auto-merged
//! - Capped exponential backoff and a bounded request timeout
//! - Injectable remote trait for testing

mod backoff;
mod connectivity;
mod engine;
mod events;
mod http;
mod remote;

pub use backoff::Backoff;
pub use connectivity::SharedConnectivity;
pub use engine::SyncEngine;
pub use events::{PersistentFailure, SyncEvent, SyncReport};
pub use http::HttpRemote;
pub use remote::{Ack, RecordEnvelope, Remote, RemoteError, RemoteFuture, RemoteResult};

#[cfg(test)]
pub(crate) use remote::tests::MemoryRemote;
