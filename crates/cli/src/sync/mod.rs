// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Poll-based data synchronization with the EcoChain backend.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ SyncService │────►│   SyncApi   │────►│   Backend   │
//! │             │◄────│   (trait)   │◄────│  /sync/...  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │
//!        ▼
//! ┌──────────────────────────────────────┐
//! │ KeyValueStore                        │
//! │  pendingUpdates:<entity>  (queue)    │
//! │  lastSyncTimestamp:<entity>          │
//! │  syncSnapshot                        │
//! └──────────────────────────────────────┘
//! ```
//!
//! # Features
//!
//! - Pending updates persisted per entity type before `queue_update` returns
//! - Push removes only the updates the server confirms
//! - Pull resumes from the stored server watermark
//! - At most one sync pass at a time
//! - Injectable API trait for testing

mod api;
mod queue;
mod service;
mod state;

pub use api::{ApiError, ApiFuture, ApiResult, HttpSyncApi, SyncApi};
pub use queue::{pending_key, PendingQueue, PENDING_PREFIX};
pub use service::{
    EntityCounts, PullOutcome, PushOutcome, SyncError, SyncOptions, SyncReport, SyncResult,
    SyncService, DEFAULT_ENTITY_TYPES, SYNC_IN_PROGRESS,
};
pub use state::{
    timestamp_key, ChangeCounts, Snapshot, Watermarks, SNAPSHOT_KEY, TIMESTAMP_PREFIX,
};

#[cfg(test)]
pub(crate) mod test_helpers;




#[cfg(test)]
mod state_tests;
