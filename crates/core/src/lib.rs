// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! eco-core: Shared building blocks for the EcoChain sync client.
//!
//! This crate provides the wire types, the pending-update model, the
//! reconnect backoff policy and the key-value persistence capability used by
//! the `ecosync` client.

pub mod backoff;
pub mod clock;
pub mod error;
pub mod protocol;
pub mod store;
pub mod update;

pub use backoff::Backoff;
pub use clock::{ClockSource, SystemClock};
pub use error::{Error, Result};
pub use protocol::{ChangeType, ClientMessage, Message, Notification, Severity, SyncEvent};
pub use store::{FileStore, KeyValueStore, KeyValueStoreExt, MemoryStore};
pub use update::{
    record_id, ItemResult, LocalIdGenerator, Operation, PendingUpdate, PullResponse, PushRequest,
    PushResponse,
};
