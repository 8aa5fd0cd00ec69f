// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod clear;
pub mod listen;
pub mod pending;
pub mod queue;
pub mod status;
pub mod sync;
#[cfg(test)]
#[path = "mod_tests.rs"]
pub mod testing;

use std::sync::Arc;

use chrono::DateTime;
use eco_core::FileStore;

use crate::config::Config;
use crate::error::Result;
use crate::session::sync_service;
use crate::sync::{HttpSyncApi, SyncService};

/// Helper to open the sync service over the configured state file.
///
/// Nothing touches the network until a command pushes or pulls.
pub fn open_service(config: &Config) -> Result<SyncService<HttpSyncApi>> {
    let store = FileStore::open(&config.state_path()?)?;
    sync_service(config, Arc::new(store))
}

/// Formats a server sync timestamp (milliseconds since the epoch) for display.
///
/// The raw value is always shown since the server treats it as opaque.
pub fn format_timestamp(ms: i64) -> String {
    match DateTime::from_timestamp_millis(ms) {
        Some(dt) => format!("{} ({})", ms, dt.format("%Y-%m-%d %H:%M:%S UTC")),
        None => ms.to_string(),
    }
}
