// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use crate::realtime::RealtimeError;
use crate::sync::{ApiError, SyncError};

/// All possible errors that can occur in the ecosync library.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("config file not found: {0}\n  hint: pass --config or create it with a base_url entry")]
    ConfigNotFound(String),

    #[error("invalid config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("{0}")]
    InvalidInput(String),

    #[error("synchronization failed: {0}")]
    SyncFailed(String),

    #[error("realtime connection ended: {0}")]
    ConnectionLost(String),

    #[error(transparent)]
    Realtime(#[from] RealtimeError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Core(#[from] eco_core::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
