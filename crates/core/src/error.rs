// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for eco-core operations.

use thiserror::Error;

/// All possible errors that can occur in eco-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid operation: '{0}'\n  hint: valid operations are: create, update, delete")]
    InvalidOperation(String),

    #[error("invalid change type: '{0}'\n  hint: valid change types are: create, update, delete")]
    InvalidChangeType(String),

    #[error("malformed message: {0}")]
    MalformedMessage(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupted store at {path}: {reason}")]
    CorruptedStore { path: String, reason: String },

    #[error("store lock poisoned")]
    LockPoisoned,
}

/// A specialized Result type for eco-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
