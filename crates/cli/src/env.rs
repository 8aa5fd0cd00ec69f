// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.
//!
//! All runtime environment variables used by the client are defined here
//! with typed accessor functions. The variable name constants are generated
//! by `build.rs` and live in the [`vars`] submodule.

use std::path::PathBuf;

/// Generated environment variable name constants.
pub mod vars {
    include!(concat!(env!("OUT_DIR"), "/env_vars.rs"));
}

/// Returns the auth token from `ECOSYNC_TOKEN`, if set and non-blank.
pub fn token() -> Option<String> {
    non_blank(std::env::var(vars::ECOSYNC_TOKEN).ok())
}

/// Returns the value of `ECOSYNC_CONFIG` if set.
pub fn config_path() -> Option<PathBuf> {
    non_blank(std::env::var(vars::ECOSYNC_CONFIG).ok()).map(PathBuf::from)
}

/// Returns the value of `ECOSYNC_STATE_DIR` if set.
pub fn state_dir() -> Option<PathBuf> {
    non_blank(std::env::var(vars::ECOSYNC_STATE_DIR).ok()).map(PathBuf::from)
}

/// Returns the value of `ECOSYNC_BASE_URL` if set.
pub fn base_url() -> Option<String> {
    non_blank(std::env::var(vars::ECOSYNC_BASE_URL).ok())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
