// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use yare::parameterized;

#[parameterized(
    config = { Error::Config("no state directory".into()), "no state directory" },
    not_found = { Error::ConfigNotFound("/etc/ecosync.toml".into()), "hint: pass --config" },
    invalid_input = { Error::InvalidInput("bad json".into()), "bad json" },
    sync_failed = { Error::SyncFailed("orders: push failed".into()), "orders: push failed" },
    missing_token = { Error::Realtime(RealtimeError::MissingToken), "token" },
)]
fn error_display_contains(err: Error, expected: &str) {
    assert!(err.to_string().contains(expected), "{}", err);
}

#[test]
fn error_from_core() {
    let err: Error = eco_core::Error::InvalidOperation("upsert".into()).into();
    assert!(matches!(err, Error::Core(_)));
    assert!(err.to_string().contains("upsert"));
}

#[test]
fn error_from_toml() {
    let toml_err = toml::from_str::<crate::config::Config>("base_url = [").unwrap_err();
    let err: Error = toml_err.into();
    assert!(matches!(err, Error::ConfigParse(_)));
}
