// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use yare::parameterized;

#[test]
fn test_vars_constants() {
    assert_eq!(vars::ECOSYNC_TOKEN, "ECOSYNC_TOKEN");
    assert_eq!(vars::ECOSYNC_CONFIG, "ECOSYNC_CONFIG");
    assert_eq!(vars::ECOSYNC_STATE_DIR, "ECOSYNC_STATE_DIR");
    assert_eq!(vars::ECOSYNC_BASE_URL, "ECOSYNC_BASE_URL");
}

#[parameterized(
    unset = { None, None },
    empty = { Some(""), None },
    blank = { Some("  "), None },
    value = { Some("abc"), Some("abc") },
)]
fn test_non_blank(input: Option<&str>, expected: Option<&str>) {
    assert_eq!(
        non_blank(input.map(String::from)).as_deref(),
        expected
    );
}
