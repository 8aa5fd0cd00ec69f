// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use serde_json::json;
use yare::parameterized;

struct FixedClock(u64);

impl ClockSource for FixedClock {
    fn now_ms(&self) -> u64 {
        self.0
    }
}

#[parameterized(
    underscore_id = { json!({"_id": "abc", "id": "ignored"}), Some("abc") },
    plain_id = { json!({"id": "o-1"}), Some("o-1") },
    numeric_id = { json!({"id": 42}), Some("42") },
    empty_id = { json!({"_id": ""}), None },
    missing = { json!({"name": "bottle"}), None },
    not_object = { json!([1, 2]), None },
)]
fn record_id_extraction(data: Value, expected: Option<&str>) {
    assert_eq!(record_id(&data).as_deref(), expected);
}

#[test]
fn operation_parse_and_display() {
    assert_eq!("delete".parse::<Operation>().unwrap(), Operation::Delete);
    assert_eq!(Operation::Create.to_string(), "create");
    assert!(matches!(
        "upsert".parse::<Operation>(),
        Err(Error::InvalidOperation(_))
    ));
}

#[test]
fn pending_update_omits_missing_id() {
    let update = PendingUpdate::new(Operation::Create, json!({"weight": 3}), None);
    let json = serde_json::to_value(&update).unwrap();
    assert_eq!(json, json!({"operation": "create", "data": {"weight": 3}}));
}

#[test]
fn push_response_accepts_numeric_ids_and_missing_fields() {
    let body = json!({
        "success": true,
        "results": [
            {"success": true, "id": 17, "operation": "update"},
            {"success": false, "id": "x"},
            {"success": true}
        ],
        "syncTimestamp": 1700000000000i64
    });
    let resp: PushResponse = serde_json::from_value(body).unwrap();
    assert_eq!(resp.results.len(), 3);
    assert_eq!(resp.results[0].id.as_deref(), Some("17"));
    assert_eq!(resp.results[0].operation, Some(Operation::Update));
    assert_eq!(resp.results[1].operation, None);
    assert_eq!(resp.results[2].id, None);
    assert_eq!(resp.sync_timestamp, Some(1_700_000_000_000));
}

#[test]
fn pull_response_defaults() {
    let resp: PullResponse = serde_json::from_value(json!({"success": true})).unwrap();
    assert!(resp.data.is_empty());
    assert_eq!(resp.sync_timestamp, None);
}

#[test]
fn local_ids_are_distinct_for_same_instant() {
    let gen = LocalIdGenerator::with_clock(FixedClock(1_000));
    let a = gen.next_id("orders");
    let b = gen.next_id("orders");
    assert!(a.starts_with("local-"));
    assert_eq!(a.len(), "local-".len() + 8);
    assert_ne!(a, b);
}
