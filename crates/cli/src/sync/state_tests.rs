// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for watermarks and the record snapshot.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use eco_core::{KeyValueStore, MemoryStore};
use serde_json::json;
use yare::parameterized;

use super::state::{timestamp_key, ChangeCounts, Snapshot, Watermarks, SNAPSHOT_KEY};

#[test]
fn watermarks_round_trip_and_clear() {
    let store = Arc::new(MemoryStore::new());
    let marks = Watermarks::new(store.clone());

    assert_eq!(marks.get("orders").unwrap(), None);
    marks.set("orders", 1_000_000_000).unwrap();
    marks.set("users", 7).unwrap();

    assert_eq!(marks.get("orders").unwrap(), Some(1_000_000_000));
    assert_eq!(
        store.get(&timestamp_key("orders")).unwrap(),
        Some(json!(1_000_000_000))
    );
    assert_eq!(marks.all().unwrap().len(), 2);

    store.set("unrelated", json!(true)).unwrap();
    marks.clear().unwrap();
    assert!(marks.all().unwrap().is_empty());
    assert_eq!(store.keys().unwrap(), vec!["unrelated"]);
}

#[test]
fn snapshot_counts_added_updated_deleted() {
    let store = Arc::new(MemoryStore::new());
    let snapshot = Snapshot::open(store.clone()).unwrap();

    let first = snapshot
        .apply("orders", &[json!({"_id": "a", "qty": 1}), json!({"_id": "b"})])
        .unwrap();
    assert_eq!(first, ChangeCounts { added: 2, updated: 0, deleted: 0 });

    let second = snapshot
        .apply(
            "orders",
            &[
                json!({"_id": "a", "qty": 2}),
                json!({"_id": "b", "deleted": true}),
                json!({"_id": "c"}),
            ],
        )
        .unwrap();
    assert_eq!(second, ChangeCounts { added: 1, updated: 1, deleted: 1 });

    assert_eq!(snapshot.count("orders"), 2);
    assert_eq!(snapshot.records("orders")[0], json!({"_id": "a", "qty": 2}));
    assert!(store.get(SNAPSHOT_KEY).unwrap().is_some());
}

#[parameterized(
    deleted_flag = { json!({"id": 1, "deleted": true}) },
    underscore_flag = { json!({"_id": "1", "_deleted": true}) },
)]
fn deletion_flags(record: serde_json::Value) {
    let snapshot = Snapshot::open(Arc::new(MemoryStore::new())).unwrap();
    snapshot.apply("users", &[json!({"id": 1})]).unwrap();

    let counts = snapshot.apply("users", &[record]).unwrap();
    assert_eq!(counts.deleted, 1);
    assert_eq!(snapshot.count("users"), 0);
}

#[test]
fn records_without_id_are_counted_not_cached() {
    let snapshot = Snapshot::open(Arc::new(MemoryStore::new())).unwrap();
    let counts = snapshot.apply("products", &[json!({"name": "bottle"})]).unwrap();

    assert_eq!(counts.added, 1);
    assert_eq!(snapshot.count("products"), 0);
}

#[test]
fn snapshot_reloads_and_clears() {
    let store = Arc::new(MemoryStore::new());
    Snapshot::open(store.clone())
        .unwrap()
        .apply("orders", &[json!({"_id": "a"})])
        .unwrap();

    let reopened = Snapshot::open(store.clone()).unwrap();
    assert_eq!(reopened.count("orders"), 1);

    reopened.clear().unwrap();
    assert_eq!(reopened.count("orders"), 0);
    assert_eq!(store.get(SNAPSHOT_KEY).unwrap(), None);
}

#[test]
fn corrupt_snapshot_starts_empty() {
    let store = Arc::new(MemoryStore::new());
    store.set(SNAPSHOT_KEY, json!(["not", "a", "map"])).unwrap();

    let snapshot = Snapshot::open(store).unwrap();
    assert_eq!(snapshot.count("orders"), 0);
}

#[test]
fn snapshot_merges_records_written_by_another_handle() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let first = Snapshot::open(Arc::clone(&store)).unwrap();
    let second = Snapshot::open(Arc::clone(&store)).unwrap();

    first.apply("orders", &[json!({"_id": "o1"})]).unwrap();
    second.apply("users", &[json!({"_id": "u1"})]).unwrap();

    let reopened = Snapshot::open(store).unwrap();
    assert_eq!(reopened.count("orders"), 1);
    assert_eq!(reopened.count("users"), 1);
}
