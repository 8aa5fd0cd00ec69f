// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Persisted sync state: per-entity watermarks and the record snapshot.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use eco_core::{record_id, Error, KeyValueStore, KeyValueStoreExt, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

/// Store key prefix for last sync timestamps.
pub const TIMESTAMP_PREFIX: &str = "lastSyncTimestamp:";
/// Store key of the combined record snapshot.
pub const SNAPSHOT_KEY: &str = "syncSnapshot";

pub fn timestamp_key(entity_type: &str) -> String {
    format!("{}{}", TIMESTAMP_PREFIX, entity_type)
}

/// Server-issued sync timestamps, one per entity type.
pub struct Watermarks {
    store: Arc<dyn KeyValueStore>,
}

impl Watermarks {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Watermarks { store }
    }

    pub fn get(&self, entity_type: &str) -> Result<Option<i64>> {
        self.store.get_json(&timestamp_key(entity_type))
    }

    pub fn set(&self, entity_type: &str, timestamp: i64) -> Result<()> {
        self.store.set_json(&timestamp_key(entity_type), &timestamp)
    }

    /// All known watermarks by entity type.
    pub fn all(&self) -> Result<BTreeMap<String, i64>> {
        let mut marks = BTreeMap::new();
        for key in self.store.keys()? {
            if let Some(entity) = key.strip_prefix(TIMESTAMP_PREFIX) {
                if let Some(ts) = self.store.get_json::<i64>(&key)? {
                    marks.insert(entity.to_string(), ts);
                }
            }
        }
        Ok(marks)
    }

    pub fn clear(&self) -> Result<()> {
        for key in self.store.keys()? {
            if key.starts_with(TIMESTAMP_PREFIX) {
                self.store.remove(&key)?;
            }
        }
        Ok(())
    }
}

/// How a pulled batch changed the snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChangeCounts {
    pub added: usize,
    pub updated: usize,
    pub deleted: usize,
}

type Records = BTreeMap<String, BTreeMap<String, Value>>;

/// Cache of pulled records: entity type → record id → record.
pub struct Snapshot {
    store: Arc<dyn KeyValueStore>,
    records: Mutex<Records>,
}

fn is_deleted(record: &Value) -> bool {
    ["deleted", "_deleted"]
        .iter()
        .any(|flag| record.get(flag) == Some(&Value::Bool(true)))
}

impl Snapshot {
    /// Loads the snapshot. An unreadable snapshot starts empty.
    pub fn open(store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let records = match store.get_json::<Records>(SNAPSHOT_KEY) {
            Ok(records) => records.unwrap_or_default(),
            Err(Error::Json(e)) => {
                warn!(error = %e, "discarding unreadable sync snapshot");
                Records::new()
            }
            Err(e) => return Err(e),
        };
        Ok(Snapshot {
            store,
            records: Mutex::new(records),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Records>> {
        self.records.lock().map_err(|_| Error::LockPoisoned)
    }

    /// Folds pulled records into the snapshot and persists it.
    ///
    /// Records flagged `deleted`/`_deleted` are removed and counted as
    /// deleted. Known ids count as updated, everything else as added.
    /// Records without an id are counted but not cached.
    pub fn apply(&self, entity_type: &str, data: &[Value]) -> Result<ChangeCounts> {
        let mut counts = ChangeCounts::default();
        if data.is_empty() {
            return Ok(counts);
        }

        let mut records = self.lock()?;
        // Another process may have folded its own pulls in since we loaded.
        if let Ok(Some(stored)) = self.store.get_json::<Records>(SNAPSHOT_KEY) {
            *records = stored;
        }
        let cache = records.entry(entity_type.to_string()).or_default();
        for record in data {
            let id = record_id(record);
            if is_deleted(record) {
                if let Some(id) = id {
                    cache.remove(&id);
                }
                counts.deleted += 1;
                continue;
            }
            match id {
                Some(id) => {
                    if cache.insert(id, record.clone()).is_some() {
                        counts.updated += 1;
                    } else {
                        counts.added += 1;
                    }
                }
                None => counts.added += 1,
            }
        }
        if cache.is_empty() {
            records.remove(entity_type);
        }

        self.store.set_json(SNAPSHOT_KEY, &*records)?;
        Ok(counts)
    }

    /// Cached records for `entity_type`, ordered by id.
    pub fn records(&self, entity_type: &str) -> Vec<Value> {
        self.lock()
            .map(|records| {
                records
                    .get(entity_type)
                    .map(|cache| cache.values().cloned().collect())
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }

    pub fn count(&self, entity_type: &str) -> usize {
        self.lock()
            .map(|records| records.get(entity_type).map_or(0, BTreeMap::len))
            .unwrap_or(0)
    }

    pub fn clear(&self) -> Result<()> {
        self.lock()?.clear();
        self.store.remove(SNAPSHOT_KEY)
    }
}
