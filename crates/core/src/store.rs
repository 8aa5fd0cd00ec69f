// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Key-value persistence for client sync state.
//!
//! Sync state (pending updates, last sync timestamps, the record snapshot)
//! lives behind [`KeyValueStore`] so the same logic runs against a JSON file
//! on disk or an in-memory map in tests.
//!
//! Every `set`/`remove` is durable before it returns. [`FileStore`] holds no
//! cache: each write takes an exclusive lock, re-reads the document, applies
//! the one key change, then renames a temp file over the original. Several
//! processes may share one file without dropping each other's keys.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// Capability to get/set/remove JSON values by key.
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// Returns all keys in ascending order.
    fn keys(&self) -> Result<Vec<String>>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }

    fn keys(&self) -> Result<Vec<String>> {
        (**self).keys()
    }
}

/// Typed helpers over any [`KeyValueStore`].
pub trait KeyValueStoreExt: KeyValueStore {
    /// Reads and deserializes the value under `key`.
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Serializes and stores `value` under `key`.
    fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        self.set(key, serde_json::to_value(value)?)
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStoreExt for S {}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex.lock().map_err(|_| Error::LockPoisoned)
}

/// In-memory store, used in tests and for ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(lock(&self.entries)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        lock(&self.entries)?.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        lock(&self.entries)?.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(lock(&self.entries)?.keys().cloned().collect())
    }
}

/// Store persisted as a single JSON object on disk.
pub struct FileStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl FileStore {
    /// Opens the store at `path`, creating parent directories as needed.
    ///
    /// A missing or empty file is an empty store.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        Self::read_entries(path)?;

        Ok(FileStore {
            path: path.to_path_buf(),
            lock_path: path.with_extension("lock"),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(path: &Path) -> Result<BTreeMap<String, Value>> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };

        if text.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        match serde_json::from_str::<Value>(&text)? {
            Value::Object(map) => Ok(map.into_iter().collect()),
            _ => Err(Error::CorruptedStore {
                path: path.display().to_string(),
                reason: "expected a JSON object".to_string(),
            }),
        }
    }

    /// Applies `change` to the current on-disk document under an exclusive
    /// lock. The file is rewritten only when `change` returns true.
    fn update(&self, change: impl FnOnce(&mut BTreeMap<String, Value>) -> bool) -> Result<()> {
        use fs2::FileExt;

        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&self.lock_path)?;
        lock_file.lock_exclusive()?;

        let result = (|| -> Result<()> {
            let mut entries = Self::read_entries(&self.path)?;
            if !change(&mut entries) {
                return Ok(());
            }

            let tmp_path = self.path.with_extension("tmp");
            let mut file = File::create(&tmp_path)?;
            let json = serde_json::to_string_pretty(&entries)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
            fs::rename(&tmp_path, &self.path)?;
            Ok(())
        })();

        let _ = FileExt::unlock(&lock_file);
        result
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(Self::read_entries(&self.path)?.remove(key))
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value);
            true
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|entries| entries.remove(key).is_some())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(Self::read_entries(&self.path)?.into_keys().collect())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
