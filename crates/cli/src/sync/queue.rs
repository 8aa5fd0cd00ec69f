// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Pending-update queue, one ordered list per entity type.
//!
//! Every mutation is written through to the [`KeyValueStore`] under
//! `pendingUpdates:<entity>` before it returns, so queued updates survive
//! reconnects and restarts. Each operation re-reads the persisted list first,
//! so updates queued by another process sharing the store are picked up
//! rather than overwritten. A list whose last write failed stays
//! authoritative in memory until a write succeeds.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use eco_core::{Error, KeyValueStore, KeyValueStoreExt, PendingUpdate, Result};
use tracing::warn;

/// Store key prefix for persisted queues.
pub const PENDING_PREFIX: &str = "pendingUpdates:";

pub fn pending_key(entity_type: &str) -> String {
    format!("{}{}", PENDING_PREFIX, entity_type)
}

#[derive(Default)]
struct Lists {
    updates: BTreeMap<String, Vec<PendingUpdate>>,
    // Entities whose in-memory list is newer than the store.
    unsaved: HashSet<String>,
}

/// Per-entity queue of unconfirmed local mutations.
pub struct PendingQueue {
    store: Arc<dyn KeyValueStore>,
    lists: Mutex<Lists>,
}

impl PendingQueue {
    /// Loads every persisted queue from `store`.
    ///
    /// An entry that no longer parses is skipped with a warning rather than
    /// failing startup.
    pub fn open(store: Arc<dyn KeyValueStore>) -> Result<Self> {
        store.keys()?;
        let queue = PendingQueue {
            store,
            lists: Mutex::new(Lists::default()),
        };
        queue.refresh_all(&mut *queue.lock()?);
        Ok(queue)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Lists>> {
        self.lists.lock().map_err(|_| Error::LockPoisoned)
    }

    /// Reloads `entity_type` from the store unless memory holds unsaved work.
    fn refresh(&self, lists: &mut Lists, entity_type: &str) {
        if lists.unsaved.contains(entity_type) {
            return;
        }
        let key = pending_key(entity_type);
        match self.store.get_json::<Vec<PendingUpdate>>(&key) {
            Ok(Some(updates)) if !updates.is_empty() => {
                lists.updates.insert(entity_type.to_string(), updates);
            }
            Ok(_) => {
                lists.updates.remove(entity_type);
            }
            Err(e) => warn!(key = %key, error = %e, "ignoring unreadable pending queue"),
        }
    }

    fn refresh_all(&self, lists: &mut Lists) {
        let mut entities: BTreeSet<String> = lists.updates.keys().cloned().collect();
        match self.store.keys() {
            Ok(keys) => entities.extend(
                keys.iter()
                    .filter_map(|key| key.strip_prefix(PENDING_PREFIX))
                    .map(str::to_string),
            ),
            Err(e) => {
                warn!(error = %e, "failed to list pending queues");
                return;
            }
        }
        for entity in entities {
            self.refresh(lists, &entity);
        }
    }

    /// Writes `entity_type`'s list, tracking whether memory is ahead.
    fn persist(&self, lists: &mut Lists, entity_type: &str) -> Result<()> {
        let key = pending_key(entity_type);
        let updates = lists
            .updates
            .get(entity_type)
            .filter(|updates| !updates.is_empty())
            .cloned();
        let result = match updates {
            Some(updates) => self.store.set_json(&key, &updates),
            None => {
                lists.updates.remove(entity_type);
                self.store.remove(&key)
            }
        };
        if result.is_ok() {
            lists.unsaved.remove(entity_type);
        } else {
            lists.unsaved.insert(entity_type.to_string());
        }
        result
    }

    /// Appends an update.
    ///
    /// The update is kept in memory even when persisting it fails; the error
    /// is returned so the caller can report it.
    pub fn enqueue(&self, entity_type: &str, update: PendingUpdate) -> Result<()> {
        let mut lists = self.lock()?;
        self.refresh(&mut lists, entity_type);
        lists
            .updates
            .entry(entity_type.to_string())
            .or_default()
            .push(update);
        self.persist(&mut lists, entity_type)
    }

    /// Returns the queued updates for `entity_type`, oldest first.
    pub fn peek(&self, entity_type: &str) -> Result<Vec<PendingUpdate>> {
        let mut lists = self.lock()?;
        self.refresh(&mut lists, entity_type);
        Ok(lists.updates.get(entity_type).cloned().unwrap_or_default())
    }

    /// Removes confirmed updates among the first `sent` entries.
    ///
    /// Updates queued after the batch was taken are never removed, even when
    /// they share an id with a confirmed one. Returns how many were removed.
    pub fn remove_confirmed(
        &self,
        entity_type: &str,
        sent: usize,
        confirmed: &HashSet<String>,
    ) -> Result<usize> {
        let mut lists = self.lock()?;
        self.refresh(&mut lists, entity_type);
        let Some(list) = lists.updates.get_mut(entity_type) else {
            return Ok(0);
        };

        let before = list.len();
        let mut index = 0;
        list.retain(|update| {
            let in_batch = index < sent;
            index += 1;
            !(in_batch && update.id.as_ref().is_some_and(|id| confirmed.contains(id)))
        });
        let removed = before - list.len();

        if removed > 0 {
            self.persist(&mut lists, entity_type)?;
        }
        Ok(removed)
    }

    /// Drops every update for `entity_type`.
    pub fn clear_entity(&self, entity_type: &str) -> Result<()> {
        let mut lists = self.lock()?;
        lists.updates.remove(entity_type);
        lists.unsaved.remove(entity_type);
        self.store.remove(&pending_key(entity_type))
    }

    /// Drops every queue, including persisted ones not loaded in memory.
    pub fn clear(&self) -> Result<()> {
        let mut lists = self.lock()?;
        lists.updates.clear();
        lists.unsaved.clear();
        for key in self.store.keys()? {
            if key.starts_with(PENDING_PREFIX) {
                self.store.remove(&key)?;
            }
        }
        Ok(())
    }

    /// Current lists, refreshed from the store.
    fn snapshot(&self) -> BTreeMap<String, Vec<PendingUpdate>> {
        match self.lock() {
            Ok(mut lists) => {
                self.refresh_all(&mut lists);
                lists.updates.clone()
            }
            Err(_) => BTreeMap::new(),
        }
    }

    /// Total number of queued updates across entity types.
    pub fn len(&self) -> usize {
        self.snapshot().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len_for(&self, entity_type: &str) -> usize {
        self.peek(entity_type).map_or(0, |updates| updates.len())
    }

    /// Entity types with at least one queued update.
    pub fn entity_types(&self) -> Vec<String> {
        self.snapshot()
            .into_iter()
            .filter(|(_, updates)| !updates.is_empty())
            .map(|(entity, _)| entity)
            .collect()
    }
}
