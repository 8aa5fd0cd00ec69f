// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Poll-based sync: queue local mutations, push them, pull server changes.
//!
//! A sync pass handles each entity type in turn: push its pending updates,
//! then pull everything newer than its stored watermark. One entity failing
//! does not stop the others; failures are collected into the
//! [`SyncReport`].

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use eco_core::{
    record_id, ItemResult, KeyValueStore, LocalIdGenerator, Operation, PendingUpdate,
};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::api::{ApiError, SyncApi};
use super::queue::PendingQueue;
use super::state::{ChangeCounts, Snapshot, Watermarks};

/// Entity types synced when none are given.
pub const DEFAULT_ENTITY_TYPES: [&str; 5] =
    ["users", "collections", "orders", "products", "transactions"];

/// Error returned by a concurrent [`SyncService::perform_sync`].
pub const SYNC_IN_PROGRESS: &str = "Sync already in progress";

/// Error type for sync service operations.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("sync state: {0}")]
    Store(#[from] eco_core::Error),
}

/// Result type for sync service operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Outcome of [`SyncService::push_updates`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PushOutcome {
    pub results: Vec<ItemResult>,
    pub timestamp: Option<i64>,
}

impl PushOutcome {
    /// Number of updates the server accepted.
    pub fn confirmed(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }
}

/// Outcome of [`SyncService::get_latest_data`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PullOutcome {
    pub data: Vec<Value>,
    pub timestamp: Option<i64>,
    pub changes: ChangeCounts,
}

/// Options for a sync pass.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Entity types to sync; the service defaults when `None` or empty.
    pub entity_types: Option<Vec<String>>,
}

impl SyncOptions {
    pub fn entities<I, E>(entity_types: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<String>,
    {
        SyncOptions {
            entity_types: Some(entity_types.into_iter().map(Into::into).collect()),
        }
    }
}

/// Per-entity tallies of a sync pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EntityCounts {
    pub added: usize,
    pub updated: usize,
    pub deleted: usize,
    pub errors: usize,
    pub pushed: usize,
}

/// Result of [`SyncService::perform_sync`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub entities: BTreeMap<String, EntityCounts>,
    /// Updates confirmed by the server across all entity types.
    pub pushed: usize,
    /// Newest server timestamp seen during the pass.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl SyncReport {
    fn busy() -> Self {
        SyncReport {
            success: false,
            error: Some(SYNC_IN_PROGRESS.to_string()),
            ..SyncReport::default()
        }
    }

    fn observe(&mut self, timestamp: Option<i64>) {
        if let Some(ts) = timestamp {
            self.timestamp = Some(self.timestamp.map_or(ts, |seen| seen.max(ts)));
        }
    }
}

/// Clears the in-progress flag when a sync pass ends, however it ends.
struct SyncGuard<'a>(&'a AtomicBool);

impl<'a> SyncGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SyncGuard(flag))
    }
}

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Queue-and-poll sync against the HTTP sync API.
pub struct SyncService<A: SyncApi> {
    api: A,
    queue: PendingQueue,
    watermarks: Watermarks,
    snapshot: Snapshot,
    ids: LocalIdGenerator,
    entity_types: Vec<String>,
    syncing: AtomicBool,
}

impl<A: SyncApi> SyncService<A> {
    /// Loads queued updates and the snapshot from `store`.
    pub fn open(api: A, store: Arc<dyn KeyValueStore>) -> SyncResult<Self> {
        let queue = PendingQueue::open(Arc::clone(&store))?;
        let snapshot = Snapshot::open(Arc::clone(&store))?;
        debug!(pending = queue.len(), "sync state loaded");

        Ok(SyncService {
            api,
            queue,
            watermarks: Watermarks::new(store),
            snapshot,
            ids: LocalIdGenerator::new(),
            entity_types: DEFAULT_ENTITY_TYPES.iter().map(|e| e.to_string()).collect(),
            syncing: AtomicBool::new(false),
        })
    }

    /// Replaces the default entity types. An empty list keeps the defaults.
    pub fn with_entity_types(mut self, entity_types: Vec<String>) -> Self {
        if !entity_types.is_empty() {
            self.entity_types = entity_types;
        }
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn entity_types(&self) -> &[String] {
        &self.entity_types
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn is_syncing(&self) -> bool {
        self.syncing.load(Ordering::Acquire)
    }

    /// Queues a local mutation for the next push.
    ///
    /// Never fails: the update is always held in memory, and a persistence
    /// failure is only logged. The id comes from `data._id` / `data.id`, or
    /// a generated local id when the data has none.
    pub fn queue_update(&self, entity_type: &str, operation: Operation, data: Value) -> PendingUpdate {
        let id = record_id(&data).unwrap_or_else(|| self.ids.next_id(entity_type));
        let update = PendingUpdate::new(operation, data, Some(id));

        match self.queue.enqueue(entity_type, update.clone()) {
            Ok(()) => debug!(entity = entity_type, %operation, id = ?update.id, "update queued"),
            Err(e) => error!(entity = entity_type, error = %e, "failed to persist queued update"),
        }
        update
    }

    /// Queued updates for `entity_type`, oldest first.
    pub fn pending_updates(&self, entity_type: &str) -> Vec<PendingUpdate> {
        self.queue.peek(entity_type).unwrap_or_default()
    }

    pub fn has_pending_updates(&self) -> bool {
        !self.queue.is_empty()
    }

    pub fn pending_updates_count(&self) -> usize {
        self.queue.len()
    }

    /// Pending counts for every entity type with queued updates.
    pub fn pending_by_entity(&self) -> BTreeMap<String, usize> {
        self.queue
            .entity_types()
            .into_iter()
            .map(|entity| {
                let count = self.queue.len_for(&entity);
                (entity, count)
            })
            .collect()
    }

    pub fn last_sync_timestamp(&self, entity_type: &str) -> SyncResult<Option<i64>> {
        Ok(self.watermarks.get(entity_type)?)
    }

    pub fn last_sync_timestamps(&self) -> SyncResult<BTreeMap<String, i64>> {
        Ok(self.watermarks.all()?)
    }

    /// Sends the queued updates for `entity_type` in one request.
    ///
    /// Only updates the server confirms are removed; the rest stay queued
    /// for the next attempt. An empty queue makes no request.
    pub async fn push_updates(&self, entity_type: &str) -> SyncResult<PushOutcome> {
        let batch = self.queue.peek(entity_type)?;
        if batch.is_empty() {
            return Ok(PushOutcome::default());
        }

        let response = self.api.push(entity_type, &batch).await?;
        let confirmed: HashSet<String> = response
            .results
            .iter()
            .filter(|r| r.success)
            .filter_map(|r| r.id.clone())
            .collect();
        let removed = self
            .queue
            .remove_confirmed(entity_type, batch.len(), &confirmed)?;

        let failed = response.results.iter().filter(|r| !r.success).count();
        if failed > 0 {
            warn!(entity = entity_type, failed, "server rejected some updates");
        }
        if let Some(ts) = response.sync_timestamp {
            self.watermarks.set(entity_type, ts)?;
        }
        info!(entity = entity_type, sent = batch.len(), removed, "pushed pending updates");

        Ok(PushOutcome {
            results: response.results,
            timestamp: response.sync_timestamp,
        })
    }

    /// Pulls changes to `entity_type` since its stored watermark (0 if none).
    pub async fn get_latest_data(&self, entity_type: &str) -> SyncResult<PullOutcome> {
        let since = self.watermarks.get(entity_type)?.unwrap_or(0);
        let response = self.api.pull(entity_type, since).await?;

        if let Some(ts) = response.sync_timestamp {
            self.watermarks.set(entity_type, ts)?;
        }
        let changes = self.snapshot.apply(entity_type, &response.data)?;
        debug!(
            entity = entity_type,
            since,
            records = response.data.len(),
            ?changes,
            "pulled latest data"
        );

        Ok(PullOutcome {
            data: response.data,
            timestamp: response.sync_timestamp,
            changes,
        })
    }

    /// Pushes then pulls every requested entity type.
    ///
    /// Returns a failed report without touching the network when another
    /// pass is already running.
    pub async fn perform_sync(&self, options: SyncOptions) -> SyncReport {
        let Some(_guard) = SyncGuard::acquire(&self.syncing) else {
            warn!("sync requested while another sync is running");
            return SyncReport::busy();
        };

        let entity_types = options
            .entity_types
            .filter(|entities| !entities.is_empty())
            .unwrap_or_else(|| self.entity_types.clone());
        info!(entities = ?entity_types, "starting sync");

        let mut report = SyncReport::default();
        let mut errors = Vec::new();

        for entity in entity_types {
            let mut counts = EntityCounts::default();

            match self.push_updates(&entity).await {
                Ok(outcome) => {
                    counts.pushed = outcome.confirmed();
                    report.observe(outcome.timestamp);
                }
                Err(e) => {
                    warn!(entity = %entity, error = %e, "push failed, skipping pull");
                    counts.errors += 1;
                    errors.push(format!("{}: push failed: {}", entity, e));
                    report.entities.insert(entity, counts);
                    continue;
                }
            }

            match self.get_latest_data(&entity).await {
                Ok(outcome) => {
                    counts.added = outcome.changes.added;
                    counts.updated = outcome.changes.updated;
                    counts.deleted = outcome.changes.deleted;
                    report.observe(outcome.timestamp);
                }
                Err(e) => {
                    warn!(entity = %entity, error = %e, "pull failed");
                    counts.errors += 1;
                    errors.push(format!("{}: pull failed: {}", entity, e));
                }
            }

            report.pushed += counts.pushed;
            report.entities.insert(entity, counts);
        }

        report.success = errors.is_empty();
        if !errors.is_empty() {
            report.error = Some(errors.join("; "));
        }
        info!(
            success = report.success,
            pushed = report.pushed,
            entities = report.entities.len(),
            "sync finished"
        );
        report
    }

    /// Wipes pending queues, watermarks and the snapshot.
    pub fn clear_sync_data(&self) -> SyncResult<()> {
        self.queue.clear()?;
        self.watermarks.clear()?;
        self.snapshot.clear()?;
        info!("cleared local sync data");
        Ok(())
    }

    /// The server's sync status document.
    pub async fn sync_status(&self) -> SyncResult<Value> {
        Ok(self.api.status().await?)
    }
}

impl<A: SyncApi + 'static> SyncService<A> {
    /// Runs [`perform_sync`](Self::perform_sync) every `every` until `cancel`
    /// fires. The first pass runs immediately.
    ///
    /// Entity types received on `triggers` are pulled right away, so server
    /// pushes and polling can run side by side.
    pub fn spawn_auto_sync(
        self: Arc<Self>,
        every: Duration,
        cancel: CancellationToken,
        mut triggers: Option<mpsc::UnboundedReceiver<String>>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(interval = ?every, "auto sync started");

            loop {
                let tick = tokio::select! {
                    _ = cancel.cancelled() => Tick::Stop,
                    _ = ticker.tick() => Tick::Poll,
                    entity = next_trigger(&mut triggers) => {
                        entity.map_or(Tick::TriggersClosed, Tick::Pull)
                    }
                };

                match tick {
                    Tick::Stop => break,
                    Tick::Poll => {
                        let report = self.perform_sync(SyncOptions::default()).await;
                        if let Some(error) = &report.error {
                            warn!(error = %error, "periodic sync incomplete");
                        }
                    }
                    Tick::Pull(entity) => match self.get_latest_data(&entity).await {
                        Ok(outcome) => {
                            debug!(entity = %entity, changes = ?outcome.changes, "pulled on server push")
                        }
                        Err(e) => warn!(entity = %entity, error = %e, "pull on server push failed"),
                    },
                    // Sender dropped; keep polling on the timer only
                    Tick::TriggersClosed => triggers = None,
                }
            }
            info!("auto sync stopped");
        })
    }
}

enum Tick {
    Poll,
    Pull(String),
    TriggersClosed,
    Stop,
}

async fn next_trigger(triggers: &mut Option<mpsc::UnboundedReceiver<String>>) -> Option<String> {
    match triggers {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
