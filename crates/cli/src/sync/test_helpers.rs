// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for sync module tests.

#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use eco_core::{ItemResult, KeyValueStore, MemoryStore, PendingUpdate, PullResponse, PushResponse};
use serde_json::{json, Value};
use tokio::sync::Notify;

use super::api::{ApiError, ApiFuture, ApiResult, SyncApi};
use super::service::SyncService;

/// A request the mock API received.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Pull { entity: String, since: i64 },
    Push { entity: String, updates: Vec<PendingUpdate> },
    Status,
}

/// Scriptable in-memory [`SyncApi`].
///
/// Unscripted pulls return no data; unscripted pushes confirm every update.
#[derive(Default)]
pub struct MockApi {
    calls: Mutex<Vec<Call>>,
    pulls: Mutex<HashMap<String, VecDeque<ApiResult<PullResponse>>>>,
    pushes: Mutex<HashMap<String, VecDeque<ApiResult<PushResponse>>>>,
    gate: Option<Arc<Notify>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every pull waits for [`Notify::notify_one`] on the returned handle.
    pub fn gated() -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let api = MockApi {
            gate: Some(Arc::clone(&gate)),
            ..Self::default()
        };
        (api, gate)
    }

    pub fn script_pull(&self, entity: &str, result: ApiResult<PullResponse>) {
        self.pulls
            .lock()
            .unwrap()
            .entry(entity.to_string())
            .or_default()
            .push_back(result);
    }

    pub fn script_push(&self, entity: &str, result: ApiResult<PushResponse>) {
        self.pushes
            .lock()
            .unwrap()
            .entry(entity.to_string())
            .or_default()
            .push_back(result);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn push_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Push { .. }))
            .count()
    }
}

pub fn pull_ok(data: Vec<Value>, timestamp: Option<i64>) -> ApiResult<PullResponse> {
    Ok(PullResponse {
        success: true,
        data,
        sync_timestamp: timestamp,
        message: None,
    })
}

pub fn push_ok(results: Vec<ItemResult>, timestamp: Option<i64>) -> ApiResult<PushResponse> {
    Ok(PushResponse {
        success: true,
        results,
        sync_timestamp: timestamp,
        message: None,
    })
}

pub fn item(id: &str, success: bool) -> ItemResult {
    ItemResult {
        success,
        id: Some(id.to_string()),
        operation: None,
        error: (!success).then(|| "rejected".to_string()),
    }
}

pub fn server_error(status: u16) -> ApiError {
    ApiError::Server {
        status,
        message: "boom".into(),
    }
}

impl SyncApi for MockApi {
    fn pull<'a>(&'a self, entity_type: &'a str, since: i64) -> ApiFuture<'a, PullResponse> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(Call::Pull {
                entity: entity_type.to_string(),
                since,
            });
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            let scripted = self
                .pulls
                .lock()
                .unwrap()
                .get_mut(entity_type)
                .and_then(VecDeque::pop_front);
            scripted.unwrap_or_else(|| pull_ok(Vec::new(), None))
        })
    }

    fn push<'a>(
        &'a self,
        entity_type: &'a str,
        updates: &'a [PendingUpdate],
    ) -> ApiFuture<'a, PushResponse> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(Call::Push {
                entity: entity_type.to_string(),
                updates: updates.to_vec(),
            });
            let scripted = self
                .pushes
                .lock()
                .unwrap()
                .get_mut(entity_type)
                .and_then(VecDeque::pop_front);
            scripted.unwrap_or_else(|| {
                let results = updates
                    .iter()
                    .filter_map(|u| u.id.as_deref())
                    .map(|id| item(id, true))
                    .collect();
                push_ok(results, None)
            })
        })
    }

    fn status(&self) -> ApiFuture<'_, Value> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(Call::Status);
            Ok(json!({ "status": "ok", "pending": 0 }))
        })
    }
}

/// A service over a fresh in-memory store.
pub fn service_with(api: MockApi) -> (SyncService<Arc<MockApi>>, Arc<MockApi>, Arc<MemoryStore>) {
    let api = Arc::new(api);
    let store = Arc::new(MemoryStore::new());
    let service = SyncService::open(Arc::clone(&api), store.clone() as Arc<dyn KeyValueStore>).unwrap();
    (service, api, store)
}
