// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Pending updates and the push/pull payloads of the sync API.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::clock::{ClockSource, SystemClock};
use crate::error::{Error, Result};

/// A client-originated mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "create" => Ok(Operation::Create),
            "update" => Ok(Operation::Update),
            "delete" => Ok(Operation::Delete),
            _ => Err(Error::InvalidOperation(s.to_string())),
        }
    }
}

/// A locally buffered mutation awaiting server acknowledgment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingUpdate {
    pub operation: Operation,
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl PendingUpdate {
    pub fn new(operation: Operation, data: Value, id: Option<String>) -> Self {
        PendingUpdate {
            operation,
            data,
            id,
        }
    }
}

/// Extracts a record id from `_id` or `id`, rendering numbers as strings.
pub fn record_id(data: &Value) -> Option<String> {
    data.get("_id")
        .or_else(|| data.get("id"))
        .and_then(id_to_string)
}

fn id_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn deserialize_opt_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(id_to_string))
}

/// Body of a push request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushRequest {
    pub updates: Vec<PendingUpdate>,
}

/// Per-update outcome reported by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemResult {
    pub success: bool,
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub operation: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response of `POST /sync/:entityType`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushResponse {
    pub success: bool,
    #[serde(default)]
    pub results: Vec<ItemResult>,
    #[serde(default)]
    pub sync_timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Response of `GET /sync/:entityType`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Vec<Value>,
    #[serde(default)]
    pub sync_timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Generates ids for updates whose data carries none.
///
/// Format: `local-{hash}` where hash is the first 8 hex chars of
/// SHA256(entity type + clock millis + sequence number).
pub struct LocalIdGenerator<C: ClockSource = SystemClock> {
    clock: C,
    seq: AtomicU64,
}

impl LocalIdGenerator<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for LocalIdGenerator<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ClockSource> LocalIdGenerator<C> {
    pub fn with_clock(clock: C) -> Self {
        LocalIdGenerator {
            clock,
            seq: AtomicU64::new(0),
        }
    }

    pub fn next_id(&self, entity_type: &str) -> String {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let input = format!("{}{}{}", entity_type, self.clock.now_ms(), seq);
        let hash = Sha256::digest(input.as_bytes());
        format!("local-{}", hex::encode(&hash[..4]))
    }
}

#[cfg(test)]
#[path = "update_tests.rs"]
mod tests;
