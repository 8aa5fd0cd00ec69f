// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Realtime protocol messages exchanged with the EcoChain backend.
//!
//! Inbound frames are JSON objects discriminated by a `type` field:
//! - `sync`: an entity changed on the server
//! - `notification`: a user-facing notice
//! - anything else is passed through untouched
//!
//! The only outbound frame is a subscription update (WebSocket transport).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Message type for sync events.
pub const SYNC_TYPE: &str = "sync";
/// Message type for notifications.
pub const NOTIFICATION_TYPE: &str = "notification";

/// Kind of change carried by a sync event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Create,
    Update,
    Delete,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Create => "create",
            ChangeType::Update => "update",
            ChangeType::Delete => "delete",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "create" => Ok(ChangeType::Create),
            "update" => Ok(ChangeType::Update),
            "delete" => Ok(ChangeType::Delete),
            _ => Err(Error::InvalidChangeType(s.to_string())),
        }
    }
}

/// Severity of a notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Error,
    Success,
}

/// A server-side change to an entity type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncEvent {
    pub entity_type: String,
    pub change_type: ChangeType,
    /// Server-issued watermark; opaque to the client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub changes: Vec<Value>,
}

/// A user-facing notification pushed by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Value>,
}

/// An inbound realtime message.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Sync(SyncEvent),
    Notification(Notification),
    /// Any other message type, with its remaining fields.
    Other { kind: String, payload: Value },
}

impl Message {
    /// Returns the `type` discriminator of the message.
    pub fn kind(&self) -> &str {
        match self {
            Message::Sync(_) => SYNC_TYPE,
            Message::Notification(_) => NOTIFICATION_TYPE,
            Message::Other { kind, .. } => kind,
        }
    }

    /// Server-side entity type the message refers to, if any.
    pub fn entity_type(&self) -> Option<&str> {
        match self {
            Message::Sync(event) => Some(&event.entity_type),
            Message::Notification(_) => None,
            Message::Other { payload, .. } => payload.get("entityType").and_then(Value::as_str),
        }
    }

    /// Parses a frame. Frames must be JSON objects with a string `type`.
    ///
    /// A `sync` or `notification` frame whose fields do not match the typed
    /// shape is kept as [`Message::Other`] under its original type.
    pub fn from_json(s: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(s)?;
        let Value::Object(mut fields) = value else {
            return Err(Error::MalformedMessage("expected a JSON object".into()));
        };

        let kind = match fields.get("type") {
            Some(Value::String(kind)) => kind.clone(),
            _ => {
                return Err(Error::MalformedMessage(
                    "missing string field 'type'".into(),
                ))
            }
        };

        let typed = match kind.as_str() {
            SYNC_TYPE => serde_json::from_value(Value::Object(fields.clone()))
                .map(Message::Sync)
                .ok(),
            NOTIFICATION_TYPE => serde_json::from_value(Value::Object(fields.clone()))
                .map(Message::Notification)
                .ok(),
            _ => None,
        };

        Ok(typed.unwrap_or_else(|| {
            fields.remove("type");
            Message::Other {
                kind,
                payload: Value::Object(fields),
            }
        }))
    }

    /// Renders the message back to its wire shape, `type` included.
    pub fn to_value(&self) -> Result<Value> {
        let body = match self {
            Message::Sync(event) => serde_json::to_value(event)?,
            Message::Notification(note) => serde_json::to_value(note)?,
            Message::Other { payload, .. } => payload.clone(),
        };
        let mut fields = match body {
            Value::Object(fields) => fields,
            other => {
                let mut fields = Map::new();
                fields.insert("payload".to_string(), other);
                fields
            }
        };
        fields.insert("type".to_string(), Value::String(self.kind().to_string()));
        Ok(Value::Object(fields))
    }
}

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Replace the server-side subscription set for this connection.
    Subscribe { entities: Vec<String> },
}

impl ClientMessage {
    /// Creates a Subscribe message.
    pub fn subscribe(entities: Vec<String>) -> Self {
        ClientMessage::Subscribe { entities }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
