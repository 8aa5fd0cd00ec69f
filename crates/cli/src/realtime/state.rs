// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connection state shared between the session task and its callers.
//!
//! Uses atomic fields so status reads never wait on the session task.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};
use std::sync::Mutex;

/// Observable connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl ConnectionState {
    fn to_u8(self) -> u8 {
        match self {
            ConnectionState::Disconnected => 0,
            ConnectionState::Connecting => 1,
            ConnectionState::Connected => 2,
            ConnectionState::Error => 3,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Connected,
            3 => ConnectionState::Error,
            _ => ConnectionState::Disconnected,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Error => "error",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection state visible to both the session task and the client handle.
pub struct SharedConnectionState {
    state: AtomicU8,
    /// Reconnect attempt currently in flight (0 when none).
    attempt: AtomicU32,
    /// Mirror of the transport's own ready-state, published by the session task.
    live: AtomicBool,
    last_error: Mutex<Option<String>>,
}

impl SharedConnectionState {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(ConnectionState::Disconnected.to_u8()),
            attempt: AtomicU32::new(0),
            live: AtomicBool::new(false),
            last_error: Mutex::new(None),
        }
    }

    pub fn get(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn set(&self, state: ConnectionState) {
        self.state.store(state.to_u8(), Ordering::Release);
    }

    pub fn attempt(&self) -> u32 {
        self.attempt.load(Ordering::Acquire)
    }

    pub fn set_attempt(&self, attempt: u32) {
        self.attempt.store(attempt, Ordering::Release);
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    pub fn set_live(&self, live: bool) {
        self.live.store(live, Ordering::Release);
    }

    /// Connected and the channel is still open.
    pub fn is_connected(&self) -> bool {
        self.get() == ConnectionState::Connected && self.is_live()
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().ok().and_then(|guard| guard.clone())
    }

    pub fn set_last_error(&self, error: Option<String>) {
        if let Ok(mut guard) = self.last_error.lock() {
            *guard = error;
        }
    }

    /// Human-readable status, e.g. `connecting (attempt 2)`.
    pub fn status_string(&self) -> String {
        match self.get() {
            ConnectionState::Connecting => {
                let attempt = self.attempt();
                if attempt > 0 {
                    format!("connecting (attempt {})", attempt)
                } else {
                    "connecting".to_string()
                }
            }
            ConnectionState::Error => match self.last_error() {
                Some(error) => format!("error: {}", error),
                None => "error".to_string(),
            },
            state => state.as_str().to_string(),
        }
    }
}

impl Default for SharedConnectionState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SharedConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedConnectionState")
            .field("state", &self.get())
            .field("attempt", &self.attempt())
            .field("live", &self.is_live())
            .finish()
    }
}
