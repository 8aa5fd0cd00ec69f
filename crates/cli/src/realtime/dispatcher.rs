// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Routes inbound frames to registered handlers by message type.
//!
//! Handlers registered under [`ALL`] see every message after the handlers
//! registered for its specific type. A failing or panicking handler is
//! logged and skipped; the remaining handlers still run.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, RwLock};

use eco_core::protocol::{NOTIFICATION_TYPE, SYNC_TYPE};
use eco_core::Message;
use tracing::{debug, error, warn};

/// Wildcard message type.
pub const ALL: &str = "all";

/// Error a handler may return.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// A message handler. Identity (for `off`) is the `Arc` pointer.
pub type Handler = Arc<dyn Fn(&Message) -> Result<(), HandlerError> + Send + Sync>;

/// Wraps a closure as a [`Handler`].
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(&Message) -> Result<(), HandlerError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Registry of handlers keyed by message type.
#[derive(Default)]
pub struct Dispatcher {
    handlers: RwLock<HashMap<String, Vec<Handler>>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `kind`. Returns false if it was already registered.
    pub fn on(&self, kind: &str, handler: Handler) -> bool {
        let Ok(mut handlers) = self.handlers.write() else {
            return false;
        };
        let list = handlers.entry(kind.to_string()).or_default();
        if list.iter().any(|h| Arc::ptr_eq(h, &handler)) {
            return false;
        }
        list.push(handler);
        true
    }

    /// Removes `handler` from `kind`. Returns whether it was registered.
    pub fn off(&self, kind: &str, handler: &Handler) -> bool {
        let Ok(mut handlers) = self.handlers.write() else {
            return false;
        };
        let Some(list) = handlers.get_mut(kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|h| !Arc::ptr_eq(h, handler));
        let removed = list.len() != before;
        if list.is_empty() {
            handlers.remove(kind);
        }
        removed
    }

    pub fn handler_count(&self, kind: &str) -> usize {
        self.handlers
            .read()
            .map(|handlers| handlers.get(kind).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    /// Parses a raw frame and dispatches it. Malformed frames are dropped.
    pub fn dispatch_frame(&self, frame: &str) -> Option<Message> {
        match Message::from_json(frame) {
            Ok(message) => {
                if let Message::Other { kind, .. } = &message {
                    if kind == SYNC_TYPE || kind == NOTIFICATION_TYPE {
                        debug!(kind = %kind, "frame does not match its typed shape");
                    }
                }
                self.dispatch(&message);
                Some(message)
            }
            Err(e) => {
                warn!(error = %e, "dropping malformed frame");
                None
            }
        }
    }

    /// Runs type handlers then wildcard handlers for `message`.
    pub fn dispatch(&self, message: &Message) {
        let kind = message.kind();
        let targets: Vec<Handler> = match self.handlers.read() {
            Ok(handlers) => {
                let specific = handlers.get(kind).into_iter().flatten();
                let wildcard = if kind == ALL {
                    None
                } else {
                    handlers.get(ALL)
                };
                specific
                    .chain(wildcard.into_iter().flatten())
                    .cloned()
                    .collect()
            }
            Err(_) => {
                error!("handler registry poisoned, dropping message");
                return;
            }
        };

        debug!(kind, handlers = targets.len(), "dispatching message");
        for handler in targets {
            match panic::catch_unwind(AssertUnwindSafe(|| handler(message))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(kind, error = %e, "message handler failed"),
                Err(_) => error!(kind, "message handler panicked"),
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kinds: Vec<String> = self
            .handlers
            .read()
            .map(|handlers| handlers.keys().cloned().collect())
            .unwrap_or_default();
        f.debug_struct("Dispatcher").field("kinds", &kinds).finish()
    }
}
