// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Realtime connection to the EcoChain backend.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ RealtimeClient │────►│  Transport  │────►│   Backend   │
//! │  (handle)      │◄────│ (ws | sse)  │◄────│  /ws  /sse  │
//! └────────────────┘     └─────────────┘     └─────────────┘
//!        │ session task
//!        ├──► ReconnectController (backoff, one pending timer)
//!        └──► Dispatcher (type handlers, then "all" handlers)
//! ```
//!
//! # Features
//!
//! - WebSocket and SSE transports behind one [`Transport`] trait
//! - Token and subscription set carried in the connection URL
//! - Automatic reconnect with bounded exponential backoff
//! - Close code 1008 (or HTTP 401/403) is treated as fatal
//! - Injectable transport and timer for testing

mod client;
mod dispatcher;
mod reconnect;
mod sleeper;
mod sse;
mod state;
mod transport;

pub use client::{RealtimeClient, RealtimeConfig, RealtimeError, RealtimeResult};
pub use dispatcher::{handler, Dispatcher, Handler, HandlerError, ALL};
pub use reconnect::{CloseDecision, ReconnectController, ReconnectState};
pub use sleeper::{Sleeper, TokioSleeper};
pub use sse::{SseDecoder, SseEvent};
pub use state::{ConnectionState, SharedConnectionState};
pub use transport::{
    Endpoint, SseTransport, Transport, TransportError, TransportEvent, TransportFuture,
    TransportResult, WebSocketTransport, AUTH_FAILURE_CLOSE_CODE, NORMAL_CLOSURE,
};


#[cfg(test)]
mod dispatcher_tests;




#[cfg(test)]
pub(crate) mod transport_tests;
