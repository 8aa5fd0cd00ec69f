// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for the transport module, and the mock transport shared by the
//! realtime client tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use eco_core::ClientMessage;
use tokio::sync::mpsc;
use yare::parameterized;

use super::transport::{
    Endpoint, Transport, TransportError, TransportEvent, TransportFuture, TransportResult,
};

#[derive(Default)]
struct Recorded {
    connect_results: VecDeque<TransportResult<()>>,
    urls: Vec<String>,
    sent: Vec<ClientMessage>,
    closes: Vec<u16>,
    severed: bool,
}

/// Mock transport for testing without real sockets.
///
/// Inbound events are injected through the paired [`MockRemote`].
pub struct MockTransport {
    endpoint: Endpoint,
    connected: bool,
    recorded: Arc<Mutex<Recorded>>,
    events: mpsc::UnboundedReceiver<TransportEvent>,
}

/// Test-side handle controlling a [`MockTransport`].
#[derive(Clone)]
pub struct MockRemote {
    recorded: Arc<Mutex<Recorded>>,
    events: mpsc::UnboundedSender<TransportEvent>,
}

/// Creates a connected pair of mock transport and remote.
pub fn mock_transport(endpoint: Endpoint) -> (MockTransport, MockRemote) {
    let recorded = Arc::new(Mutex::new(Recorded::default()));
    let (tx, rx) = mpsc::unbounded_channel();
    (
        MockTransport {
            endpoint,
            connected: false,
            recorded: Arc::clone(&recorded),
            events: rx,
        },
        MockRemote {
            recorded,
            events: tx,
        },
    )
}

impl MockRemote {
    /// The next `n` connects fail with a connection error.
    pub fn fail_next_connects(&self, n: usize) {
        let mut recorded = self.recorded.lock().unwrap();
        for _ in 0..n {
            recorded
                .connect_results
                .push_back(Err(TransportError::ConnectionFailed("refused".into())));
        }
    }

    /// The next connect is rejected as unauthorized.
    pub fn reject_next_connect(&self) {
        self.recorded
            .lock()
            .unwrap()
            .connect_results
            .push_back(Err(TransportError::Unauthorized("HTTP 401".into())));
    }

    pub fn push_frame(&self, frame: &str) {
        self.events
            .send(TransportEvent::Frame(frame.to_string()))
            .unwrap();
    }

    pub fn close(&self, code: Option<u16>) {
        self.events
            .send(TransportEvent::Closed {
                code,
                reason: "remote closed".into(),
            })
            .unwrap();
    }

    /// Marks the channel closed without delivering a close event.
    pub fn sever(&self) {
        self.recorded.lock().unwrap().severed = true;
    }

    pub fn urls(&self) -> Vec<String> {
        self.recorded.lock().unwrap().urls.clone()
    }

    pub fn connect_count(&self) -> usize {
        self.recorded.lock().unwrap().urls.len()
    }

    pub fn sent(&self) -> Vec<ClientMessage> {
        self.recorded.lock().unwrap().sent.clone()
    }

    pub fn closes(&self) -> Vec<u16> {
        self.recorded.lock().unwrap().closes.clone()
    }
}

impl Transport for MockTransport {
    fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    fn connect<'a>(&'a mut self, url: &'a str) -> TransportFuture<'a, ()> {
        Box::pin(async move {
            let result = {
                let mut recorded = self.recorded.lock().unwrap();
                recorded.urls.push(url.to_string());
                recorded.connect_results.pop_front().unwrap_or(Ok(()))
            };
            self.connected = result.is_ok();
            result
        })
    }

    fn disconnect(&mut self, code: u16) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            if self.connected {
                self.recorded.lock().unwrap().closes.push(code);
            }
            self.connected = false;
            Ok(())
        })
    }

    fn send(&mut self, msg: ClientMessage) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            if !self.endpoint.supports_send() {
                return Err(TransportError::Unsupported("sse"));
            }
            if !self.connected {
                return Err(TransportError::ConnectionClosed);
            }
            self.recorded.lock().unwrap().sent.push(msg);
            Ok(())
        })
    }

    fn recv(&mut self) -> TransportFuture<'_, TransportEvent> {
        Box::pin(async move {
            let event = self.events.recv().await.unwrap_or(TransportEvent::Closed {
                code: None,
                reason: "remote dropped".into(),
            });
            if matches!(event, TransportEvent::Closed { .. }) {
                self.connected = false;
            }
            Ok(event)
        })
    }

    fn is_connected(&self) -> bool {
        self.connected && !self.recorded.lock().unwrap().severed
    }
}

// Endpoint URL building

#[parameterized(
    ws_from_http = { Endpoint::WebSocket, "http://api.example.com", "ws://api.example.com/ws?token=t" },
    wss_from_https = { Endpoint::WebSocket, "https://api.example.com/", "wss://api.example.com/ws?token=t" },
    ws_keeps_prefix = { Endpoint::WebSocket, "https://example.com/api", "wss://example.com/api/ws?token=t" },
    sse_keeps_scheme = { Endpoint::Sse, "https://example.com/api/", "https://example.com/api/sse?token=t" },
)]
fn endpoint_url(endpoint: Endpoint, base: &str, expected: &str) {
    assert_eq!(endpoint.url(base, "t", &[]).unwrap(), expected);
}

#[test]
fn endpoint_url_carries_entities() {
    let entities = vec!["orders".to_string(), "products".to_string()];
    let url = Endpoint::WebSocket
        .url("http://localhost:5000", "abc", &entities)
        .unwrap();
    assert_eq!(
        url,
        "ws://localhost:5000/ws?token=abc&entities=orders%2Cproducts"
    );
}

#[test]
fn endpoint_url_encodes_token() {
    let url = Endpoint::Sse
        .url("http://localhost:5000", "a b&c", &[])
        .unwrap();
    assert_eq!(url, "http://localhost:5000/sse?token=a+b%26c");
}

#[parameterized(
    not_a_url = { "localhost:5000" },
    ftp = { "ftp://example.com" },
)]
fn endpoint_url_rejects_bad_base(base: &str) {
    let err = Endpoint::WebSocket.url(base, "t", &[]).unwrap_err();
    assert!(matches!(err, TransportError::InvalidUrl(_)));
}

#[test]
fn only_websocket_supports_send() {
    assert!(Endpoint::WebSocket.supports_send());
    assert!(!Endpoint::Sse.supports_send());
}

#[tokio::test]
async fn sse_transport_refuses_to_send() {
    let mut transport = super::transport::SseTransport::new(reqwest::Client::new());
    let err = transport
        .send(ClientMessage::subscribe(vec!["orders".into()]))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Unsupported("sse")));
    assert!(!transport.is_connected());
}

#[tokio::test]
async fn websocket_transport_starts_disconnected() {
    let mut transport = super::transport::WebSocketTransport::new();
    assert!(!transport.is_connected());
    let err = transport
        .send(ClientMessage::subscribe(vec![]))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::ConnectionClosed));
    // Closing a transport that never opened is a no-op
    transport.disconnect(1000).await.unwrap();
}
