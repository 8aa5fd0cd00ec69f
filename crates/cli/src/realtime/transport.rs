// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Transport abstraction for realtime communication.
//!
//! Provides a trait-based transport layer with two production variants:
//! - [`WebSocketTransport`]: bidirectional, subscriptions can be sent in-band
//! - [`SseTransport`]: server-sent events, receive only
//!
//! Mock transports implement the same trait for unit testing.

use std::future::Future;
use std::pin::Pin;

use eco_core::ClientMessage;
use futures_util::stream::Stream;
use reqwest::Url;

use super::sse::SseDecoder;

/// Close code for a normal closure.
pub const NORMAL_CLOSURE: u16 = 1000;
/// Close code the server uses to reject authentication (policy violation).
pub const AUTH_FAILURE_CLOSE_CODE: u16 = 1008;

/// Error type for transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Server refused the credentials.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Connection closed unexpectedly.
    #[error("connection closed")]
    ConnectionClosed,

    /// Send failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Receive failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// The connection URL could not be built.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// The transport cannot send messages.
    #[error("{0} transport does not support sending")]
    Unsupported(&'static str),
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Boxed future returned by transport operations.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = TransportResult<T>> + Send + 'a>>;

/// Something the transport observed on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// A text frame (WebSocket message or SSE `data`).
    Frame(String),
    /// The connection ended. `code` is `None` for abnormal closure.
    Closed { code: Option<u16>, reason: String },
}

/// Server endpoint a transport connects to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    WebSocket,
    Sse,
}

impl Endpoint {
    /// Path segment appended to the base URL.
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::WebSocket => "ws",
            Endpoint::Sse => "sse",
        }
    }

    /// Whether subscriptions can be updated without reconnecting.
    pub fn supports_send(&self) -> bool {
        matches!(self, Endpoint::WebSocket)
    }

    /// Builds the connection URL: `<base>/<path>?token=..&entities=a,b`.
    ///
    /// The token travels in the query string because neither WebSocket nor
    /// EventSource handshakes can carry custom headers.
    pub fn url(&self, base: &str, token: &str, entities: &[String]) -> TransportResult<String> {
        let mut url = Url::parse(base).map_err(|e| TransportError::InvalidUrl(e.to_string()))?;

        if *self == Endpoint::WebSocket {
            let scheme = match url.scheme() {
                "http" | "ws" => "ws",
                "https" | "wss" => "wss",
                other => {
                    return Err(TransportError::InvalidUrl(format!(
                        "unsupported scheme '{}'",
                        other
                    )))
                }
            };
            url.set_scheme(scheme)
                .map_err(|_| TransportError::InvalidUrl(format!("cannot use scheme {}", scheme)))?;
        }

        let path = format!("{}/{}", url.path().trim_end_matches('/'), self.path());
        url.set_path(&path);
        url.set_query(None);
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("token", token);
            if !entities.is_empty() {
                query.append_pair("entities", &entities.join(","));
            }
        }

        Ok(url.to_string())
    }
}

/// Transport trait for realtime communication.
///
/// This trait abstracts over the actual transport mechanism, allowing
/// for easy testing with mock implementations.
pub trait Transport: Send {
    /// Which endpoint this transport talks to.
    fn endpoint(&self) -> Endpoint;

    /// Connect to a remote server.
    fn connect<'a>(&'a mut self, url: &'a str) -> TransportFuture<'a, ()>;

    /// Close the connection with the given close code.
    fn disconnect(&mut self, code: u16) -> TransportFuture<'_, ()>;

    /// Send a message to the server.
    fn send(&mut self, msg: ClientMessage) -> TransportFuture<'_, ()>;

    /// Wait for the next frame or the end of the connection.
    fn recv(&mut self) -> TransportFuture<'_, TransportEvent>;

    /// Check if the underlying connection is open.
    fn is_connected(&self) -> bool;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn endpoint(&self) -> Endpoint {
        (**self).endpoint()
    }

    fn connect<'a>(&'a mut self, url: &'a str) -> TransportFuture<'a, ()> {
        (**self).connect(url)
    }

    fn disconnect(&mut self, code: u16) -> TransportFuture<'_, ()> {
        (**self).disconnect(code)
    }

    fn send(&mut self, msg: ClientMessage) -> TransportFuture<'_, ()> {
        (**self).send(msg)
    }

    fn recv(&mut self) -> TransportFuture<'_, TransportEvent> {
        (**self).recv()
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }
}

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// WebSocket transport implementation using tokio-tungstenite.
pub struct WebSocketTransport {
    /// The WebSocket connection, if connected.
    ws: Option<WebSocketConnection>,
}

/// Internal WebSocket connection wrapper.
struct WebSocketConnection {
    sink: futures_util::stream::SplitSink<WsStream, tokio_tungstenite::tungstenite::Message>,
    stream: futures_util::stream::SplitStream<WsStream>,
}

impl WebSocketTransport {
    /// Create a new WebSocket transport.
    pub fn new() -> Self {
        WebSocketTransport { ws: None }
    }
}

impl Default for WebSocketTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for WebSocketTransport {
    fn endpoint(&self) -> Endpoint {
        Endpoint::WebSocket
    }

    fn connect<'a>(&'a mut self, url: &'a str) -> TransportFuture<'a, ()> {
        Box::pin(async move {
            use futures_util::StreamExt;
            use tokio_tungstenite::tungstenite::Error as WsError;

            let ws_stream = match tokio_tungstenite::connect_async(url).await {
                Ok((ws_stream, _)) => ws_stream,
                Err(WsError::Http(response))
                    if matches!(response.status().as_u16(), 401 | 403) =>
                {
                    return Err(TransportError::Unauthorized(format!(
                        "handshake rejected with HTTP {}",
                        response.status()
                    )));
                }
                Err(e) => return Err(TransportError::ConnectionFailed(e.to_string())),
            };

            let (sink, stream) = ws_stream.split();
            self.ws = Some(WebSocketConnection { sink, stream });
            Ok(())
        })
    }

    fn disconnect(&mut self, code: u16) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            use futures_util::SinkExt;
            use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
            use tokio_tungstenite::tungstenite::protocol::CloseFrame;
            use tokio_tungstenite::tungstenite::Message;

            if let Some(mut ws) = self.ws.take() {
                let frame = CloseFrame {
                    code: CloseCode::from(code),
                    reason: String::new().into(),
                };
                // The peer may already be gone; closing is best effort
                let _ = ws.sink.send(Message::Close(Some(frame))).await;
                let _ = ws.sink.close().await;
            }
            Ok(())
        })
    }

    fn send(&mut self, msg: ClientMessage) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            use futures_util::SinkExt;
            use tokio_tungstenite::tungstenite::Message;

            let ws = self.ws.as_mut().ok_or(TransportError::ConnectionClosed)?;

            let json = msg
                .to_json()
                .map_err(|e| TransportError::SerializationError(e.to_string()))?;

            if let Err(e) = ws.sink.send(Message::Text(json.into())).await {
                // Connection is broken, clear it
                self.ws = None;
                return Err(TransportError::SendFailed(e.to_string()));
            }

            Ok(())
        })
    }

    fn recv(&mut self) -> TransportFuture<'_, TransportEvent> {
        Box::pin(async move {
            use futures_util::StreamExt;
            use tokio_tungstenite::tungstenite::Message;

            let ws = self.ws.as_mut().ok_or(TransportError::ConnectionClosed)?;

            loop {
                match ws.stream.next().await {
                    Some(Ok(Message::Text(text))) => {
                        let frame: &str = &text;
                        return Ok(TransportEvent::Frame(frame.to_owned()));
                    }
                    Some(Ok(Message::Close(frame))) => {
                        self.ws = None;
                        let (code, reason) = match frame {
                            Some(frame) => (Some(u16::from(frame.code)), (*frame.reason).to_owned()),
                            None => (None, String::new()),
                        };
                        return Ok(TransportEvent::Closed { code, reason });
                    }
                    Some(Ok(_)) => {
                        // Ping/pong are answered by tungstenite; binary frames are not part of the protocol
                        continue;
                    }
                    Some(Err(e)) => {
                        self.ws = None;
                        return Err(TransportError::ReceiveFailed(e.to_string()));
                    }
                    None => {
                        self.ws = None;
                        return Ok(TransportEvent::Closed {
                            code: None,
                            reason: "stream ended".to_string(),
                        });
                    }
                }
            }
        })
    }

    fn is_connected(&self) -> bool {
        self.ws.is_some()
    }
}

type ByteStream = Pin<Box<dyn Stream<Item = reqwest::Result<Vec<u8>>> + Send>>;

/// Server-sent events transport using a streaming reqwest response.
pub struct SseTransport {
    http: reqwest::Client,
    conn: Option<SseConnection>,
}

struct SseConnection {
    stream: ByteStream,
    decoder: SseDecoder,
}

impl SseTransport {
    /// Create a new SSE transport.
    ///
    /// The client must not carry a total request timeout: the event stream
    /// stays open for the lifetime of the connection.
    pub fn new(http: reqwest::Client) -> Self {
        SseTransport { http, conn: None }
    }
}

impl Transport for SseTransport {
    fn endpoint(&self) -> Endpoint {
        Endpoint::Sse
    }

    fn connect<'a>(&'a mut self, url: &'a str) -> TransportFuture<'a, ()> {
        Box::pin(async move {
            use futures_util::StreamExt;
            use reqwest::header::{ACCEPT, CACHE_CONTROL};
            use reqwest::StatusCode;

            let response = self
                .http
                .get(url)
                .header(ACCEPT, "text/event-stream")
                .header(CACHE_CONTROL, "no-cache")
                .send()
                .await
                .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

            let status = response.status();
            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                return Err(TransportError::Unauthorized(format!(
                    "event stream rejected with HTTP {}",
                    status
                )));
            }
            if !status.is_success() {
                return Err(TransportError::ConnectionFailed(format!(
                    "event stream returned HTTP {}",
                    status
                )));
            }

            let stream = response
                .bytes_stream()
                .map(|chunk| chunk.map(|bytes| bytes.to_vec()));
            self.conn = Some(SseConnection {
                stream: Box::pin(stream),
                decoder: SseDecoder::new(),
            });
            Ok(())
        })
    }

    fn disconnect(&mut self, _code: u16) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            // Dropping the response body closes the HTTP connection
            self.conn = None;
            Ok(())
        })
    }

    fn send(&mut self, _msg: ClientMessage) -> TransportFuture<'_, ()> {
        Box::pin(async move { Err(TransportError::Unsupported("sse")) })
    }

    fn recv(&mut self) -> TransportFuture<'_, TransportEvent> {
        Box::pin(async move {
            use futures_util::StreamExt;

            let conn = self.conn.as_mut().ok_or(TransportError::ConnectionClosed)?;

            loop {
                if let Some(event) = conn.decoder.next_event() {
                    return Ok(TransportEvent::Frame(event.data));
                }

                match conn.stream.next().await {
                    Some(Ok(chunk)) => conn.decoder.push(&chunk),
                    Some(Err(e)) => {
                        self.conn = None;
                        return Err(TransportError::ReceiveFailed(e.to_string()));
                    }
                    None => {
                        self.conn = None;
                        return Ok(TransportEvent::Closed {
                            code: None,
                            reason: "event stream ended".to_string(),
                        });
                    }
                }
            }
        })
    }

    fn is_connected(&self) -> bool {
        self.conn.is_some()
    }
}
