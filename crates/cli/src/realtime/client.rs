// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Realtime client: one server connection with automatic reconnection.
//!
//! [`RealtimeClient::connect`] spawns a session task that owns the transport
//! for the lifetime of the connection. The task connects, pumps inbound
//! frames into the [`Dispatcher`], and on unexpected closure waits out the
//! backoff delay before reconnecting with the current subscription set.
//! [`RealtimeClient::disconnect`] cancels the task and reclaims the
//! transport, so the client can be connected again later.

use std::sync::{Arc, Mutex};

use eco_core::{Backoff, ClientMessage};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::dispatcher::{Dispatcher, Handler};
use super::reconnect::{CloseDecision, ReconnectController};
use super::sleeper::{Sleeper, TokioSleeper};
use super::state::{ConnectionState, SharedConnectionState};
use super::transport::{
    Transport, TransportError, TransportEvent, AUTH_FAILURE_CLOSE_CODE, NORMAL_CLOSURE,
};

/// Connection settings for the realtime client.
#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    /// HTTP(S) base URL of the backend.
    pub base_url: String,
    /// Bearer token, sent as the `token` query parameter.
    pub token: Option<String>,
    pub backoff: Backoff,
}

/// Error type for realtime client operations.
#[derive(Debug, thiserror::Error)]
pub enum RealtimeError {
    #[error("no authentication token (set ECOSYNC_TOKEN or `token` in the config file)")]
    MissingToken,

    #[error("server rejected authentication: {0}")]
    Unauthorized(String),

    #[error("gave up after {attempts} reconnect attempts: {last_error}")]
    MaxRetriesExceeded { attempts: u32, last_error: String },

    #[error("not connected to server")]
    NotConnected,

    /// The transport is held by a session that has not been reclaimed.
    #[error("transport unavailable")]
    TransportUnavailable,

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Result type for realtime client operations.
pub type RealtimeResult<T> = Result<T, RealtimeError>;

/// Requests from the client handle to the session task.
#[derive(Debug)]
enum Command {
    Resubscribe(Vec<String>),
}

struct SessionHandle<T> {
    cancel: CancellationToken,
    commands: mpsc::UnboundedSender<Command>,
    task: JoinHandle<T>,
}

/// Realtime connection to the EcoChain backend.
pub struct RealtimeClient<T: Transport + 'static, S: Sleeper = TokioSleeper> {
    config: RealtimeConfig,
    dispatcher: Arc<Dispatcher>,
    state: Arc<SharedConnectionState>,
    subscriptions: Arc<Mutex<Vec<String>>>,
    sleeper: Arc<S>,
    /// Parked transport while no session is running.
    transport: Option<T>,
    session: Option<SessionHandle<T>>,
}

impl<T: Transport + 'static> RealtimeClient<T, TokioSleeper> {
    pub fn new(config: RealtimeConfig, transport: T) -> Self {
        Self::with_sleeper(config, transport, TokioSleeper)
    }
}

impl<T: Transport + 'static, S: Sleeper> RealtimeClient<T, S> {
    /// Create a client with a custom timer (for testing).
    pub fn with_sleeper(config: RealtimeConfig, transport: T, sleeper: S) -> Self {
        RealtimeClient {
            config,
            dispatcher: Arc::new(Dispatcher::new()),
            state: Arc::new(SharedConnectionState::new()),
            subscriptions: Arc::new(Mutex::new(Vec::new())),
            sleeper: Arc::new(sleeper),
            transport: Some(transport),
            session: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state.get()
    }

    pub fn shared_state(&self) -> Arc<SharedConnectionState> {
        Arc::clone(&self.state)
    }

    pub fn status_string(&self) -> String {
        self.state.status_string()
    }

    pub fn last_error(&self) -> Option<String> {
        self.state.last_error()
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.dispatcher)
    }

    /// Current subscription set, in insertion order.
    pub fn subscriptions(&self) -> Vec<String> {
        self.subscriptions
            .lock()
            .map(|subs| subs.clone())
            .unwrap_or_default()
    }

    /// True when the client believes it is connected and the channel is open.
    pub fn is_connected_to_server(&self) -> bool {
        self.state.is_connected()
    }

    /// Registers a handler for a message type (or [`super::ALL`]).
    pub fn on(&self, kind: &str, handler: Handler) -> bool {
        self.dispatcher.on(kind, handler)
    }

    pub fn off(&self, kind: &str, handler: &Handler) -> bool {
        self.dispatcher.off(kind, handler)
    }

    /// Opens the connection.
    ///
    /// Resolves once the connection is open. Fails immediately without a
    /// token, on an authentication rejection, or once the reconnect budget
    /// is spent.
    pub async fn connect(&mut self) -> RealtimeResult<()> {
        if self.is_connected_to_server() {
            return Ok(());
        }
        if self.session.is_some() {
            self.shutdown_session().await;
        }

        let token = match self.config.token.as_deref() {
            Some(token) if !token.trim().is_empty() => token.to_string(),
            _ => {
                self.fail(RealtimeError::MissingToken.to_string());
                return Err(RealtimeError::MissingToken);
            }
        };

        let transport = self
            .transport
            .take()
            .ok_or(RealtimeError::TransportUnavailable)?;

        // Reject a bad base URL before spawning anything
        if let Err(e) = transport
            .endpoint()
            .url(&self.config.base_url, &token, &[])
        {
            self.transport = Some(transport);
            self.fail(e.to_string());
            return Err(e.into());
        }

        let cancel = CancellationToken::new();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = oneshot::channel();

        let session = Session {
            transport,
            base_url: self.config.base_url.clone(),
            token,
            controller: ReconnectController::new(self.config.backoff.clone()),
            dispatcher: Arc::clone(&self.dispatcher),
            state: Arc::clone(&self.state),
            subscriptions: Arc::clone(&self.subscriptions),
            sleeper: Arc::clone(&self.sleeper),
            cancel: cancel.clone(),
            commands: command_rx,
            ready: Some(ready_tx),
        };

        self.state.set_last_error(None);
        self.session = Some(SessionHandle {
            cancel,
            commands: command_tx,
            task: tokio::spawn(session.run()),
        });

        let result = ready_rx.await.unwrap_or(Err(RealtimeError::NotConnected));
        if result.is_err() {
            // The task has finished; take the transport back
            self.shutdown_session().await;
        }
        result
    }

    /// Closes the connection and stops reconnecting. Safe to call repeatedly.
    pub async fn disconnect(&mut self) {
        if self.session.is_some() {
            info!("disconnecting from realtime server");
            self.shutdown_session().await;
        }
        self.state.set(ConnectionState::Disconnected);
        self.state.set_live(false);
        self.state.set_attempt(0);
    }

    /// Adds entity types to the subscription set.
    ///
    /// Returns whether the set changed. A connected client forwards the new
    /// set to the server immediately.
    pub fn subscribe<I, E>(&self, entities: I) -> bool
    where
        I: IntoIterator<Item = E>,
        E: Into<String>,
    {
        let snapshot = {
            let Ok(mut subs) = self.subscriptions.lock() else {
                return false;
            };
            let before = subs.len();
            for entity in entities {
                let entity = entity.into();
                if !entity.is_empty() && !subs.contains(&entity) {
                    subs.push(entity);
                }
            }
            if subs.len() == before {
                return false;
            }
            subs.clone()
        };

        debug!(entities = ?snapshot, "subscription set changed");
        if self.is_connected_to_server() {
            if let Some(session) = &self.session {
                // A closed channel means the session already ended
                let _ = session.commands.send(Command::Resubscribe(snapshot));
            }
        }
        true
    }

    fn fail(&self, error: String) {
        self.state.set(ConnectionState::Error);
        self.state.set_live(false);
        self.state.set_last_error(Some(error));
    }

    async fn shutdown_session(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        session.cancel.cancel();
        match session.task.await {
            Ok(transport) => self.transport = Some(transport),
            Err(e) => error!(error = %e, "realtime session task failed"),
        }
    }
}

impl<T: Transport + 'static, S: Sleeper> Drop for RealtimeClient<T, S> {
    fn drop(&mut self) {
        if let Some(session) = &self.session {
            session.cancel.cancel();
        }
    }
}

/// Why a connection ended or failed to open.
struct Failure {
    code: Option<u16>,
    reason: String,
}

enum Attempt {
    Opened,
    Failed(Failure),
    Cancelled,
}

enum Pump {
    Closed(Failure),
    /// Reconnect right away with a new URL (SSE subscription change).
    Reopen,
    Cancelled,
}

enum Step {
    Cancelled,
    Command(Option<Command>),
    Event(Result<TransportEvent, TransportError>),
}

/// State owned by the session task.
struct Session<T, S> {
    transport: T,
    base_url: String,
    token: String,
    controller: ReconnectController,
    dispatcher: Arc<Dispatcher>,
    state: Arc<SharedConnectionState>,
    subscriptions: Arc<Mutex<Vec<String>>>,
    sleeper: Arc<S>,
    cancel: CancellationToken,
    commands: mpsc::UnboundedReceiver<Command>,
    ready: Option<oneshot::Sender<RealtimeResult<()>>>,
}

impl<T: Transport, S: Sleeper> Session<T, S> {
    async fn run(mut self) -> T {
        loop {
            let failure = match self.open().await {
                Attempt::Cancelled => break,
                Attempt::Failed(failure) => failure,
                Attempt::Opened => match self.pump().await {
                    Pump::Cancelled => break,
                    Pump::Reopen => continue,
                    Pump::Closed(failure) => {
                        self.state.set_live(false);
                        info!(code = ?failure.code, reason = %failure.reason, "connection closed");
                        failure
                    }
                },
            };

            if !self.recover(failure).await {
                break;
            }
        }

        self.controller.stop();
        if self.transport.is_connected() {
            if let Err(e) = self.transport.disconnect(NORMAL_CLOSURE).await {
                debug!(error = %e, "close handshake failed");
            }
        }
        self.state.set_live(false);
        if self.state.get() != ConnectionState::Error {
            self.state.set(ConnectionState::Disconnected);
        }
        self.transport
    }

    /// One connection attempt.
    async fn open(&mut self) -> Attempt {
        let entities = self
            .subscriptions
            .lock()
            .map(|subs| subs.clone())
            .unwrap_or_default();
        let endpoint = self.transport.endpoint();
        let url = match endpoint.url(&self.base_url, &self.token, &entities) {
            Ok(url) => url,
            Err(e) => {
                return Attempt::Failed(Failure {
                    code: None,
                    reason: e.to_string(),
                })
            }
        };

        self.controller.begin_connect();
        self.state.set(ConnectionState::Connecting);
        debug!(endpoint = endpoint.path(), base = %self.base_url, ?entities, "connecting");

        let result = tokio::select! {
            _ = self.cancel.cancelled() => return Attempt::Cancelled,
            result = self.transport.connect(&url) => result,
        };

        match result {
            Ok(()) => {
                self.controller.on_open();
                self.state.set_attempt(0);
                self.state.set_last_error(None);
                self.state.set_live(self.transport.is_connected());
                self.state.set(ConnectionState::Connected);
                info!(endpoint = endpoint.path(), "connected to realtime server");
                if let Some(ready) = self.ready.take() {
                    let _ = ready.send(Ok(()));
                }
                Attempt::Opened
            }
            Err(TransportError::Unauthorized(reason)) => Attempt::Failed(Failure {
                code: Some(AUTH_FAILURE_CLOSE_CODE),
                reason,
            }),
            Err(e) => Attempt::Failed(Failure {
                code: None,
                reason: e.to_string(),
            }),
        }
    }

    /// Reads frames until the connection ends or the session is cancelled.
    async fn pump(&mut self) -> Pump {
        loop {
            let step = tokio::select! {
                _ = self.cancel.cancelled() => Step::Cancelled,
                command = self.commands.recv() => Step::Command(command),
                event = self.transport.recv() => Step::Event(event),
            };

            match step {
                Step::Cancelled | Step::Command(None) => return Pump::Cancelled,
                Step::Command(Some(Command::Resubscribe(entities))) => {
                    if self.transport.endpoint().supports_send() {
                        debug!(?entities, "sending subscription update");
                        if let Err(e) = self
                            .transport
                            .send(ClientMessage::subscribe(entities))
                            .await
                        {
                            return Pump::Closed(Failure {
                                code: None,
                                reason: e.to_string(),
                            });
                        }
                    } else {
                        info!(?entities, "reopening event stream for new subscriptions");
                        if let Err(e) = self.transport.disconnect(NORMAL_CLOSURE).await {
                            debug!(error = %e, "close before reopen failed");
                        }
                        return Pump::Reopen;
                    }
                }
                Step::Event(Ok(TransportEvent::Frame(frame))) => {
                    debug!(len = frame.len(), "frame received");
                    self.dispatcher.dispatch_frame(&frame);
                }
                Step::Event(Ok(TransportEvent::Closed { code, reason })) => {
                    return Pump::Closed(Failure { code, reason });
                }
                Step::Event(Err(e)) => {
                    return Pump::Closed(Failure {
                        code: None,
                        reason: e.to_string(),
                    });
                }
            }
            self.state.set_live(self.transport.is_connected());
        }
    }

    /// Applies the reconnect policy. Returns false when the session should end.
    async fn recover(&mut self, failure: Failure) -> bool {
        match self.controller.on_failure(failure.code) {
            CloseDecision::Retry { attempt, delay } => {
                warn!(attempt, ?delay, reason = %failure.reason, "reconnecting");
                self.state.set(ConnectionState::Connecting);
                self.state.set_attempt(attempt);
                self.state.set_last_error(Some(failure.reason));

                let timer = self.controller.schedule(&self.cancel);
                let sleep = self.sleeper.sleep(delay);
                tokio::select! {
                    _ = timer.cancelled() => return false,
                    _ = sleep => {}
                }
                self.controller.cancel_timer();
                true
            }
            CloseDecision::GiveUp { attempts } => {
                error!(attempts, reason = %failure.reason, "giving up on realtime connection");
                self.finish(RealtimeError::MaxRetriesExceeded {
                    attempts,
                    last_error: failure.reason,
                });
                false
            }
            CloseDecision::Fatal => {
                error!(reason = %failure.reason, "authentication rejected, not reconnecting");
                self.finish(RealtimeError::Unauthorized(failure.reason));
                false
            }
            CloseDecision::Stopped => false,
        }
    }

    fn finish(&mut self, error: RealtimeError) {
        self.state.set(ConnectionState::Error);
        self.state.set_live(false);
        self.state.set_attempt(0);
        self.state.set_last_error(Some(error.to_string()));
        if let Some(ready) = self.ready.take() {
            let _ = ready.send(Err(error));
        }
    }
}
