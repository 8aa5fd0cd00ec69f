// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Reconnection state machine.
//!
//! ```text
//!   Idle ──connect──► Connecting ──open──► Connected
//!                        ▲  │                  │
//!                        │  └──give up──► Idle │
//!                        └──unexpected close───┘
//! ```
//!
//! The controller only decides; the realtime session task performs the
//! waiting and the connecting.

use std::time::Duration;

use eco_core::Backoff;
use tokio_util::sync::CancellationToken;

use super::transport::AUTH_FAILURE_CLOSE_CODE;

/// Reconnect state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectState {
    Idle,
    Connecting,
    Connected,
}

/// What to do after a failed or dropped connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseDecision {
    /// Wait `delay`, then try again.
    Retry { attempt: u32, delay: Duration },
    /// The attempt budget is spent.
    GiveUp { attempts: u32 },
    /// The server rejected our credentials; retrying cannot help.
    Fatal,
    /// Reconnection was stopped by a manual disconnect.
    Stopped,
}

/// Tracks attempts and the single pending reconnect timer.
#[derive(Debug)]
pub struct ReconnectController {
    backoff: Backoff,
    state: ReconnectState,
    attempts: u32,
    timer: Option<CancellationToken>,
    stopped: bool,
}

impl ReconnectController {
    pub fn new(backoff: Backoff) -> Self {
        ReconnectController {
            backoff,
            state: ReconnectState::Idle,
            attempts: 0,
            timer: None,
            stopped: false,
        }
    }

    pub fn state(&self) -> ReconnectState {
        self.state
    }

    /// Failed attempts since the last successful open.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn has_pending_timer(&self) -> bool {
        self.timer.as_ref().is_some_and(|t| !t.is_cancelled())
    }

    /// Marks the start of a connection attempt.
    pub fn begin_connect(&mut self) {
        if !self.stopped {
            self.state = ReconnectState::Connecting;
        }
    }

    /// A connection opened: the attempt counter starts over.
    pub fn on_open(&mut self) {
        self.cancel_timer();
        self.attempts = 0;
        self.state = ReconnectState::Connected;
    }

    /// Decides how to react to a failed attempt or a dropped connection.
    ///
    /// `close_code` is the close code reported by the transport, if any.
    pub fn on_failure(&mut self, close_code: Option<u16>) -> CloseDecision {
        if self.stopped {
            self.state = ReconnectState::Idle;
            return CloseDecision::Stopped;
        }

        if close_code == Some(AUTH_FAILURE_CLOSE_CODE) {
            self.cancel_timer();
            self.state = ReconnectState::Idle;
            return CloseDecision::Fatal;
        }

        self.attempts = self.attempts.saturating_add(1);
        match self.backoff.delay_for(self.attempts) {
            Some(delay) => {
                self.state = ReconnectState::Connecting;
                CloseDecision::Retry {
                    attempt: self.attempts,
                    delay,
                }
            }
            None => {
                self.cancel_timer();
                self.state = ReconnectState::Idle;
                CloseDecision::GiveUp {
                    attempts: self.attempts - 1,
                }
            }
        }
    }

    /// Arms the reconnect timer, cancelling any previous one.
    ///
    /// The returned token is a child of `parent`, so cancelling the session
    /// also fires it.
    pub fn schedule(&mut self, parent: &CancellationToken) -> CancellationToken {
        self.cancel_timer();
        let timer = parent.child_token();
        self.timer = Some(timer.clone());
        timer
    }

    /// Clears the pending timer, if any.
    pub fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
    }

    /// Manual disconnect: no further automatic reconnection.
    pub fn stop(&mut self) {
        self.stopped = true;
        self.cancel_timer();
        self.state = ReconnectState::Idle;
    }
}
