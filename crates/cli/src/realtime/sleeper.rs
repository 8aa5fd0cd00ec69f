// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Timer capability for reconnect delays.
//!
//! Reconnect scheduling waits through a [`Sleeper`] so tests can replace real
//! time with a recorder that completes immediately.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Something that can wait for a duration.
pub trait Sleeper: Send + Sync + 'static {
    fn sleep(&self, delay: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + 'static>>;
}

/// Real time, backed by `tokio::time::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, delay: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + 'static>> {
        Box::pin(tokio::time::sleep(delay))
    }
}
