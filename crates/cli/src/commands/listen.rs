// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Long-running listener: prints server events and syncs in the background
//! until interrupted or the connection fails for good.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use eco_core::{Message, Severity};
use tracing::info;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::realtime::{handler, ConnectionState, SharedConnectionState, ALL};
use crate::session::EcoSession;

const STATE_POLL_INTERVAL: Duration = Duration::from_millis(250);

pub async fn run(config: &Config, entities: Option<Vec<String>>, no_sync: bool) -> Result<()> {
    let mut config = config.clone();
    if let Some(entities) = entities {
        config.entities = entities;
    }

    let mut session = EcoSession::init(&config)?;
    session.realtime().on(
        ALL,
        handler(|msg: &Message| {
            println!("{}", format_event(msg));
            Ok(())
        }),
    );

    session.connect().await?;
    info!(
        subscriptions = ?session.realtime().subscriptions(),
        "listening for server events"
    );
    if !no_sync {
        session.start_auto_sync();
    }

    let outcome = wait_for_exit(session.realtime().shared_state(), tokio::signal::ctrl_c()).await;
    session.dispose(false).await?;
    outcome
}

/// Resolves when `shutdown` completes or the connection enters the error
/// state, whichever comes first.
pub(crate) async fn wait_for_exit<F>(state: Arc<SharedConnectionState>, shutdown: F) -> Result<()>
where
    F: Future<Output = std::io::Result<()>>,
{
    tokio::pin!(shutdown);
    let mut ticker = tokio::time::interval(STATE_POLL_INTERVAL);

    loop {
        tokio::select! {
            signal = &mut shutdown => {
                signal?;
                info!("interrupted, shutting down");
                return Ok(());
            }
            _ = ticker.tick() => {
                if state.get() == ConnectionState::Error {
                    let reason = state
                        .last_error()
                        .unwrap_or_else(|| "unknown error".to_string());
                    return Err(Error::ConnectionLost(reason));
                }
            }
        }
    }
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Info => "info",
        Severity::Warning => "warning",
        Severity::Error => "error",
        Severity::Success => "success",
    }
}

/// One-line rendering of an inbound event.
pub(crate) fn format_event(msg: &Message) -> String {
    match msg {
        Message::Sync(event) => {
            let count = event.changes.len();
            format!(
                "[sync] {} {} ({} change{})",
                event.entity_type,
                event.change_type,
                count,
                if count == 1 { "" } else { "s" }
            )
        }
        Message::Notification(note) => format!(
            "[notification:{}] {}: {}",
            severity_label(note.severity),
            note.title,
            note.message
        ),
        Message::Other { kind, payload } => format!("[{}] {}", kind, payload),
    }
}

#[cfg(test)]
#[path = "listen_tests.rs"]
mod tests;
