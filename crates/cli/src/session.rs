// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Composition root tying the realtime client to the sync service.
//!
//! One [`EcoSession`] owns one realtime connection and one sync service over
//! a shared store. While auto sync runs, every `sync` event received from the
//! server triggers a pull of that entity type alongside the periodic passes.

use std::sync::Arc;
use std::time::Duration;

use eco_core::{FileStore, KeyValueStore, Message};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{Config, TransportKind};
use crate::error::Result;
use crate::realtime::{
    handler, Handler, RealtimeClient, SseTransport, Transport, WebSocketTransport,
};
use crate::sync::{ApiError, HttpSyncApi, SyncApi, SyncService};

const SYNC_EVENT: &str = "sync";

struct AutoSync {
    cancel: CancellationToken,
    handler: Handler,
    task: JoinHandle<()>,
}

/// A realtime connection plus the sync service it feeds.
pub struct EcoSession<T = Box<dyn Transport>, A = HttpSyncApi>
where
    T: Transport + 'static,
    A: SyncApi + 'static,
{
    realtime: RealtimeClient<T>,
    sync: Arc<SyncService<A>>,
    interval: Duration,
    auto_sync: Option<AutoSync>,
}

impl EcoSession {
    /// Builds a session persisting to the configured state file.
    pub fn init(config: &Config) -> Result<Self> {
        let store = FileStore::open(&config.state_path()?)?;
        Self::init_with_store(config, Arc::new(store))
    }

    /// Builds a session over `store`. Nothing connects until
    /// [`connect`](EcoSession::connect) or a sync call.
    pub fn init_with_store(config: &Config, store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let transport: Box<dyn Transport> = match config.transport {
            TransportKind::WebSocket => Box::new(WebSocketTransport::new()),
            TransportKind::Sse => {
                // The event stream outlives any request timeout
                let stream_http = reqwest::Client::builder()
                    .build()
                    .map_err(ApiError::from)?;
                Box::new(SseTransport::new(stream_http))
            }
        };

        let realtime = RealtimeClient::new(config.realtime_config(), transport);
        realtime.subscribe(config.entity_types());

        let sync = sync_service(config, store)?;

        Ok(Self::with_parts(realtime, sync, config.sync_interval()))
    }
}

/// Builds the HTTP sync service for `config` over `store`.
pub fn sync_service(
    config: &Config,
    store: Arc<dyn KeyValueStore>,
) -> Result<SyncService<HttpSyncApi>> {
    let http = reqwest::Client::builder()
        .timeout(config.request_timeout())
        .build()
        .map_err(ApiError::from)?;
    let api = HttpSyncApi::new(&config.base_url, config.token.clone(), http)?;
    Ok(SyncService::open(api, store)?.with_entity_types(config.entity_types()))
}

impl<T, A> EcoSession<T, A>
where
    T: Transport + 'static,
    A: SyncApi + 'static,
{
    /// Assembles a session from ready-made parts.
    pub fn with_parts(realtime: RealtimeClient<T>, sync: SyncService<A>, interval: Duration) -> Self {
        EcoSession {
            realtime,
            sync: Arc::new(sync),
            interval,
            auto_sync: None,
        }
    }

    pub fn realtime(&self) -> &RealtimeClient<T> {
        &self.realtime
    }

    pub fn sync(&self) -> &Arc<SyncService<A>> {
        &self.sync
    }

    pub fn is_auto_syncing(&self) -> bool {
        self.auto_sync.is_some()
    }

    /// Opens the realtime connection.
    pub async fn connect(&mut self) -> Result<()> {
        self.realtime.connect().await?;
        Ok(())
    }

    /// Starts periodic sync and pull-on-push. Calling it twice is a no-op.
    pub fn start_auto_sync(&mut self) {
        if self.auto_sync.is_some() {
            return;
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let on_sync = handler(move |msg: &Message| {
            if let Some(entity_type) = msg.entity_type() {
                // Receiver gone means auto sync is shutting down
                let _ = tx.send(entity_type.to_string());
            }
            Ok(())
        });
        self.realtime.on(SYNC_EVENT, Arc::clone(&on_sync));

        let cancel = CancellationToken::new();
        let task = Arc::clone(&self.sync).spawn_auto_sync(self.interval, cancel.clone(), Some(rx));
        self.auto_sync = Some(AutoSync {
            cancel,
            handler: on_sync,
            task,
        });
    }

    /// Stops auto sync and waits for an in-flight pass to finish.
    pub async fn stop_auto_sync(&mut self) {
        let Some(auto) = self.auto_sync.take() else {
            return;
        };
        self.realtime.off(SYNC_EVENT, &auto.handler);
        auto.cancel.cancel();
        if let Err(e) = auto.task.await {
            warn!(error = %e, "auto sync task ended abnormally");
        }
    }

    /// Stops auto sync and disconnects. With `logout`, also wipes the
    /// pending queue, watermarks and snapshot.
    pub async fn dispose(&mut self, logout: bool) -> Result<()> {
        self.stop_auto_sync().await;
        self.realtime.disconnect().await;
        if logout {
            self.sync.clear_sync_data()?;
            info!("sync data cleared on logout");
        }
        Ok(())
    }
}

impl<T, A> Drop for EcoSession<T, A>
where
    T: Transport + 'static,
    A: SyncApi + 'static,
{
    fn drop(&mut self) {
        if let Some(auto) = &self.auto_sync {
            auto.cancel.cancel();
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
