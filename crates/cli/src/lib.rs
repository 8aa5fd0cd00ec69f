// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! ecosync - Realtime and offline-first sync client for the EcoChain backend.
//!
//! This crate provides the client side of EcoChain synchronization: a
//! realtime connection that receives server pushes, and a poll-based sync
//! service that queues local changes while offline and reconciles them on
//! the next sync.
//!
//! # Main Components
//!
//! - [`RealtimeClient`](realtime::RealtimeClient) - WebSocket/SSE connection with reconnect
//! - [`SyncService`](sync::SyncService) - pending-update queue, push/pull and sync passes
//! - [`EcoSession`] - owns one of each over a shared store
//! - [`Config`] - TOML configuration with environment overrides
//! - [`Error`] - Error types for all operations
//!
//! ```rust,ignore
//! use ecosync::{Config, EcoSession};
//!
//! let config = Config::load(None)?;
//! let mut session = EcoSession::init(&config)?;
//! session.connect().await?;
//! session.start_auto_sync();
//! // ...
//! session.dispose(false).await?;
//! ```

mod cli;
mod commands;
pub mod config;
pub mod env;
pub mod error;
pub mod logging;
pub mod realtime;
pub mod session;
pub mod sync;

pub use cli::{Cli, Command, EntityArgs, OutputFormat};
pub use config::{Config, TransportKind};
pub use error::{Error, Result};
pub use session::EcoSession;

/// Execute a parsed command line. This is the main entry point for library
/// users and provides a testable way to run commands without process
/// execution.
pub fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    logging::setup_logging(cli.verbose, config.log_file.as_deref());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(execute(cli.command, &config))
}

async fn execute(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::Listen { entities, no_sync } => {
            commands::listen::run(config, entities.selected(), no_sync).await
        }
        Command::Sync { entities, output } => {
            commands::sync::run(config, entities.selected(), output).await
        }
        Command::Queue {
            entity,
            operation,
            data,
        } => commands::queue::run(config, &entity, operation, &data),
        Command::Pending { entity, output } => {
            commands::pending::run(config, entity.as_deref(), output)
        }
        Command::Status { offline, output } => commands::status::run(config, offline, output).await,
        Command::Clear => commands::clear::run(config),
    }
}
