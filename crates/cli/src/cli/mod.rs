// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

mod args;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use eco_core::Operation;

pub use args::EntityArgs;

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

/// Parse an update operation name.
fn operation(s: &str) -> Result<Operation, String> {
    s.parse::<Operation>().map_err(|e| e.to_string())
}

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "ecosync")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Realtime and offline-first sync client for the EcoChain backend")]
#[command(
    long_about = "Realtime and offline-first sync client for the EcoChain backend.\n\n\
    Listens for server pushes over WebSocket or SSE, queues local changes while offline \
    and reconciles them with the server on sync."
)]
pub struct Cli {
    /// Config file (default: <config dir>/ecosync/config.toml)
    #[arg(short, long, global = true, value_name = "path")]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Stay connected, print server events and sync in the background
    #[command(after_help = "\
Examples:
  ecosync listen                     Listen on the configured entity types
  ecosync listen -e orders,products  Listen on orders and products only")]
    Listen {
        #[command(flatten)]
        entities: EntityArgs,

        /// Do not run periodic sync while listening
        #[arg(long)]
        no_sync: bool,
    },

    /// Push pending updates and pull changes once
    Sync {
        #[command(flatten)]
        entities: EntityArgs,

        /// Output format
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Queue a local change for the next sync
    #[command(after_help = "\
Examples:
  ecosync queue orders create '{\"qty\": 2}'
  ecosync queue orders update '{\"_id\": \"o1\", \"qty\": 3}'
  ecosync queue users delete '{\"id\": 7}'")]
    Queue {
        /// Entity type (e.g. orders)
        #[arg(value_parser = non_empty_string)]
        entity: String,

        /// Operation: create, update or delete
        #[arg(value_parser = operation)]
        operation: Operation,

        /// Record as a JSON object
        data: String,
    },

    /// Show updates waiting to be pushed
    Pending {
        /// Only this entity type
        #[arg(value_parser = non_empty_string)]
        entity: Option<String>,

        /// Output format
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Show local sync state and the server's sync status
    Status {
        /// Skip the server status request
        #[arg(long)]
        offline: bool,

        /// Output format
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Delete pending updates, sync timestamps and the local snapshot
    Clear,
}

#[cfg(test)]
#[path = "../cli_tests/mod.rs"]
mod tests;
