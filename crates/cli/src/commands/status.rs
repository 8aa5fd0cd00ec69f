// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Local sync state and the server's sync status.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;

use serde::Serialize;
use serde_json::Value;

use crate::cli::OutputFormat;
use crate::config::Config;
use crate::error::Result;
use crate::sync::{SyncApi, SyncService};

use super::{format_timestamp, open_service};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusReport {
    base_url: String,
    pending: BTreeMap<String, usize>,
    last_sync: BTreeMap<String, Option<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    server: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    server_error: Option<String>,
}

pub async fn run(config: &Config, offline: bool, format: OutputFormat) -> Result<()> {
    let service = open_service(config)?;
    run_impl(
        &service,
        &config.base_url,
        offline,
        format,
        &mut std::io::stdout(),
    )
    .await
}

/// An unreachable server is reported, not treated as a failure.
pub(crate) async fn run_impl<A: SyncApi>(
    service: &SyncService<A>,
    base_url: &str,
    offline: bool,
    format: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    let watermarks = service.last_sync_timestamps()?;
    let entities: BTreeSet<String> = service
        .entity_types()
        .iter()
        .cloned()
        .chain(watermarks.keys().cloned())
        .collect();
    let last_sync = entities
        .into_iter()
        .map(|entity| {
            let ts = watermarks.get(&entity).copied();
            (entity, ts)
        })
        .collect();

    let (server, server_error) = if offline {
        (None, None)
    } else {
        match service.sync_status().await {
            Ok(status) => (Some(status), None),
            Err(e) => (None, Some(e.to_string())),
        }
    };

    let report = StatusReport {
        base_url: base_url.to_string(),
        pending: service.pending_by_entity(),
        last_sync,
        server,
        server_error,
    };

    match format {
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?,
        OutputFormat::Text => write_text(&report, out)?,
    }
    Ok(())
}

fn write_text(report: &StatusReport, out: &mut impl Write) -> Result<()> {
    writeln!(out, "Server: {}", report.base_url)?;

    let total: usize = report.pending.values().sum();
    writeln!(out, "Pending updates: {}", total)?;
    for (entity, count) in &report.pending {
        writeln!(out, "  {}: {}", entity, count)?;
    }

    writeln!(out, "Last sync:")?;
    for (entity, ts) in &report.last_sync {
        match ts {
            Some(ts) => writeln!(out, "  {}: {}", entity, format_timestamp(*ts))?,
            None => writeln!(out, "  {}: never", entity)?,
        }
    }

    if let Some(server) = &report.server {
        writeln!(out, "Server status: {}", server)?;
    }
    if let Some(error) = &report.server_error {
        writeln!(out, "Server status: unavailable ({})", error)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
