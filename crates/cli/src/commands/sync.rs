// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use crate::cli::OutputFormat;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::sync::{SyncApi, SyncOptions, SyncReport, SyncService};

use super::{format_timestamp, open_service};

pub async fn run(config: &Config, entities: Option<Vec<String>>, format: OutputFormat) -> Result<()> {
    let service = open_service(config)?;
    run_impl(&service, entities, format, &mut std::io::stdout()).await
}

/// Runs one sync pass and prints the report. A pass with any entity
/// failure still prints every entity, then returns an error.
pub(crate) async fn run_impl<A: SyncApi>(
    service: &SyncService<A>,
    entities: Option<Vec<String>>,
    format: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    let options = SyncOptions {
        entity_types: entities,
    };
    let report = service.perform_sync(options).await;

    match format {
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?,
        OutputFormat::Text => write_text(&report, out)?,
    }

    match report.error {
        Some(error) if !report.success => Err(Error::SyncFailed(error)),
        _ => Ok(()),
    }
}

fn write_text(report: &SyncReport, out: &mut impl Write) -> Result<()> {
    for (entity, counts) in &report.entities {
        write!(
            out,
            "{}: pushed {}, added {}, updated {}, deleted {}",
            entity, counts.pushed, counts.added, counts.updated, counts.deleted
        )?;
        if counts.errors > 0 {
            write!(out, ", {} error{}", counts.errors, if counts.errors == 1 { "" } else { "s" })?;
        }
        writeln!(out)?;
    }
    if let Some(ts) = report.timestamp {
        writeln!(out, "Server timestamp: {}", format_timestamp(ts))?;
    }
    if report.success {
        writeln!(out, "Sync complete")?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
