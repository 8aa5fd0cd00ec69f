// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::BTreeMap;
use std::io::Write;

use eco_core::PendingUpdate;

use crate::cli::OutputFormat;
use crate::config::Config;
use crate::error::Result;
use crate::sync::{SyncApi, SyncService};

use super::open_service;

pub fn run(config: &Config, entity: Option<&str>, format: OutputFormat) -> Result<()> {
    let service = open_service(config)?;
    run_impl(&service, entity, format, &mut std::io::stdout())
}

pub(crate) fn run_impl<A: SyncApi>(
    service: &SyncService<A>,
    entity: Option<&str>,
    format: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    let entities: Vec<String> = match entity {
        Some(entity) => vec![entity.to_string()],
        None => service.pending_by_entity().into_keys().collect(),
    };
    let pending: BTreeMap<String, Vec<PendingUpdate>> = entities
        .into_iter()
        .map(|entity| {
            let updates = service.pending_updates(&entity);
            (entity, updates)
        })
        .filter(|(_, updates)| !updates.is_empty())
        .collect();

    match format {
        OutputFormat::Json => {
            writeln!(out, "{}", serde_json::to_string_pretty(&pending)?)?;
        }
        OutputFormat::Text => {
            if pending.is_empty() {
                writeln!(out, "No pending updates")?;
                return Ok(());
            }
            let mut total = 0;
            for (entity, updates) in &pending {
                total += updates.len();
                writeln!(out, "{}: {} pending", entity, updates.len())?;
                for update in updates {
                    writeln!(
                        out,
                        "  {} {}",
                        update.operation,
                        update.id.as_deref().unwrap_or("-")
                    )?;
                }
            }
            writeln!(out, "Total: {}", total)?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "pending_tests.rs"]
mod tests;
