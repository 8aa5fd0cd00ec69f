// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use eco_core::Operation;
use serde_json::Value;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::sync::{SyncApi, SyncService};

use super::open_service;

pub fn run(config: &Config, entity: &str, operation: Operation, data: &str) -> Result<()> {
    let service = open_service(config)?;
    run_impl(&service, entity, operation, data, &mut std::io::stdout())
}

/// Parses `data` and queues it. The record must be a JSON object.
pub(crate) fn run_impl<A: SyncApi>(
    service: &SyncService<A>,
    entity: &str,
    operation: Operation,
    data: &str,
    out: &mut impl Write,
) -> Result<()> {
    let data: Value = serde_json::from_str(data)
        .map_err(|e| Error::InvalidInput(format!("record is not valid JSON: {}", e)))?;
    if !data.is_object() {
        return Err(Error::InvalidInput(
            "record must be a JSON object".to_string(),
        ));
    }

    let update = service.queue_update(entity, operation, data);
    writeln!(
        out,
        "Queued {} {} ({} pending)",
        operation,
        update.id.as_deref().unwrap_or("(no id)"),
        service.pending_updates(entity).len()
    )?;
    Ok(())
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
