// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use crate::config::Config;
use crate::error::Result;
use crate::sync::{SyncApi, SyncService};

use super::open_service;

pub fn run(config: &Config) -> Result<()> {
    let service = open_service(config)?;
    run_impl(&service, &mut std::io::stdout())
}

pub(crate) fn run_impl<A: SyncApi>(service: &SyncService<A>, out: &mut impl Write) -> Result<()> {
    let dropped = service.pending_updates_count();
    service.clear_sync_data()?;
    writeln!(
        out,
        "Cleared sync data ({} pending update{} dropped)",
        dropped,
        if dropped == 1 { "" } else { "s" }
    )?;
    Ok(())
}

#[cfg(test)]
#[path = "clear_tests.rs"]
mod tests;
