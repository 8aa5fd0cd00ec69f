// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared argument structs for CLI commands.

use clap::Args;

/// Entity type selection shared by `listen` and `sync`.
#[derive(Args, Clone, Debug, Default)]
pub struct EntityArgs {
    /// Entity types to use instead of the configured ones (comma-separated or repeated)
    #[arg(long, short, value_delimiter = ',', value_parser = super::non_empty_string)]
    pub entities: Vec<String>,
}

impl EntityArgs {
    /// The selected entity types, or `None` to use the configuration.
    pub fn selected(&self) -> Option<Vec<String>> {
        if self.entities.is_empty() {
            None
        } else {
            Some(self.entities.clone())
        }
    }
}
