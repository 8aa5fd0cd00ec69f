// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test binaries,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;

pub use predicates::prelude::*;
pub use tempfile::TempDir;

/// A state directory and config file isolated from the user's own.
pub struct Sandbox {
    pub dir: TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            "base_url = \"http://127.0.0.1:9\"\nentities = [\"orders\", \"users\"]\n",
        )
        .unwrap();
        Sandbox { dir }
    }

    /// `ecosync` pointed at this sandbox.
    pub fn ecosync(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("ecosync");
        cmd.env("ECOSYNC_CONFIG", self.dir.path().join("config.toml"))
            .env("ECOSYNC_STATE_DIR", self.dir.path().join("state"))
            .env_remove("ECOSYNC_TOKEN")
            .env_remove("ECOSYNC_BASE_URL")
            .env_remove("RUST_LOG");
        cmd
    }

    pub fn state_file(&self) -> std::path::PathBuf {
        self.dir.path().join("state").join("state.json")
    }
}
