// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client configuration.
//!
//! Configuration is read from a TOML file (`--config`, `ECOSYNC_CONFIG`, or
//! `<config_dir>/ecosync/config.toml`). Every field has a default, so a
//! missing default file is not an error. Environment variables override the
//! file: `ECOSYNC_TOKEN`, `ECOSYNC_BASE_URL`, `ECOSYNC_STATE_DIR`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use eco_core::Backoff;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::env;
use crate::error::{Error, Result};
use crate::realtime::RealtimeConfig;
use crate::sync::DEFAULT_ENTITY_TYPES;

const APP_DIR_NAME: &str = "ecosync";
const CONFIG_FILE_NAME: &str = "config.toml";
const STATE_FILE_NAME: &str = "state.json";

/// Which realtime transport to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[default]
    #[serde(alias = "ws")]
    WebSocket,
    Sse,
}

/// Client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Backend root URL (http or https).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub transport: TransportKind,
    /// Auth token. `ECOSYNC_TOKEN` takes precedence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Entity types to subscribe to and sync. Empty means the defaults.
    #[serde(default)]
    pub entities: Vec<String>,
    #[serde(default = "default_reconnect_max_attempts")]
    pub reconnect_max_attempts: u32,
    #[serde(default = "default_reconnect_base_delay_ms")]
    pub reconnect_base_delay_ms: u64,
    #[serde(default = "default_reconnect_multiplier")]
    pub reconnect_multiplier: f64,
    #[serde(default = "default_reconnect_max_delay_ms")]
    pub reconnect_max_delay_ms: u64,
    /// Seconds between periodic sync passes while listening.
    #[serde(default = "default_sync_interval_secs")]
    pub sync_interval_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Where sync state is kept. Defaults to `<data_local_dir>/ecosync`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<PathBuf>,
    /// Append logs here instead of stderr.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_reconnect_max_attempts() -> u32 {
    5
}

fn default_reconnect_base_delay_ms() -> u64 {
    1000
}

fn default_reconnect_multiplier() -> f64 {
    1.5
}

fn default_reconnect_max_delay_ms() -> u64 {
    30_000
}

fn default_sync_interval_secs() -> u64 {
    30
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: default_base_url(),
            transport: TransportKind::default(),
            token: None,
            entities: Vec::new(),
            reconnect_max_attempts: default_reconnect_max_attempts(),
            reconnect_base_delay_ms: default_reconnect_base_delay_ms(),
            reconnect_multiplier: default_reconnect_multiplier(),
            reconnect_max_delay_ms: default_reconnect_max_delay_ms(),
            sync_interval_secs: default_sync_interval_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            state_dir: None,
            log_file: None,
        }
    }
}

/// Values taken from the environment that override the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub token: Option<String>,
    pub base_url: Option<String>,
    pub state_dir: Option<PathBuf>,
}

impl Overrides {
    pub fn from_env() -> Self {
        Overrides {
            token: env::token(),
            base_url: env::base_url(),
            state_dir: env::state_dir(),
        }
    }
}

impl Config {
    /// Default config file location.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Loads, applies environment overrides and validates.
    ///
    /// An explicit path (argument or `ECOSYNC_CONFIG`) must exist; the
    /// default location may be absent.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let explicit = path.map(Path::to_path_buf).or_else(env::config_path);
        let mut config = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::ConfigNotFound(path.display().to_string()));
                }
                Self::read(&path)?
            }
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::read(&path)?,
                _ => Config::default(),
            },
        };

        config.apply(Overrides::from_env());
        config.validate()?;
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Applies overrides; unset values leave the file's values alone.
    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(token) = overrides.token {
            self.token = Some(token);
        }
        if let Some(base_url) = overrides.base_url {
            self.base_url = base_url;
        }
        if let Some(state_dir) = overrides.state_dir {
            self.state_dir = Some(state_dir);
        }
    }

    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| Error::Config(format!("invalid base_url '{}': {}", self.base_url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "base_url must be http:// or https://, got '{}'",
                self.base_url
            )));
        }
        if self.reconnect_max_attempts == 0 {
            return Err(Error::Config(
                "reconnect_max_attempts must be at least 1".to_string(),
            ));
        }
        if !self.reconnect_multiplier.is_finite() || self.reconnect_multiplier < 1.0 {
            return Err(Error::Config(format!(
                "reconnect_multiplier must be at least 1.0, got {}",
                self.reconnect_multiplier
            )));
        }
        if self.reconnect_max_delay_ms < self.reconnect_base_delay_ms {
            return Err(Error::Config(
                "reconnect_max_delay_ms must not be below reconnect_base_delay_ms".to_string(),
            ));
        }
        if self.sync_interval_secs == 0 || self.request_timeout_secs == 0 {
            return Err(Error::Config(
                "sync_interval_secs and request_timeout_secs must be positive".to_string(),
            ));
        }
        if self.entities.iter().any(|e| e.trim().is_empty()) {
            return Err(Error::Config("entities must not contain blank names".to_string()));
        }
        Ok(())
    }

    pub fn backoff(&self) -> Backoff {
        Backoff {
            base_delay: Duration::from_millis(self.reconnect_base_delay_ms),
            multiplier: self.reconnect_multiplier,
            max_delay: Duration::from_millis(self.reconnect_max_delay_ms),
            max_attempts: self.reconnect_max_attempts,
        }
    }

    /// Configured entity types, or the defaults when none are configured.
    pub fn entity_types(&self) -> Vec<String> {
        if self.entities.is_empty() {
            DEFAULT_ENTITY_TYPES.iter().map(|e| e.to_string()).collect()
        } else {
            self.entities.clone()
        }
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn realtime_config(&self) -> RealtimeConfig {
        RealtimeConfig {
            base_url: self.base_url.clone(),
            token: self.token.clone(),
            backoff: self.backoff(),
        }
    }

    pub fn state_dir(&self) -> Result<PathBuf> {
        match &self.state_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::data_local_dir()
                .map(|dir| dir.join(APP_DIR_NAME))
                .ok_or_else(|| {
                    Error::Config("no local data directory; set state_dir".to_string())
                }),
        }
    }

    /// Path of the sync state file.
    pub fn state_path(&self) -> Result<PathBuf> {
        Ok(self.state_dir()?.join(STATE_FILE_NAME))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
