//! Application configuration management.
//!
//! Configuration is read from `~/.config/sauktiniai/config.json` when it
//! exists, otherwise defaults are used. A few settings can be overridden from
//! the environment (`SAUKTINIAI_BASE_URL`, `SAUKTINIAI_DATA_DIR`), which is
//! how deployments point at a different upstream or snapshot directory.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application name used for config/data directory paths
const APP_NAME: &str = "sauktiniai";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const ENV_BASE_URL: &str = "SAUKTINIAI_BASE_URL";
const ENV_DATA_DIR: &str = "SAUKTINIAI_DATA_DIR";

pub const DEFAULT_BASE_URL: &str = "https://sauktiniai.karys.lt";

/// HTTP request timeout in seconds, per window.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Items requested per upstream call.
pub const DEFAULT_WINDOW_SIZE: u32 = 500;

/// Simultaneous upstream calls during a region fetch.
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 10;

/// Offsets scanned per region when nothing better is known.
/// Upstream regions have stayed well under this.
pub const DEFAULT_TARGET_COUNT: u32 = 60_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub window_size: u32,
    pub max_concurrent_requests: usize,
    pub target_count: u32,
    pub data_dir: Option<PathBuf>,
    pub log_to_file: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            window_size: DEFAULT_WINDOW_SIZE,
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
            target_count: DEFAULT_TARGET_COUNT,
            data_dir: None,
            log_to_file: false,
        }
    }
}

impl Config {
    /// Load the config file (if any) and apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_path() {
            Ok(path) if path.exists() => Self::load_from(&path)?,
            _ => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(ENV_BASE_URL) {
            if !url.trim().is_empty() {
                self.base_url = url.trim().trim_end_matches('/').to_string();
            }
        }
        if let Ok(dir) = std::env::var(ENV_DATA_DIR) {
            if !dir.trim().is_empty() {
                self.data_dir = Some(PathBuf::from(dir.trim()));
            }
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the per-region snapshots and the last-updated marker.
    pub fn data_dir(&self) -> PathBuf {
        if let Some(ref dir) = self.data_dir {
            return dir.clone();
        }
        dirs::data_dir()
            .map(|d| d.join(APP_NAME))
            .unwrap_or_else(|| PathBuf::from("./data"))
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs.max(1))
    }
}
