//! Application configuration management.
//!
//! Configuration is stored at `~/.config/algocache/config.json` and may be
//! overridden from the environment (`ALGOCACHE_API_URL`,
//! `ALGOCACHE_API_TOKEN`, `ALGOCACHE_OFFLINE`).

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::sync::{RetryPolicy, DEFAULT_MAX_RETRIES};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "algocache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const DEFAULT_API_BASE_URL: &str = "https://api.algocache.dev/v1";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub api_token: Option<String>,
    /// Overrides the platform cache directory.
    pub cache_dir: Option<PathBuf>,
    /// Treat the source as unreachable and serve only cached data.
    pub offline_mode: bool,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    pub request_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_token: None,
            cache_dir: None,
            offline_mode: false,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff_ms: 0,
            request_timeout_secs: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Apply overrides looked up through `var`.
    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("ALGOCACHE_API_URL") {
            self.api_base_url = url;
        }
        if let Some(token) = var("ALGOCACHE_API_TOKEN") {
            self.api_token = Some(token);
        }
        if let Some(offline) = var("ALGOCACHE_OFFLINE") {
            self.offline_mode = matches!(offline.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.cache_dir {
            return Ok(dir.clone());
        }
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries).with_backoff(Duration::from_millis(self.retry_backoff_ms))
    }
}
