//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the API base URL and key, the request timeout, and which
//! storage backend holds the session.
//!
//! Configuration is stored at `~/.config/alleasy/config.json`. Any field
//! can be overridden with an `ALLEASY_*` environment variable.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::store::{FileStore, KeyValueStore, KeyringStore, MemoryStore};

/// Application name used for config/data directory paths
const APP_NAME: &str = "alleasy";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Demo API every request is sent to
pub const DEFAULT_BASE_URL: &str = "https://reqres.in/api";

/// Free-tier key the demo API expects in `x-api-key`
pub const DEFAULT_API_KEY: &str = "reqres-free-v1";

/// HTTP request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    File,
    Keyring,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(StoreBackend::File),
            "keyring" | "keychain" => Ok(StoreBackend::Keyring),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(anyhow::anyhow!("Unknown store backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
    pub store: StoreBackend,
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: DEFAULT_API_KEY.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            store: StoreBackend::default(),
            data_dir: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            Ok(serde_json::from_str(&contents).context("Failed to parse config file")?)
        } else {
            Ok(Self::default())
        }
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

    /// Apply `ALLEASY_*` overrides from the process environment
    pub fn apply_env(self) -> Result<Self> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    fn apply_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(url) = var("ALLEASY_BASE_URL") {
            self.base_url = url;
        }
        if let Some(key) = var("ALLEASY_API_KEY") {
            self.api_key = key;
        }
        if let Some(secs) = var("ALLEASY_TIMEOUT_SECS") {
            self.timeout_secs = secs
                .parse()
                .with_context(|| format!("ALLEASY_TIMEOUT_SECS is not a number: {}", secs))?;
        }
        if let Some(store) = var("ALLEASY_STORE") {
            self.store = store.parse()?;
        }
        if let Some(dir) = var("ALLEASY_DATA_DIR") {
            self.data_dir = Some(PathBuf::from(dir));
        }
        Ok(self)
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory the file store writes to
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.data_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_local_dir()
            .or_else(dirs::cache_dir)
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Build the storage backend this config selects
    pub fn open_store(&self) -> Result<Arc<dyn KeyValueStore>> {
        debug!(backend = ?self.store, "Opening store");
        Ok(match self.store {
            StoreBackend::File => Arc::new(FileStore::new(self.data_dir()?)),
            StoreBackend::Keyring => Arc::new(KeyringStore::default()),
            StoreBackend::Memory => Arc::new(MemoryStore::new()),
        })
    }
}
