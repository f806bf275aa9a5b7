//! Persisted light/dark colour-mode preference.
//!
//! Stored under `theme-storage` as `{"state":{"colorMode":"light"},"version":0}`,
//! the same document shape earlier app builds wrote, so existing installs
//! keep their choice.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::store::{KeyValueStore, StoreError};

/// Store key the preference lives under
pub const THEME_KEY: &str = "theme-storage";

/// Version written alongside the state
const THEME_STORAGE_VERSION: u32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Light,
    Dark,
}

impl ColorMode {
    pub fn toggled(self) -> Self {
        match self {
            ColorMode::Light => ColorMode::Dark,
            ColorMode::Dark => ColorMode::Light,
        }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorMode::Light => write!(f, "light"),
            ColorMode::Dark => write!(f, "dark"),
        }
    }
}

impl FromStr for ColorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(ColorMode::Light),
            "dark" => Ok(ColorMode::Dark),
            other => Err(format!("Unknown colour mode: {}", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ThemeState {
    #[serde(rename = "colorMode", default)]
    color_mode: ColorMode,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedTheme {
    state: ThemeState,
    #[serde(default)]
    version: u32,
}

pub struct ThemeStore {
    store: Arc<dyn KeyValueStore>,
}

impl ThemeStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Current preference. Missing, unreadable or damaged data reads as `Light`.
    pub async fn load(&self) -> ColorMode {
        let stored = match self.store.get(THEME_KEY).await {
            Ok(Some(stored)) => stored,
            Ok(None) => return ColorMode::default(),
            Err(e) => {
                warn!(error = %e, "Could not read theme preference");
                return ColorMode::default();
            }
        };

        match serde_json::from_str::<PersistedTheme>(&stored) {
            Ok(persisted) => persisted.state.color_mode,
            Err(e) => {
                warn!(error = %e, "Theme preference is damaged, using default");
                ColorMode::default()
            }
        }
    }

    pub async fn set(&self, mode: ColorMode) -> Result<(), StoreError> {
        let persisted = PersistedTheme {
            state: ThemeState { color_mode: mode },
            version: THEME_STORAGE_VERSION,
        };
        self.store
            .set(THEME_KEY, &serde_json::to_string(&persisted)?)
            .await?;
        debug!(mode = %mode, "Theme preference saved");
        Ok(())
    }

    /// Flip the stored mode and return the new one
    pub async fn toggle(&self) -> Result<ColorMode, StoreError> {
        let next = self.load().await.toggled();
        self.set(next).await?;
        Ok(next)
    }
}
