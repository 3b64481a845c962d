//! Configuration model.
//!
//! Loaded by the infrastructure layer from `config.toml`. Every field has a
//! default so a missing or partial file is never an error.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default autosave period in milliseconds.
pub const DEFAULT_AUTOSAVE_INTERVAL_MS: u64 = 5000;

/// Default delay between a section turning dirty and the early tick.
pub const DEFAULT_DEBOUNCE_MS: u64 = 1000;

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct RecdraftConfig {
    #[serde(default)]
    pub autosave: AutosaveConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct AutosaveConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// `0` disables the dirty-edge tick.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Persist per-section validity next to drafts.
    #[serde(default = "default_true")]
    pub persist_validity: bool,
}

impl AutosaveConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }

    pub fn debounce(&self) -> Option<Duration> {
        (self.debounce_ms > 0).then(|| Duration::from_millis(self.debounce_ms))
    }
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_AUTOSAVE_INTERVAL_MS,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            persist_validity: true,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct StorageConfig {
    /// Draft file location. Defaults to the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Upper bound on the total stored bytes, like a browser storage quota.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quota_bytes: Option<u64>,
}

fn default_interval_ms() -> u64 {
    DEFAULT_AUTOSAVE_INTERVAL_MS
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

fn default_true() -> bool {
    true
}
