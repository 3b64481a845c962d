//! Configuration service implementation.
//!
//! This module provides a ConfigService that loads the root configuration
//! from the configuration file (~/.config/recdraft/config.toml).

use crate::paths::RecdraftPaths;
use crate::storage::JsonFileStorage;
use recdraft_core::config::RecdraftConfig;
use recdraft_core::error::{DraftError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Configuration service that loads and caches the root configuration.
///
/// The file is read once and cached. A missing file yields the defaults and
/// is not created on disk.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    /// Cached configuration loaded from file.
    config: Arc<RwLock<Option<RecdraftConfig>>>,
}

impl ConfigService {
    /// Creates a ConfigService reading the platform config file.
    pub fn new() -> Result<Self> {
        let path = RecdraftPaths::config_file().map_err(|e| DraftError::config(e.to_string()))?;
        Ok(Self::with_path(path))
    }

    /// Creates a ConfigService reading an explicit file.
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            config: Arc::new(RwLock::new(None)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets the root configuration, loading from file if not cached.
    pub fn get_config(&self) -> Result<RecdraftConfig> {
        {
            let read_lock = self
                .config
                .read()
                .map_err(|_| DraftError::internal("config cache lock poisoned"))?;
            if let Some(ref cached) = *read_lock {
                return Ok(cached.clone());
            }
        }

        let loaded = Self::load_from(&self.path)?;

        let mut write_lock = self
            .config
            .write()
            .map_err(|_| DraftError::internal("config cache lock poisoned"))?;
        *write_lock = Some(loaded.clone());

        Ok(loaded)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        if let Ok(mut write_lock) = self.config.write() {
            *write_lock = None;
        }
    }

    /// Opens the draft storage the configuration points at.
    ///
    /// `override_path` wins over the configured path, which wins over the
    /// platform default.
    pub fn open_storage(&self, override_path: Option<PathBuf>) -> Result<JsonFileStorage> {
        let config = self.get_config()?;
        let path = match override_path.or(config.storage.path) {
            Some(path) => path,
            None => RecdraftPaths::drafts_file().map_err(|e| DraftError::config(e.to_string()))?,
        };

        tracing::debug!("Opening draft storage at {:?}", path);
        Ok(JsonFileStorage::new(path).with_quota(config.storage.quota_bytes))
    }

    /// Parses a config file. Missing or blank files yield the defaults.
    pub fn load_from(path: &Path) -> Result<RecdraftConfig> {
        if !path.exists() {
            tracing::debug!("No config file at {:?}, using defaults", path);
            return Ok(RecdraftConfig::default());
        }

        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(RecdraftConfig::default());
        }

        toml::from_str(&content)
            .map_err(|e| DraftError::config(format!("Failed to parse {:?}: {}", path, e)))
    }
}
