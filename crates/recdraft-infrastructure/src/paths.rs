//! Unified path management for recdraft files.
//!
//! Resolved through the `dirs` crate so the layout follows platform
//! conventions (XDG on Linux, `Library` on macOS, `AppData` on Windows).

use std::path::PathBuf;

/// Application directory name under the platform config/data roots.
const APP_DIR: &str = "recdraft";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Unified path management for recdraft.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/recdraft/          # Config directory
/// └── config.toml              # Autosave and storage settings
///
/// ~/.local/share/recdraft/     # Data directory
/// └── drafts.json              # Durable draft storage (JSON key/value map)
/// ```
pub struct RecdraftPaths;

impl RecdraftPaths {
    /// Returns the recdraft configuration directory.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: Path to config directory (e.g., `~/.config/recdraft/`)
    /// - `Err(PathError::HomeDirNotFound)`: Could not determine directory
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the recdraft data directory.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: Path to data directory (e.g., `~/.local/share/recdraft/`)
    /// - `Err(PathError::HomeDirNotFound)`: Could not determine directory
    pub fn data_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the default location of the durable draft store.
    pub fn drafts_file() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("drafts.json"))
    }
}
