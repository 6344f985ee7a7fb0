//! Unified path management for Neptune files.
//!
//! Every file the application reads or writes is resolved here so that a
//! single base path override (used by tests and `--config-dir`) moves all of
//! them together.

use std::path::{Path, PathBuf};

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home/config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find config directory"),
        }
    }
}

impl std::error::Error for PathError {}

impl From<PathError> for neptune_core::NeptuneError {
    fn from(err: PathError) -> Self {
        neptune_core::NeptuneError::config(err.to_string())
    }
}

/// The files Neptune keeps under its config directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceType {
    /// `config.toml`
    Config,
    /// `secret.json`
    Secret,
    /// `credentials.json`
    Credentials,
    /// `neptune.json`, the persisted store document
    Store,
    /// `author.json`
    Author,
    /// `logs/`
    Logs,
}

impl ServiceType {
    fn relative_path(&self) -> &'static str {
        match self {
            ServiceType::Config => "config.toml",
            ServiceType::Secret => "secret.json",
            ServiceType::Credentials => "credentials.json",
            ServiceType::Store => "neptune.json",
            ServiceType::Author => "author.json",
            ServiceType::Logs => "logs",
        }
    }
}

/// Path resolver for Neptune.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/neptune/           # Config directory (or the base override)
/// ├── config.toml              # Application configuration
/// ├── secret.json              # OAuth client and backend keys
/// ├── credentials.json         # Access tokens (0600)
/// ├── neptune.json             # Persisted store projection
/// ├── author.json              # Commit author identity
/// └── logs/                    # Application logs
///     └── neptune.log.YYYY-MM-DD
/// ```
#[derive(Debug, Clone, Default)]
pub struct NeptunePaths {
    base: Option<PathBuf>,
}

impl NeptunePaths {
    pub fn new(base: Option<&Path>) -> Self {
        Self {
            base: base.map(Path::to_path_buf),
        }
    }

    /// Returns the Neptune configuration directory.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: the base override, or `<platform config dir>/neptune`
    /// - `Err(PathError::ConfigDirNotFound)`: no base and no platform directory
    pub fn config_dir(&self) -> Result<PathBuf, PathError> {
        if let Some(base) = &self.base {
            return Ok(base.clone());
        }
        dirs::config_dir()
            .map(|dir| dir.join("neptune"))
            .ok_or(PathError::ConfigDirNotFound)
    }

    pub fn get_path(&self, service: ServiceType) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join(service.relative_path()))
    }
}
