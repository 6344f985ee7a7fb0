//! Configuration service implementation.
//!
//! This module provides a ConfigService that loads the root configuration
//! from the configuration file (~/.config/neptune/config.toml).

use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use neptune_core::config::RootConfig;
use neptune_core::error::Result;

use crate::paths::{NeptunePaths, ServiceType};
use crate::storage::{AtomicFile, FileFormat};

/// Configuration service that loads and caches the root configuration.
///
/// This implementation reads the configuration from config.toml
/// and caches it to avoid repeated file I/O operations.
#[derive(Clone)]
pub struct ConfigService {
    file: Arc<AtomicFile<RootConfig>>,
    /// Cached configuration loaded from file.
    config: Arc<RwLock<Option<RootConfig>>>,
}

impl ConfigService {
    pub fn new(path: PathBuf) -> Self {
        Self {
            file: Arc::new(AtomicFile::new(path, FileFormat::Toml)),
            config: Arc::new(RwLock::new(None)),
        }
    }

    pub fn from_paths(paths: &NeptunePaths) -> Result<Self> {
        Ok(Self::new(paths.get_path(ServiceType::Config)?))
    }

    /// Gets the root configuration, loading from file if not cached.
    ///
    /// A missing file is created with defaults. An unreadable one is left
    /// untouched and defaults are used for this run.
    pub fn get_config(&self) -> RootConfig {
        if let Some(cached) = self
            .config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return cached.clone();
        }

        let loaded = self.load_config().unwrap_or_else(|e| {
            tracing::warn!(path = %self.file.path().display(), error = %e, "Falling back to default config");
            RootConfig::default()
        });

        *self.config.write().unwrap_or_else(PoisonError::into_inner) = Some(loaded.clone());
        loaded
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn load_config(&self) -> Result<RootConfig> {
        if let Some(config) = self.file.load()? {
            return Ok(config);
        }

        let default_config = RootConfig::default();
        self.file.save(&default_config)?;
        tracing::info!(path = %self.file.path().display(), "Created default config");
        Ok(default_config)
    }
}
