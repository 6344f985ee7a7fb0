//! Commit author identity stored in `author.json`.

use std::path::PathBuf;

use neptune_core::config::AuthorConfig;
use neptune_core::error::Result;

use crate::git::GitLogReader;
use crate::storage::{AtomicFile, FileFormat};

pub struct AuthorConfigService {
    file: AtomicFile<AuthorConfig>,
    git: GitLogReader,
}

impl AuthorConfigService {
    pub fn new(path: PathBuf) -> Self {
        Self::with_git(path, GitLogReader::default())
    }

    pub fn with_git(path: PathBuf, git: GitLogReader) -> Self {
        Self {
            file: AtomicFile::new(path, FileFormat::Json),
            git,
        }
    }

    pub fn load(&self) -> Result<Option<AuthorConfig>> {
        Ok(self.file.load()?)
    }

    /// Returns the stored identity, or seeds one from the global git config.
    ///
    /// Seeding persists the result; a failed write is logged and the seeded
    /// value is still returned.
    pub async fn load_or_create(&self) -> Result<AuthorConfig> {
        match self.load() {
            Ok(Some(existing)) => return Ok(existing),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Unreadable author config, reseeding from git");
            }
        }

        let config = AuthorConfig {
            author_name: self.git.config_value("user.name").await.unwrap_or_default(),
            author_email: self.git.config_value("user.email").await.unwrap_or_default(),
        };

        if let Err(e) = self.save(&config) {
            tracing::warn!(error = %e, "Failed to persist author config");
        }
        Ok(config)
    }

    pub fn save(&self, config: &AuthorConfig) -> Result<()> {
        self.file.save(config)?;
        Ok(())
    }
}
