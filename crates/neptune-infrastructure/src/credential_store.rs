//! Credential stores.
//!
//! - [`KeyringCredentialStore`]: the OS keychain (Keychain, Credential
//!   Manager, kernel keyring).
//! - [`FileCredentialStore`]: `credentials.json`, a flat key → token map
//!   written atomically and restricted to the owning user on Unix.
//! - [`KeyringThenFileStore`]: tries the keychain first and falls back to the
//!   file when it is unavailable.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use neptune_core::auth::CredentialStore;
use neptune_core::error::{NeptuneError, Result};

use crate::storage::{AtomicFile, FileFormat};

/// Keychain service name tokens are filed under.
pub const KEYRING_SERVICE: &str = "neptune";

type Tokens = BTreeMap<String, String>;

#[derive(Clone)]
pub struct FileCredentialStore {
    file: Arc<AtomicFile<Tokens>>,
}

impl FileCredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            file: Arc::new(AtomicFile::new(path, FileFormat::Json).owner_only()),
        }
    }

    async fn run_blocking<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&AtomicFile<Tokens>) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let file = self.file.clone();
        tokio::task::spawn_blocking(move || f(&file))
            .await
            .map_err(|e| NeptuneError::internal(format!("Failed to join task: {}", e)))?
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn save_token(&self, key: &str, value: &str) -> Result<()> {
        let key = key.to_string();
        let value = value.to_string();
        self.run_blocking(move |file| {
            file.update(Tokens::new(), |tokens| {
                tokens.insert(key, value);
                Ok(())
            })?;
            Ok(())
        })
        .await
    }

    async fn load_token(&self, key: &str) -> Result<Option<String>> {
        let key = key.to_string();
        self.run_blocking(move |file| Ok(file.load()?.and_then(|mut tokens| tokens.remove(&key))))
            .await
    }

    async fn remove_token(&self, key: &str) -> Result<()> {
        let key = key.to_string();
        self.run_blocking(move |file| {
            if file.load()?.is_none_or(|tokens| !tokens.contains_key(&key)) {
                return Ok(());
            }
            file.update(Tokens::new(), |tokens| {
                tokens.remove(&key);
                Ok(())
            })?;
            Ok(())
        })
        .await
    }
}

/// Tokens in the platform keychain, one entry per key.
#[derive(Debug, Clone)]
pub struct KeyringCredentialStore {
    service: String,
}

impl KeyringCredentialStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    async fn with_entry<F, R>(&self, key: &str, f: F) -> Result<R>
    where
        F: FnOnce(keyring::Entry) -> keyring::Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let service = self.service.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || {
            keyring::Entry::new(&service, &key).and_then(f)
        })
        .await
        .map_err(|e| NeptuneError::internal(format!("Failed to join task: {}", e)))?
        .map_err(|e| NeptuneError::io(format!("Keyring: {}", e)))
    }
}

#[async_trait]
impl CredentialStore for KeyringCredentialStore {
    async fn save_token(&self, key: &str, value: &str) -> Result<()> {
        let value = value.to_string();
        self.with_entry(key, move |entry| entry.set_password(&value)).await
    }

    async fn load_token(&self, key: &str) -> Result<Option<String>> {
        self.with_entry(key, |entry| match entry.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e),
        })
        .await
    }

    async fn remove_token(&self, key: &str) -> Result<()> {
        self.with_entry(key, |entry| match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e),
        })
        .await
    }
}

/// Keychain first, file second.
///
/// A token lands in the file only when the keychain refuses it. Removal
/// clears both and fails only when both fail.
pub struct KeyringThenFileStore {
    keyring: Arc<dyn CredentialStore>,
    file: Arc<dyn CredentialStore>,
}

impl KeyringThenFileStore {
    pub fn new(service: impl Into<String>, file_path: PathBuf) -> Self {
        Self::with_stores(
            Arc::new(KeyringCredentialStore::new(service)),
            Arc::new(FileCredentialStore::new(file_path)),
        )
    }

    pub fn with_stores(keyring: Arc<dyn CredentialStore>, file: Arc<dyn CredentialStore>) -> Self {
        Self { keyring, file }
    }
}

#[async_trait]
impl CredentialStore for KeyringThenFileStore {
    async fn save_token(&self, key: &str, value: &str) -> Result<()> {
        match self.keyring.save_token(key, value).await {
            Ok(()) => return Ok(()),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Keyring save failed, falling back to file store");
            }
        }
        self.file.save_token(key, value).await
    }

    async fn load_token(&self, key: &str) -> Result<Option<String>> {
        match self.keyring.load_token(key).await {
            Ok(Some(token)) => return Ok(Some(token)),
            Ok(None) => tracing::debug!(key = %key, "No keyring entry, trying file store"),
            Err(e) => tracing::warn!(key = %key, error = %e, "Keyring load failed, trying file store"),
        }
        self.file.load_token(key).await
    }

    async fn remove_token(&self, key: &str) -> Result<()> {
        let keyring_result = self.keyring.remove_token(key).await;
        let file_result = self.file.remove_token(key).await;

        match (keyring_result, file_result) {
            (Err(_), Err(e)) => Err(e),
            _ => Ok(()),
        }
    }
}
