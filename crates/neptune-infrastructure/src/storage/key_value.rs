//! Key-value adapters backing the store's persistence.
//!
//! Values are kept as JSON-encoded strings inside one JSON document, the
//! layout the web-view store plugin writes, so an existing `neptune.json`
//! can be read as is.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use neptune_core::error::{NeptuneError, Result};
use neptune_core::state::KeyValueStore;
use serde_json::Value;
use tokio::sync::RwLock;

use super::atomic_file::{AtomicFile, AtomicFileError, FileFormat};

type Document = BTreeMap<String, String>;

fn decode(key: &str, raw: &str) -> Option<Value> {
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Discarding undecodable stored value");
            None
        }
    }
}

/// File-backed adapter: one JSON document, committed on every write.
#[derive(Clone)]
pub struct JsonFileKeyValueStore {
    file: Arc<AtomicFile<Document>>,
}

impl JsonFileKeyValueStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            file: Arc::new(AtomicFile::new(path, FileFormat::Json)),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.file.path().to_path_buf()
    }

    async fn run_blocking<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&AtomicFile<Document>) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let file = self.file.clone();
        tokio::task::spawn_blocking(move || f(&file))
            .await
            .map_err(|e| NeptuneError::internal(format!("Failed to join task: {}", e)))?
    }
}

#[async_trait]
impl KeyValueStore for JsonFileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let owned_key = key.to_string();
        let raw = self
            .run_blocking(move |file| Ok(file.load()?.and_then(|mut doc| doc.remove(&owned_key))))
            .await;

        match raw {
            Ok(Some(raw)) => Ok(decode(key, &raw)),
            Ok(None) => Ok(None),
            Err(e) if e.is_serialization() => {
                tracing::warn!(key = %key, error = %e, "Store document is unreadable");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let encoded = serde_json::to_string(&value)?;
        let owned_key = key.to_string();
        self.run_blocking(move |file| {
            let inserted = file.update(Document::new(), |doc| {
                doc.insert(owned_key.clone(), encoded.clone());
                Ok(())
            });
            match inserted {
                Err(AtomicFileError::JsonError(e)) => {
                    tracing::warn!(error = %e, "Replacing unreadable store document");
                    file.save(&Document::from([(owned_key, encoded)]))?;
                    Ok(())
                }
                other => Ok(other?),
            }
        })
        .await?;
        tracing::trace!(key = %key, "Committed store value");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let owned_key = key.to_string();
        self.run_blocking(move |file| {
            file.update(Document::new(), |doc| {
                doc.remove(&owned_key);
                Ok(())
            })?;
            Ok(())
        })
        .await
    }
}

/// In-process adapter with the same string encoding.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The encoded string stored under `key`.
    pub async fn raw(&self, key: &str) -> Option<String> {
        self.entries.read().await.get(key).cloned()
    }

    /// Stores an already-encoded string, bypassing encoding.
    pub async fn insert_raw(&self, key: impl Into<String>, raw: impl Into<String>) {
        self.entries.write().await.insert(key.into(), raw.into());
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).and_then(|raw| decode(key, raw)))
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let encoded = serde_json::to_string(&value)?;
        self.entries.write().await.insert(key.to_string(), encoded);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}
