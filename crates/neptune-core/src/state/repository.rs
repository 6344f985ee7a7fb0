//! Key-value persistence trait.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// String-keyed persistent storage with JSON values.
///
/// A mutation is durable only once the returned future has completed;
/// callers must not assume a concurrent reader observes it earlier.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads and decodes the value stored under `key`.
    ///
    /// A value that fails to decode is reported as `Ok(None)`.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Encodes `value`, stores it under `key` and commits the change.
    async fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Deletes `key` and commits the change.
    async fn remove(&self, key: &str) -> Result<()>;
}
