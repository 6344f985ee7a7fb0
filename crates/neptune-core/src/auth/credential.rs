//! Credential store trait.

use async_trait::async_trait;

use crate::error::Result;

/// Key under which the GitHub access token is stored.
pub const GITHUB_TOKEN_KEY: &str = "gh_token";

/// Opaque secure storage for access tokens.
///
/// # Security Note
///
/// Implementations should ensure that:
/// - Token files have appropriate permissions (e.g., 600 on Unix)
/// - Tokens are never logged or included in error messages
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn save_token(&self, key: &str, value: &str) -> Result<()>;

    /// Returns `Ok(None)` when nothing is stored under `key`.
    async fn load_token(&self, key: &str) -> Result<Option<String>>;

    /// Removing a missing key succeeds.
    async fn remove_token(&self, key: &str) -> Result<()>;
}
