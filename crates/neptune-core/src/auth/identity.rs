//! Remote identity and user directory traits.

use async_trait::async_trait;

use crate::error::Result;
use crate::user::{Plan, User};

/// Checks a bearer token against the identity provider.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Returns the token's owner on a 2xx response and `None` on any other
    /// status. Transport failures are returned as errors.
    async fn verify(&self, token: &str) -> Result<Option<User>>;
}

/// Hosted user table keyed by the authenticated identity.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Creates the row for `user` or updates it in place.
    async fn upsert_user(&self, user: &User, plan: Plan) -> Result<()>;
}

/// Directory used when no backend is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopUserDirectory;

#[async_trait]
impl UserDirectory for NoopUserDirectory {
    async fn upsert_user(&self, _user: &User, _plan: Plan) -> Result<()> {
        Ok(())
    }
}
