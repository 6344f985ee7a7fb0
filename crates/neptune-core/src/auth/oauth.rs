//! OAuth boundary traits.

use async_trait::async_trait;

use crate::error::Result;

/// Opens a URL in a browser outside the application.
pub trait BrowserOpener: Send + Sync {
    fn open(&self, url: &str) -> Result<()>;
}

/// A complete interactive login that ends with an access token.
///
/// One call corresponds to one login attempt: it either yields a token, or
/// fails with a timeout or flow error.
#[async_trait]
pub trait OAuthFlow: Send + Sync {
    async fn authorize(&self) -> Result<String>;
}
