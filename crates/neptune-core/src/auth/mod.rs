//! Authentication boundaries.
//!
//! The core only describes what it needs from the outside world; concrete
//! HTTP and file implementations live in the infrastructure crate.

mod credential;
mod identity;
mod oauth;

pub use credential::{CredentialStore, GITHUB_TOKEN_KEY};
pub use identity::{IdentityVerifier, NoopUserDirectory, UserDirectory};
pub use oauth::{BrowserOpener, OAuthFlow};
