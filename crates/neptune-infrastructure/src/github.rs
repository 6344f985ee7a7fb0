//! GitHub identity verification.
//!
//! A token is considered valid exactly when `GET /user` answers with a 2xx
//! status. The response body doubles as the session's user record.

use async_trait::async_trait;
use neptune_core::auth::IdentityVerifier;
use neptune_core::config::DEFAULT_GITHUB_API_BASE;
use neptune_core::error::{NeptuneError, Result};
use neptune_core::user::User;
use serde::Deserialize;

pub(crate) const USER_AGENT: &str = concat!("neptune/", env!("CARGO_PKG_VERSION"));

/// Subset of GitHub's `/user` payload that Neptune keeps.
#[derive(Debug, Deserialize)]
struct GitHubUser {
    id: u64,
    login: String,
    #[serde(default)]
    avatar_url: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

impl From<GitHubUser> for User {
    fn from(user: GitHubUser) -> Self {
        User {
            id: user.id.to_string(),
            login: user.login,
            avatar_url: user.avatar_url,
            name: user.name,
            email: user.email,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GitHubIdentityClient {
    http: reqwest::Client,
    api_base: String,
}

impl GitHubIdentityClient {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }
}

impl Default for GitHubIdentityClient {
    fn default() -> Self {
        Self::new(DEFAULT_GITHUB_API_BASE)
    }
}

#[async_trait]
impl IdentityVerifier for GitHubIdentityClient {
    async fn verify(&self, token: &str) -> Result<Option<User>> {
        let response = self
            .http
            .get(format!("{}/user", self.api_base))
            .header(reqwest::header::AUTHORIZATION, format!("token {}", token))
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::info!(status = status.as_u16(), "Token rejected by identity endpoint");
            return Ok(None);
        }

        let user: GitHubUser = response.json().await.map_err(|e| NeptuneError::Serialization {
            format: "JSON".to_string(),
            message: format!("Unexpected /user payload: {}", e),
        })?;
        tracing::debug!(login = %user.login, "Token verified");
        Ok(Some(user.into()))
    }
}
