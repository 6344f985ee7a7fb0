//! Supabase-backed user directory.

use async_trait::async_trait;
use neptune_core::auth::UserDirectory;
use neptune_core::config::SupabaseSecret;
use neptune_core::error::{NeptuneError, Result};
use neptune_core::user::{Plan, User};
use serde::Serialize;

/// Row shape of the `users` table.
#[derive(Debug, Serialize)]
struct UserRow<'a> {
    id: &'a str,
    author_name: &'a str,
    avatar_url: &'a str,
    email: Option<&'a str>,
    plan: &'static str,
}

impl<'a> UserRow<'a> {
    fn new(user: &'a User, plan: Plan) -> Self {
        Self {
            id: &user.id,
            author_name: user.display_name(),
            avatar_url: &user.avatar_url,
            email: user.email.as_deref(),
            plan: plan.as_str(),
        }
    }
}

/// Upserts users through the PostgREST endpoint of a Supabase project.
#[derive(Debug, Clone)]
pub struct SupabaseUserDirectory {
    http: reqwest::Client,
    url: String,
    anon_key: String,
}

impl SupabaseUserDirectory {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
        }
    }

    pub fn from_secret(secret: &SupabaseSecret) -> Self {
        Self::new(&secret.url, &secret.anon_key)
    }
}

#[async_trait]
impl UserDirectory for SupabaseUserDirectory {
    async fn upsert_user(&self, user: &User, plan: Plan) -> Result<()> {
        let response = self
            .http
            .post(format!("{}/rest/v1/users", self.url))
            .query(&[("on_conflict", "id")])
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .header("Prefer", "resolution=merge-duplicates")
            .json(&UserRow::new(user, plan))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NeptuneError::network(format!(
                "User upsert failed with {}: {}",
                status.as_u16(),
                body
            )));
        }

        tracing::debug!(user_id = %user.id, plan = %plan, "User row upserted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn octocat() -> User {
        User {
            id: "583231".to_string(),
            login: "octocat".to_string(),
            avatar_url: "https://avatars.example/u/583231".to_string(),
            name: Some("The Octocat".to_string()),
            email: None,
        }
    }

    #[tokio::test]
    async fn test_upsert_posts_user_row() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/users"))
            .and(query_param("on_conflict", "id"))
            .and(header("apikey", "anon"))
            .and(header("authorization", "Bearer anon"))
            .and(header("prefer", "resolution=merge-duplicates"))
            .and(body_json(serde_json::json!({
                "id": "583231",
                "author_name": "The Octocat",
                "avatar_url": "https://avatars.example/u/583231",
                "email": null,
                "plan": "free"
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&mock_server)
            .await;

        let directory = SupabaseUserDirectory::new(mock_server.uri(), "anon");
        directory.upsert_user(&octocat(), Plan::Free).await.unwrap();
    }

    #[tokio::test]
    async fn test_upsert_reports_rejected_request() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&mock_server)
            .await;

        let directory = SupabaseUserDirectory::new(format!("{}/", mock_server.uri()), "bad");
        let err = directory.upsert_user(&octocat(), Plan::Pro).await.unwrap_err();

        assert!(err.is_network());
        assert!(err.to_string().contains("401"));
    }
}
