//! GitHub OAuth 2.0 authorization code flow over a loopback redirect.
//!
//! # OAuth Flow
//!
//! 1. Bind an ephemeral port on 127.0.0.1 and build the authorize URL with a
//!    random `state` and `redirect_uri = http://localhost:<port>/callback`.
//! 2. Open the URL in the user's browser.
//! 3. Wait for exactly one `/callback` request, bounded by the configured
//!    timeout, and check its `state`.
//! 4. Exchange the `code` for an access token.
//!
//! Every failure along the way is reported as [`NeptuneError::Auth`].

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::extract::{Query, State};
use axum::response::Html;
use axum::routing::get;
use neptune_core::auth::{BrowserOpener, OAuthFlow};
use neptune_core::config::DEFAULT_OAUTH_TIMEOUT_SECS;
use neptune_core::error::{NeptuneError, Result};
use rand::RngCore;
use reqwest::Url;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use crate::github::USER_AGENT;

const GITHUB_AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
const GITHUB_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const DEFAULT_SCOPES: &str = "repo read:org";
const CALLBACK_PATH: &str = "/callback";

const SUCCESS_PAGE: &str = "<html><body><h2>Signed in to Neptune.</h2>\
<p>You can close this window and return to the app.</p></body></html>";
const FAILURE_PAGE: &str = "<html><body><h2>Sign-in failed.</h2>\
<p>Return to Neptune and try again.</p></body></html>";

/// Settings for one OAuth application.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Space-separated scopes.
    pub scopes: String,
    pub authorize_url: String,
    pub token_url: String,
    /// Wall-clock bound on waiting for the browser callback.
    pub timeout: Duration,
}

impl OAuthConfig {
    /// GitHub endpoints with the scopes Neptune needs.
    pub fn github(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scopes: DEFAULT_SCOPES.to_string(),
            authorize_url: GITHUB_AUTHORIZE_URL.to_string(),
            token_url: GITHUB_TOKEN_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_OAUTH_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Query string GitHub appends to the redirect.
#[derive(Debug, Default, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// Opens URLs with the platform's default browser.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBrowser;

impl BrowserOpener for SystemBrowser {
    fn open(&self, url: &str) -> Result<()> {
        webbrowser::open(url)
            .map_err(|e| NeptuneError::auth(format!("Failed to open browser: {}", e)))
    }
}

/// OAuth flow that receives the redirect on a local port.
pub struct LoopbackOAuthFlow {
    config: OAuthConfig,
    browser: Arc<dyn BrowserOpener>,
    http: reqwest::Client,
}

impl LoopbackOAuthFlow {
    pub fn new(config: OAuthConfig, browser: Arc<dyn BrowserOpener>) -> Self {
        Self {
            config,
            browser,
            http: reqwest::Client::new(),
        }
    }

    /// Builds the URL the user is sent to.
    pub fn authorization_url(&self, redirect_uri: &str, state: &str) -> Result<String> {
        let url = Url::parse_with_params(
            &self.config.authorize_url,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("scope", self.config.scopes.as_str()),
                ("state", state),
            ],
        )
        .map_err(|e| NeptuneError::config(format!("Invalid authorize URL: {}", e)))?;
        Ok(url.into())
    }

    /// Exchanges an authorization code for an access token.
    pub async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<String> {
        let response = self
            .http
            .post(&self.config.token_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .json(&serde_json::json!({
                "client_id": self.config.client_id,
                "client_secret": self.config.client_secret,
                "code": code,
                "redirect_uri": redirect_uri,
            }))
            .send()
            .await
            .map_err(|e| NeptuneError::auth(format!("Token exchange request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NeptuneError::auth(format!(
                "Token endpoint answered {}",
                status.as_u16()
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| NeptuneError::auth(format!("Unreadable token response: {}", e)))?;

        match (body.access_token, body.error) {
            (Some(token), None) if !token.is_empty() => Ok(token),
            (_, Some(error)) => Err(NeptuneError::auth(format!(
                "{}: {}",
                error,
                body.error_description.unwrap_or_default()
            ))),
            _ => Err(NeptuneError::auth("Token response carried no access token")),
        }
    }
}

#[async_trait]
impl OAuthFlow for LoopbackOAuthFlow {
    async fn authorize(&self) -> Result<String> {
        let listener = TcpListener::bind(("127.0.0.1", 0))
            .await
            .map_err(|e| NeptuneError::auth(format!("Failed to bind callback port: {}", e)))?;
        let port = listener.local_addr()?.port();
        let redirect_uri = format!("http://localhost:{}{}", port, CALLBACK_PATH);
        let state = make_state();

        let url = self.authorization_url(&redirect_uri, &state)?;
        tracing::info!(port, "Opening browser for GitHub sign-in");
        self.browser.open(&url)?;

        let code = tokio::time::timeout(self.config.timeout, wait_for_callback(listener, state))
            .await
            .map_err(|_| NeptuneError::auth("OAuth timeout - no response received"))??;
        tracing::debug!("Received authorization code");

        self.exchange_code(&code, &redirect_uri).await
    }
}

/// 16 random bytes, hex encoded.
fn make_state() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[derive(Clone)]
struct CallbackState {
    expected_state: Arc<str>,
    outcome: Arc<Mutex<Option<oneshot::Sender<Result<String>>>>>,
}

/// Serves `/callback` on `listener` until the first hit, then returns its code.
///
/// Other paths (favicon requests and the like) get a 404 and do not end the
/// wait. The server stops when this future completes or is dropped.
pub(crate) async fn wait_for_callback(listener: TcpListener, expected_state: String) -> Result<String> {
    let (tx, rx) = oneshot::channel();
    let app = Router::new()
        .route(CALLBACK_PATH, get(handle_callback))
        .with_state(CallbackState {
            expected_state: Arc::from(expected_state),
            outcome: Arc::new(Mutex::new(Some(tx))),
        });

    tokio::select! {
        outcome = rx => outcome
            .map_err(|_| NeptuneError::auth("Callback server stopped before a response"))?,
        served = axum::serve(listener, app) => {
            let reason = served.err().map(|e| e.to_string()).unwrap_or_default();
            Err(NeptuneError::auth(format!("Callback listener failed: {}", reason)))
        }
    }
}

async fn handle_callback(
    State(callback): State<CallbackState>,
    Query(params): Query<CallbackParams>,
) -> Html<&'static str> {
    let outcome = callback_code(params, &callback.expected_state);
    let page = if outcome.is_ok() { SUCCESS_PAGE } else { FAILURE_PAGE };

    let sender = callback
        .outcome
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take();
    match sender {
        Some(sender) => {
            let _ = sender.send(outcome);
        }
        None => tracing::debug!("Ignoring repeated OAuth callback"),
    }
    Html(page)
}

fn callback_code(params: CallbackParams, expected_state: &str) -> Result<String> {
    if let Some(error) = params.error {
        return Err(NeptuneError::auth(format!("Authorization denied: {}", error)));
    }
    if params.state.as_deref() != Some(expected_state) {
        return Err(NeptuneError::auth("State mismatch in OAuth callback"));
    }
    params
        .code
        .filter(|code| !code.is_empty())
        .ok_or_else(|| NeptuneError::auth("OAuth callback carried no code"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn get_page(port: u16, target: &str) -> (u16, String) {
        let response = reqwest::get(format!("http://127.0.0.1:{}{}", port, target))
            .await
            .unwrap();
        let status = response.status().as_u16();
        (status, response.text().await.unwrap())
    }

    /// Browser stand-in that follows the redirect itself.
    struct CallbackBrowser {
        code: &'static str,
        opened: Mutex<Vec<String>>,
    }

    impl BrowserOpener for CallbackBrowser {
        fn open(&self, url: &str) -> Result<()> {
            self.opened.lock().unwrap().push(url.to_string());
            let url = Url::parse(url).unwrap();
            let param = |name: &str| {
                url.query_pairs()
                    .find(|(k, _)| k == name)
                    .map(|(_, v)| v.into_owned())
                    .unwrap()
            };
            let redirect = Url::parse(&param("redirect_uri")).unwrap();
            let port = redirect.port().unwrap();
            let target = format!("{}?code={}&state={}", redirect.path(), self.code, param("state"));
            tokio::spawn(async move {
                get_page(port, &target).await;
            });
            Ok(())
        }
    }

    struct IdleBrowser;

    impl BrowserOpener for IdleBrowser {
        fn open(&self, _url: &str) -> Result<()> {
            Ok(())
        }
    }

    fn flow_with(browser: Arc<dyn BrowserOpener>, token_url: &str) -> LoopbackOAuthFlow {
        let config = OAuthConfig::github("cid", "csecret")
            .with_token_url(token_url)
            .with_timeout(Duration::from_secs(5));
        LoopbackOAuthFlow::new(config, browser)
    }

    async fn bound() -> (TcpListener, u16) {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, port)
    }

    #[test]
    fn test_state_is_32_hex_chars() {
        let state = make_state();
        assert_eq!(state.len(), 32);
        assert!(state.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(state, make_state());
    }

    #[test]
    fn test_authorization_url_carries_parameters() {
        let flow = flow_with(Arc::new(IdleBrowser), "http://unused");
        let url = flow
            .authorization_url("http://localhost:4321/callback", "abc")
            .unwrap();
        let parsed = Url::parse(&url).unwrap();
        let pairs: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();

        assert!(url.starts_with(GITHUB_AUTHORIZE_URL));
        assert!(pairs.contains(&("client_id".to_string(), "cid".to_string())));
        assert!(pairs.contains(&("scope".to_string(), "repo read:org".to_string())));
        assert!(pairs.contains(&(
            "redirect_uri".to_string(),
            "http://localhost:4321/callback".to_string()
        )));
        assert!(pairs.contains(&("state".to_string(), "abc".to_string())));
    }

    #[tokio::test]
    async fn test_wait_for_callback_skips_other_paths() {
        let (listener, port) = bound().await;

        let client = tokio::spawn(async move {
            let favicon = get_page(port, "/favicon.ico").await;
            let callback = get_page(port, "/callback?code=xyz&state=s1").await;
            (favicon, callback)
        });

        let code = wait_for_callback(listener, "s1".to_string()).await.unwrap();
        let (favicon, callback) = client.await.unwrap();

        assert_eq!(code, "xyz");
        assert_eq!(favicon.0, 404);
        assert_eq!(callback.0, 200);
        assert!(callback.1.contains("Signed in to Neptune"));
    }

    #[tokio::test]
    async fn test_wait_for_callback_rejects_state_mismatch() {
        let (listener, port) = bound().await;

        let client =
            tokio::spawn(async move { get_page(port, "/callback?code=xyz&state=forged").await });

        let err = wait_for_callback(listener, "s1".to_string()).await.unwrap_err();
        let (_, page) = client.await.unwrap();

        assert!(err.is_auth());
        assert!(page.contains("Sign-in failed"));
    }

    #[tokio::test]
    async fn test_wait_for_callback_reports_denied_authorization() {
        let (listener, port) = bound().await;

        let client = tokio::spawn(async move {
            get_page(port, "/callback?error=access_denied&state=s1").await
        });

        let err = wait_for_callback(listener, "s1".to_string()).await.unwrap_err();
        client.await.unwrap();
        assert!(err.to_string().contains("access_denied"));
    }

    #[tokio::test]
    async fn test_callback_over_http_1_0_is_accepted() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let (listener, port) = bound().await;

        let client = tokio::spawn(async move {
            let mut stream = tokio::net::TcpStream::connect(("127.0.0.1", port)).await.unwrap();
            // Request line split across two writes
            stream.write_all(b"GET /callback?code=old&sta").await.unwrap();
            stream.flush().await.unwrap();
            stream.write_all(b"te=s1 HTTP/1.0\r\n\r\n").await.unwrap();
            let mut response = String::new();
            stream.read_to_string(&mut response).await.unwrap();
            response
        });

        let code = wait_for_callback(listener, "s1".to_string()).await.unwrap();
        let response = client.await.unwrap();

        assert_eq!(code, "old");
        assert!(response.contains("200 OK"));
    }

    #[test]
    fn test_callback_without_code_fails() {
        let params = CallbackParams {
            state: Some("s1".to_string()),
            ..CallbackParams::default()
        };
        assert!(callback_code(params, "s1").unwrap_err().is_auth());
    }

    #[tokio::test]
    async fn test_authorize_end_to_end() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login/oauth/access_token"))
            .and(body_partial_json(serde_json::json!({
                "client_id": "cid",
                "code": "the-code"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "gho_token",
                "token_type": "bearer",
                "scope": "repo,read:org"
            })))
            .mount(&mock_server)
            .await;

        let browser = Arc::new(CallbackBrowser {
            code: "the-code",
            opened: Mutex::new(Vec::new()),
        });
        let flow = flow_with(
            browser.clone(),
            &format!("{}/login/oauth/access_token", mock_server.uri()),
        );

        let token = flow.authorize().await.unwrap();

        assert_eq!(token, "gho_token");
        assert_eq!(browser.opened.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_authorize_times_out_without_callback() {
        let config = OAuthConfig::github("cid", "csecret").with_timeout(Duration::from_millis(100));
        let flow = LoopbackOAuthFlow::new(config, Arc::new(IdleBrowser));

        let err = flow.authorize().await.unwrap_err();

        assert!(err.is_auth());
        assert!(err.to_string().contains("timeout"));
    }

    #[tokio::test]
    async fn test_exchange_code_surfaces_github_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": "bad_verification_code",
                "error_description": "The code passed is incorrect or expired."
            })))
            .mount(&mock_server)
            .await;

        let flow = flow_with(Arc::new(IdleBrowser), &mock_server.uri());
        let err = flow
            .exchange_code("stale", "http://localhost:1/callback")
            .await
            .unwrap_err();

        assert!(err.is_auth());
        assert!(err.to_string().contains("bad_verification_code"));
    }
}
