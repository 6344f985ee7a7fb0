//! Authentication use case.
//!
//! Keeps the session slice in step with the credential store and the remote
//! identity provider:
//!
//! - absent credential: signed out, not an error
//! - invalid credential (rejected or unverifiable): wiped, then signed out
//! - flow failure: surfaced to the caller as an `Auth` error
//!
//! Credential store and user directory failures never abort a flow; they are
//! logged. A token that could not be saved still signs the session in, with
//! `has_token` left `false`.

use std::sync::Arc;

use neptune_core::auth::{CredentialStore, GITHUB_TOKEN_KEY, IdentityVerifier, OAuthFlow, UserDirectory};
use neptune_core::error::{NeptuneError, Result};
use neptune_core::user::User;

use crate::store::NeptuneStore;

pub struct AuthService {
    store: Arc<NeptuneStore>,
    credentials: Arc<dyn CredentialStore>,
    verifier: Arc<dyn IdentityVerifier>,
    oauth: Arc<dyn OAuthFlow>,
    directory: Arc<dyn UserDirectory>,
}

impl AuthService {
    pub fn new(
        store: Arc<NeptuneStore>,
        credentials: Arc<dyn CredentialStore>,
        verifier: Arc<dyn IdentityVerifier>,
        oauth: Arc<dyn OAuthFlow>,
        directory: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            store,
            credentials,
            verifier,
            oauth,
            directory,
        }
    }

    /// Restores the session from a stored token.
    ///
    /// Returns `true` when the stored token verified and the session now
    /// holds its user. This is also where `has_token` is resynchronised with
    /// the credential store.
    pub async fn try_auto_login(&self) -> bool {
        let token = match self.credentials.load_token(GITHUB_TOKEN_KEY).await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "Credential store unreadable, treating token as absent");
                None
            }
        };

        let Some(token) = token else {
            self.store.set_has_token(false);
            return false;
        };

        match self.verifier.verify(&token).await {
            Ok(Some(user)) => {
                tracing::info!(login = %user.login, "Restored session from stored token");
                self.sign_in(user, true).await;
                true
            }
            Ok(None) => {
                tracing::info!("Stored token was rejected, signing out");
                self.forget().await;
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not verify stored token, signing out");
                self.forget().await;
                false
            }
        }
    }

    /// Runs the interactive login and signs the session in.
    pub async fn login(&self) -> Result<User> {
        let token = self.oauth.authorize().await?;

        let stored = match self.credentials.save_token(GITHUB_TOKEN_KEY, &token).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to store token, session will not survive a restart");
                false
            }
        };

        let user = match self.verifier.verify(&token).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                self.forget().await;
                return Err(NeptuneError::auth("Issued token was rejected by GitHub"));
            }
            Err(e) => {
                self.forget().await;
                return Err(NeptuneError::auth(format!("Could not verify issued token: {}", e)));
            }
        };

        tracing::info!(login = %user.login, "Signed in");
        self.sign_in(user.clone(), stored).await;
        Ok(user)
    }

    /// Wipes the stored token and resets the session.
    pub async fn logout(&self) {
        self.forget().await;
        tracing::info!("Signed out");
    }

    async fn sign_in(&self, user: User, has_token: bool) {
        self.store.set_user(Some(user.clone()));
        self.store.set_has_token(has_token);

        let plan = self.store.session_view().plan;
        if let Err(e) = self.directory.upsert_user(&user, plan).await {
            tracing::warn!(user_id = %user.id, error = %e, "Failed to sync user row");
        }
    }

    async fn forget(&self) {
        if let Err(e) = self.credentials.remove_token(GITHUB_TOKEN_KEY).await {
            tracing::warn!(error = %e, "Failed to remove stored token");
        }
        self.store.clear_session();
    }
}
