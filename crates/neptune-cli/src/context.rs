//! Wires the store and services from the config directory.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use neptune_application::{AuthService, NeptuneStore, RepoService, StoreOptions};
use neptune_core::auth::{NoopUserDirectory, OAuthFlow, UserDirectory};
use neptune_core::config::RootConfig;
use neptune_core::error::NeptuneError;
use neptune_core::state::KeyValueStore;
use neptune_infrastructure::storage::{ENV_GITHUB_CLIENT_ID, ENV_GITHUB_CLIENT_SECRET};
use neptune_infrastructure::{
    AuthorConfigService, ConfigService, GitHubIdentityClient, GitLogReader, JsonFileKeyValueStore,
    KEYRING_SERVICE, KeyringThenFileStore, LoopbackOAuthFlow, MemoryKeyValueStore, NeptunePaths, OAuthConfig,
    SecretStorage, ServiceType, SupabaseUserDirectory, SystemBrowser,
};

/// Login flow used when no OAuth client is configured.
struct UnconfiguredOAuth;

#[async_trait]
impl OAuthFlow for UnconfiguredOAuth {
    async fn authorize(&self) -> neptune_core::error::Result<String> {
        Err(NeptuneError::config(format!(
            "GitHub OAuth client is not configured; add it to secret.json or set {} and {}",
            ENV_GITHUB_CLIENT_ID, ENV_GITHUB_CLIENT_SECRET
        )))
    }
}

pub struct AppContext {
    pub paths: NeptunePaths,
    pub config: RootConfig,
    pub store: Arc<NeptuneStore>,
}

impl AppContext {
    /// Loads `config.toml` and rehydrates the store.
    ///
    /// With `ephemeral` the store lives in memory and nothing is written to
    /// `neptune.json`.
    pub async fn load(paths: NeptunePaths, config: RootConfig, ephemeral: bool) -> Result<Self> {
        let kv: Arc<dyn KeyValueStore> = if ephemeral {
            Arc::new(MemoryKeyValueStore::new())
        } else {
            Arc::new(JsonFileKeyValueStore::new(paths.get_path(ServiceType::Store)?))
        };
        let store = NeptuneStore::init(kv, StoreOptions::from(&config.store)).await;

        Ok(Self {
            paths,
            config,
            store: Arc::new(store),
        })
    }

    pub fn load_config(paths: &NeptunePaths) -> Result<RootConfig> {
        Ok(ConfigService::from_paths(paths)?.get_config())
    }

    pub fn auth_service(&self) -> Result<AuthService> {
        let secrets = SecretStorage::with_path(self.paths.get_path(ServiceType::Secret)?)
            .load_with_env()
            .context("Failed to read secret.json")?;

        let oauth: Arc<dyn OAuthFlow> = match &secrets.github {
            Some(github) => {
                let config = OAuthConfig::github(&github.client_id, &github.client_secret)
                    .with_timeout(Duration::from_secs(self.config.github.oauth_timeout_secs));
                Arc::new(LoopbackOAuthFlow::new(config, Arc::new(SystemBrowser)))
            }
            None => Arc::new(UnconfiguredOAuth),
        };

        let directory: Arc<dyn UserDirectory> = match &secrets.supabase {
            Some(supabase) => Arc::new(SupabaseUserDirectory::from_secret(supabase)),
            None => {
                tracing::debug!("Supabase not configured, user rows are not synced");
                Arc::new(NoopUserDirectory)
            }
        };

        Ok(AuthService::new(
            self.store.clone(),
            Arc::new(KeyringThenFileStore::new(
                KEYRING_SERVICE,
                self.paths.get_path(ServiceType::Credentials)?,
            )),
            Arc::new(GitHubIdentityClient::new(&self.config.github.api_base)),
            oauth,
            directory,
        ))
    }

    pub fn repo_service(&self) -> RepoService {
        RepoService::new(self.store.clone(), GitLogReader::default())
    }

    pub fn author_service(&self) -> Result<AuthorConfigService> {
        Ok(AuthorConfigService::new(self.paths.get_path(ServiceType::Author)?))
    }

    pub fn logs_dir(paths: &NeptunePaths) -> Result<PathBuf> {
        Ok(paths.get_path(ServiceType::Logs)?)
    }

    pub fn config_dir(&self) -> Result<PathBuf> {
        Ok(self.paths.config_dir()?)
    }
}
