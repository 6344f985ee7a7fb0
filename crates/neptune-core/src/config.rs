//! Configuration models.
//!
//! `RootConfig` lives in `config.toml`, `SecretConfig` in `secret.json` and
//! `AuthorConfig` in `author.json`, all under the Neptune config directory.

use serde::{Deserialize, Serialize};

pub const DEFAULT_STORE_KEY: &str = "neptune-v1";
pub const DEFAULT_GITHUB_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_OAUTH_TIMEOUT_SECS: u64 = 60;

/// Root of `config.toml`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct RootConfig {
    /// Default tracing filter when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub github: GitHubSettings,
}

impl Default for RootConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            store: StoreSettings::default(),
            github: GitHubSettings::default(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct StoreSettings {
    /// Key the store projection is saved under in `neptune.json`.
    #[serde(default = "default_store_key")]
    pub key: String,
    /// Report operations on unknown ids instead of ignoring them.
    #[serde(default)]
    pub strict: bool,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            key: default_store_key(),
            strict: false,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct GitHubSettings {
    #[serde(default = "default_github_api_base")]
    pub api_base: String,
    #[serde(default = "default_oauth_timeout_secs")]
    pub oauth_timeout_secs: u64,
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            api_base: default_github_api_base(),
            oauth_timeout_secs: default_oauth_timeout_secs(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_store_key() -> String {
    DEFAULT_STORE_KEY.to_string()
}

fn default_github_api_base() -> String {
    DEFAULT_GITHUB_API_BASE.to_string()
}

fn default_oauth_timeout_secs() -> u64 {
    DEFAULT_OAUTH_TIMEOUT_SECS
}

/// Root of `secret.json`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct SecretConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<GitHubOAuthSecret>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supabase: Option<SupabaseSecret>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct GitHubOAuthSecret {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct SupabaseSecret {
    pub url: String,
    pub anon_key: String,
}

/// Commit author identity used when Neptune writes commits.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorConfig {
    pub author_name: String,
    pub author_email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: RootConfig = toml::from_str("").unwrap();
        assert_eq!(config, RootConfig::default());
        assert_eq!(config.store.key, "neptune-v1");
        assert_eq!(config.github.oauth_timeout_secs, 60);
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let config: RootConfig = toml::from_str(
            r#"
            log_level = "debug"

            [store]
            strict = true
            "#,
        )
        .unwrap();

        assert_eq!(config.log_level, "debug");
        assert!(config.store.strict);
        assert_eq!(config.store.key, DEFAULT_STORE_KEY);
        assert_eq!(config.github.api_base, DEFAULT_GITHUB_API_BASE);
    }

    #[test]
    fn test_secret_config_omits_missing_sections() {
        let json = serde_json::to_string(&SecretConfig::default()).unwrap();
        assert_eq!(json, "{}");
    }
}
