//! Secret configuration file storage.
//!
//! Provides loading of `secret.json` (OAuth client credentials and backend
//! keys) with environment variable overrides.

use neptune_core::config::{GitHubOAuthSecret, SecretConfig, SupabaseSecret};
use std::fs;
use std::path::PathBuf;

pub const ENV_GITHUB_CLIENT_ID: &str = "NEPTUNE_GITHUB_CLIENT_ID";
pub const ENV_GITHUB_CLIENT_SECRET: &str = "NEPTUNE_GITHUB_CLIENT_SECRET";
pub const ENV_SUPABASE_URL: &str = "NEPTUNE_SUPABASE_URL";
pub const ENV_SUPABASE_ANON_KEY: &str = "NEPTUNE_SUPABASE_ANON_KEY";

/// Errors that can occur during secret storage operations.
#[derive(Debug)]
pub enum SecretStorageError {
    /// Configuration file not found.
    NotFound(PathBuf),
    /// File I/O error.
    IoError(std::io::Error),
    /// JSON parsing error.
    ParseError(serde_json::Error),
}

impl std::fmt::Display for SecretStorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecretStorageError::NotFound(path) => {
                write!(f, "Secret file not found at: {}", path.display())
            }
            SecretStorageError::IoError(e) => write!(f, "I/O error: {}", e),
            SecretStorageError::ParseError(e) => write!(f, "JSON parse error: {}", e),
        }
    }
}

impl std::error::Error for SecretStorageError {}

impl From<std::io::Error> for SecretStorageError {
    fn from(e: std::io::Error) -> Self {
        SecretStorageError::IoError(e)
    }
}

impl From<serde_json::Error> for SecretStorageError {
    fn from(e: serde_json::Error) -> Self {
        SecretStorageError::ParseError(e)
    }
}

/// Storage for the secret configuration file (secret.json).
///
/// Read-only: Neptune never writes this file, the user does.
///
/// # Security Note
///
/// This storage reads plaintext JSON files. The secret.json file should have
/// appropriate file permissions (e.g., 600) to prevent unauthorized access.
pub struct SecretStorage {
    path: PathBuf,
}

impl SecretStorage {
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Loads the secret configuration from the JSON file.
    ///
    /// # Returns
    ///
    /// - `Ok(SecretConfig)`: Successfully loaded and parsed
    /// - `Err(SecretStorageError::NotFound)`: File doesn't exist
    /// - `Err(SecretStorageError::IoError)`: Failed to read file
    /// - `Err(SecretStorageError::ParseError)`: Invalid JSON format
    pub fn load(&self) -> Result<SecretConfig, SecretStorageError> {
        if !self.path.exists() {
            return Err(SecretStorageError::NotFound(self.path.clone()));
        }

        let content = fs::read_to_string(&self.path)?;
        let config = serde_json::from_str(&content)?;

        Ok(config)
    }

    /// Loads the file (missing file means empty config) and applies the
    /// process environment on top.
    pub fn load_with_env(&self) -> Result<SecretConfig, SecretStorageError> {
        let config = match self.load() {
            Ok(config) => config,
            Err(SecretStorageError::NotFound(path)) => {
                tracing::debug!(?path, "No secret file, relying on environment");
                SecretConfig::default()
            }
            Err(e) => return Err(e),
        };
        Ok(apply_overrides(config, |name| std::env::var(name).ok()))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

/// Overlays variables from `lookup` on `config`.
///
/// A section is created only when both of its values are available, either
/// from the file or from `lookup`.
pub fn apply_overrides<F>(mut config: SecretConfig, lookup: F) -> SecretConfig
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |name: &str| lookup(name).filter(|value| !value.is_empty());

    let client_id = lookup(ENV_GITHUB_CLIENT_ID)
        .or_else(|| config.github.as_ref().map(|g| g.client_id.clone()));
    let client_secret = lookup(ENV_GITHUB_CLIENT_SECRET)
        .or_else(|| config.github.as_ref().map(|g| g.client_secret.clone()));
    if let (Some(client_id), Some(client_secret)) = (client_id, client_secret) {
        config.github = Some(GitHubOAuthSecret {
            client_id,
            client_secret,
        });
    }

    let url = lookup(ENV_SUPABASE_URL).or_else(|| config.supabase.as_ref().map(|s| s.url.clone()));
    let anon_key = lookup(ENV_SUPABASE_ANON_KEY)
        .or_else(|| config.supabase.as_ref().map(|s| s.anon_key.clone()));
    if let (Some(url), Some(anon_key)) = (url, anon_key) {
        config.supabase = Some(SupabaseSecret { url, anon_key });
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_load_nonexistent_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("secret.json");
        let storage = SecretStorage::with_path(file_path.clone());

        match storage.load() {
            Err(SecretStorageError::NotFound(path)) => assert_eq!(path, file_path),
            other => panic!("Expected NotFound error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_valid_json() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("secret.json");
        fs::write(
            &file_path,
            r#"{
                "github": { "client_id": "cid", "client_secret": "shh" },
                "supabase": { "url": "https://db.example", "anon_key": "anon" }
            }"#,
        )
        .unwrap();

        let config = SecretStorage::with_path(file_path).load().unwrap();

        assert_eq!(config.github.unwrap().client_id, "cid");
        assert_eq!(config.supabase.unwrap().url, "https://db.example");
    }

    #[test]
    fn test_load_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("secret.json");
        fs::write(&file_path, "{ invalid json").unwrap();

        let result = SecretStorage::with_path(file_path).load();
        assert!(matches!(result, Err(SecretStorageError::ParseError(_))));
    }

    #[test]
    fn test_env_overrides_file_values() {
        let file = SecretConfig {
            github: Some(GitHubOAuthSecret {
                client_id: "file-id".to_string(),
                client_secret: "file-secret".to_string(),
            }),
            supabase: None,
        };
        let env: HashMap<&str, &str> = HashMap::from([(ENV_GITHUB_CLIENT_ID, "env-id")]);

        let merged = apply_overrides(file, |name| env.get(name).map(|v| v.to_string()));

        let github = merged.github.unwrap();
        assert_eq!(github.client_id, "env-id");
        assert_eq!(github.client_secret, "file-secret");
        assert!(merged.supabase.is_none());
    }

    #[test]
    fn test_env_alone_needs_both_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_SUPABASE_URL, "https://db.example"),
            (ENV_GITHUB_CLIENT_ID, "only-id"),
            (ENV_SUPABASE_ANON_KEY, "anon"),
        ]);

        let merged = apply_overrides(SecretConfig::default(), |name| {
            env.get(name).map(|v| v.to_string())
        });

        assert!(merged.github.is_none());
        assert_eq!(merged.supabase.unwrap().anon_key, "anon");
    }
}
