//! Infrastructure layer for Neptune.
//!
//! File and keychain implementations of the core persistence and credential traits,
//! the HTTP clients for GitHub and Supabase, the OAuth loopback flow, and the
//! `git` CLI reader.

pub mod author_config_service;
pub mod config_service;
pub mod credential_store;
pub mod dto;
pub mod git;
pub mod github;
pub mod oauth;
pub mod paths;
pub mod storage;
pub mod supabase;

pub use crate::author_config_service::AuthorConfigService;
pub use crate::config_service::ConfigService;
pub use crate::credential_store::{
    FileCredentialStore, KEYRING_SERVICE, KeyringCredentialStore, KeyringThenFileStore,
};
pub use crate::git::{GitLogReader, parse_git_log};
pub use crate::github::GitHubIdentityClient;
pub use crate::oauth::{LoopbackOAuthFlow, OAuthConfig, SystemBrowser};
pub use crate::paths::{NeptunePaths, ServiceType};
pub use crate::storage::{JsonFileKeyValueStore, MemoryKeyValueStore, SecretStorage};
pub use crate::supabase::SupabaseUserDirectory;
