//! Storage layer for atomic file operations and key-value persistence.

mod atomic_file;
mod key_value;
mod secret_storage;

pub use atomic_file::{AtomicFile, AtomicFileError, FileFormat};
pub use key_value::{JsonFileKeyValueStore, MemoryKeyValueStore};
pub use secret_storage::{
    ENV_GITHUB_CLIENT_ID, ENV_GITHUB_CLIENT_SECRET, ENV_SUPABASE_ANON_KEY, ENV_SUPABASE_URL,
    SecretStorage, SecretStorageError, apply_overrides,
};
