//! Atomic JSON/TOML file operations.
//!
//! Provides a thin layer for safe access to the small documents Neptune keeps
//! on disk.

use serde::{Serialize, de::DeserializeOwned};
use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// On-disk encoding of an [`AtomicFile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Toml,
}

/// Errors that can occur during atomic file operations.
#[derive(Debug)]
pub enum AtomicFileError {
    /// File I/O error.
    IoError(std::io::Error),
    /// JSON serialization/deserialization error.
    JsonError(serde_json::Error),
    /// TOML deserialization error.
    TomlError(toml::de::Error),
    /// TOML serialization error.
    TomlSerError(toml::ser::Error),
    /// File locking error.
    LockError(String),
}

impl std::fmt::Display for AtomicFileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AtomicFileError::IoError(e) => write!(f, "I/O error: {}", e),
            AtomicFileError::JsonError(e) => write!(f, "JSON error: {}", e),
            AtomicFileError::TomlError(e) => write!(f, "TOML parse error: {}", e),
            AtomicFileError::TomlSerError(e) => write!(f, "TOML serialization error: {}", e),
            AtomicFileError::LockError(e) => write!(f, "Lock error: {}", e),
        }
    }
}

impl std::error::Error for AtomicFileError {}

impl From<std::io::Error> for AtomicFileError {
    fn from(e: std::io::Error) -> Self {
        AtomicFileError::IoError(e)
    }
}

impl From<serde_json::Error> for AtomicFileError {
    fn from(e: serde_json::Error) -> Self {
        AtomicFileError::JsonError(e)
    }
}

impl From<toml::de::Error> for AtomicFileError {
    fn from(e: toml::de::Error) -> Self {
        AtomicFileError::TomlError(e)
    }
}

impl From<toml::ser::Error> for AtomicFileError {
    fn from(e: toml::ser::Error) -> Self {
        AtomicFileError::TomlSerError(e)
    }
}

impl From<AtomicFileError> for neptune_core::NeptuneError {
    fn from(err: AtomicFileError) -> Self {
        use neptune_core::NeptuneError;
        match err {
            AtomicFileError::IoError(e) => e.into(),
            AtomicFileError::JsonError(e) => e.into(),
            AtomicFileError::TomlError(e) => e.into(),
            AtomicFileError::TomlSerError(e) => e.into(),
            AtomicFileError::LockError(message) => NeptuneError::io(message),
        }
    }
}

/// A handle to a document written with all-or-nothing semantics.
///
/// Provides:
/// - **Atomicity**: Updates are all-or-nothing via tmp file + atomic rename
/// - **Isolation**: File locking serializes read-modify-write cycles
/// - **Durability**: Explicit fsync before rename
pub struct AtomicFile<T> {
    path: PathBuf,
    format: FileFormat,
    owner_only: bool,
    _phantom: PhantomData<T>,
}

impl<T> AtomicFile<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: PathBuf, format: FileFormat) -> Self {
        Self {
            path,
            format,
            owner_only: false,
            _phantom: PhantomData,
        }
    }

    /// Restricts the file to user read/write (0600) on Unix after every save.
    pub fn owner_only(mut self) -> Self {
        self.owner_only = true;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads and deserializes the file.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(T))`: Successfully loaded and deserialized
    /// - `Ok(None)`: File doesn't exist or is empty
    /// - `Err`: Failed to read or parse the file
    pub fn load(&self) -> Result<Option<T>, AtomicFileError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;

        if content.trim().is_empty() {
            return Ok(None);
        }

        let data = match self.format {
            FileFormat::Json => serde_json::from_str(&content)?,
            FileFormat::Toml => toml::from_str(&content)?,
        };
        Ok(Some(data))
    }

    /// Saves data atomically via a temporary file and rename.
    pub fn save(&self, data: &T) -> Result<(), AtomicFileError> {
        if let Some(parent) = self.path.parent()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
        }

        let encoded = match self.format {
            FileFormat::Json => serde_json::to_string_pretty(data)?,
            FileFormat::Toml => toml::to_string_pretty(data)?,
        };

        // Write to temporary file in the same directory
        let tmp_path = self.get_temp_path()?;
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(encoded.as_bytes())?;

        // Ensure data is written to disk
        tmp_file.sync_all()?;
        drop(tmp_file);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if self.owner_only {
                fs::set_permissions(&tmp_path, fs::Permissions::from_mode(0o600))?;
            }
        }

        fs::rename(&tmp_path, &self.path)?;

        Ok(())
    }

    /// Performs a locked read-modify-write cycle.
    ///
    /// The update function receives the current data (or `default_value` when
    /// the file is missing) and its return value is passed through. The data
    /// is written back only if the function succeeds.
    pub fn update<F, R>(&self, default_value: T, f: F) -> Result<R, AtomicFileError>
    where
        F: FnOnce(&mut T) -> Result<R, AtomicFileError>,
    {
        let _lock = self.acquire_lock()?;

        let mut data = self.load()?.unwrap_or(default_value);
        let result = f(&mut data)?;
        self.save(&data)?;

        Ok(result)
    }

    /// Gets a temporary file path for atomic writes.
    fn get_temp_path(&self) -> Result<PathBuf, AtomicFileError> {
        let parent = self.path.parent().ok_or_else(|| {
            AtomicFileError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Path has no parent directory",
            ))
        })?;

        let file_name = self.path.file_name().ok_or_else(|| {
            AtomicFileError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Path has no file name",
            ))
        })?;

        let tmp_name = format!(".{}.tmp", file_name.to_string_lossy());
        Ok(parent.join(tmp_name))
    }

    fn acquire_lock(&self) -> Result<FileLock, AtomicFileError> {
        FileLock::acquire(&self.path)
    }
}

/// A file lock guard that automatically releases the lock when dropped.
struct FileLock {
    #[allow(dead_code)]
    file: File,
    lock_path: PathBuf,
}

impl FileLock {
    /// Acquires an exclusive lock on the given path.
    fn acquire(path: &Path) -> Result<Self, AtomicFileError> {
        let lock_path = path.with_extension("lock");

        if let Some(parent) = lock_path.parent()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        #[cfg(unix)]
        {
            use fs2::FileExt;
            file.lock_exclusive()
                .map_err(|e| AtomicFileError::LockError(format!("Failed to acquire lock: {}", e)))?;
        }

        Ok(FileLock { file, lock_path })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // Unlock happens when the handle closes; the lock file is best effort
        let _ = fs::remove_file(&self.lock_path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestConfig {
        name: String,
        count: u32,
    }

    fn sample() -> TestConfig {
        TestConfig {
            name: "test".to_string(),
            count: 42,
        }
    }

    #[test]
    fn test_save_and_load_json() {
        let temp_dir = TempDir::new().unwrap();
        let file = AtomicFile::<TestConfig>::new(temp_dir.path().join("t.json"), FileFormat::Json);

        file.save(&sample()).unwrap();

        assert_eq!(file.load().unwrap(), Some(sample()));
    }

    #[test]
    fn test_save_and_load_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("t.toml");
        let file = AtomicFile::<TestConfig>::new(path.clone(), FileFormat::Toml);

        file.save(&sample()).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("count = 42"));
        assert_eq!(file.load().unwrap(), Some(sample()));
    }

    #[test]
    fn test_load_nonexistent_or_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.json");
        let file = AtomicFile::<TestConfig>::new(path.clone(), FileFormat::Json);
        assert!(file.load().unwrap().is_none());

        fs::write(&path, "  \n").unwrap();
        assert!(file.load().unwrap().is_none());
    }

    #[test]
    fn test_load_invalid_json_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.json");
        fs::write(&path, "{ invalid").unwrap();

        let file = AtomicFile::<TestConfig>::new(path, FileFormat::Json);
        assert!(matches!(file.load(), Err(AtomicFileError::JsonError(_))));
    }

    #[test]
    fn test_update_creates_then_modifies() {
        let temp_dir = TempDir::new().unwrap();
        let file = AtomicFile::<BTreeMap<String, u32>>::new(
            temp_dir.path().join("nested/dir/map.json"),
            FileFormat::Json,
        );

        let previous = file
            .update(BTreeMap::new(), |map| Ok(map.insert("a".to_string(), 1)))
            .unwrap();
        assert!(previous.is_none());

        let previous = file
            .update(BTreeMap::new(), |map| Ok(map.insert("a".to_string(), 2)))
            .unwrap();
        assert_eq!(previous, Some(1));
        assert_eq!(file.load().unwrap().unwrap()["a"], 2);
    }

    #[test]
    fn test_failed_update_leaves_file_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let file = AtomicFile::<TestConfig>::new(temp_dir.path().join("t.json"), FileFormat::Json);
        file.save(&sample()).unwrap();

        let result: Result<(), _> = file.update(sample(), |config| {
            config.count = 0;
            Err(AtomicFileError::LockError("abort".to_string()))
        });

        assert!(result.is_err());
        assert_eq!(file.load().unwrap().unwrap().count, 42);
    }

    #[test]
    fn test_no_temp_or_lock_file_left_behind() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("t.json");
        let file = AtomicFile::<TestConfig>::new(path.clone(), FileFormat::Json);

        file.update(sample(), |_| Ok(())).unwrap();

        assert!(path.exists());
        assert!(!temp_dir.path().join(".t.json.tmp").exists());
        assert!(!temp_dir.path().join("t.lock").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_owner_only_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("secret.json");
        let file = AtomicFile::<TestConfig>::new(path.clone(), FileFormat::Json).owner_only();

        file.save(&sample()).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
