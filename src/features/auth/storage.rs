//! Key/value storage areas backing the session store. `FileStorage` is the
//! durable area and survives restarts; `MemoryStorage` lives as long as the
//! process, the equivalent of a browser tab.

use crate::api::AppError;
use std::{
    collections::BTreeMap,
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("storage lock poisoned")]
    Poisoned,
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err.to_string())
    }
}

pub trait StorageArea: Send + Sync {
    /// Returns the stored value for `key`, if any.
    ///
    /// # Errors
    /// Returns a [`StorageError`] when the backing store cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    /// Returns a [`StorageError`] when the backing store cannot be written.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    /// Returns a [`StorageError`] when the backing store cannot be written.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageArea for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let items = self.items.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.items.lock().map_err(|_| StorageError::Poisoned)?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut items = self.items.lock().map_err(|_| StorageError::Poisoned)?;
        items.remove(key);
        Ok(())
    }
}

/// JSON map persisted to a single file. Writes go through a temporary file
/// and a rename so a crash never leaves a half-written map behind.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    // A corrupt file is replaced on the next write instead of blocking it.
    fn read_map_for_write(&self) -> Result<(BTreeMap<String, String>, bool), StorageError> {
        match self.read_map() {
            Ok(map) => Ok((map, false)),
            Err(StorageError::Corrupt(err)) => {
                warn!(path = %self.path.display(), "replacing corrupt storage file: {err}");
                Ok((BTreeMap::new(), true))
            }
            Err(err) => Err(err),
        }
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp = self.path.with_extension("json.tmp");
        let mut file = create_owner_only(&tmp)?;
        file.write_all(&serde_json::to_vec_pretty(map)?)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn update(
        &self,
        apply: impl FnOnce(&mut BTreeMap<String, String>),
    ) -> Result<(), StorageError> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        let (mut map, _) = self.read_map_for_write()?;
        apply(&mut map);
        self.write_map(&map)
    }
}

impl StorageArea for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(self.read_map()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|map| {
            map.insert(key.to_string(), value.to_string());
        })
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        let (mut map, repaired) = self.read_map_for_write()?;
        if map.remove(key).is_some() || repaired {
            self.write_map(&map)?;
        }
        Ok(())
    }
}

// The file holds bearer tokens; it is owner-only from creation.
#[cfg(unix)]
fn create_owner_only(path: &Path) -> Result<fs::File, StorageError> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // A leftover temp file keeps its old mode.
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    Ok(file)
}

#[cfg(not(unix))]
fn create_owner_only(path: &Path) -> Result<fs::File, StorageError> {
    Ok(fs::File::create(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_storage_round_trip() -> Result<(), StorageError> {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get_item("k")?, None);

        storage.set_item("k", "v")?;
        assert_eq!(storage.get_item("k")?, Some("v".to_string()));

        storage.remove_item("k")?;
        assert_eq!(storage.get_item("k")?, None);
        Ok(())
    }

    #[test]
    fn file_storage_survives_reopen() -> Result<(), StorageError> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("storage.json");

        FileStorage::new(&path).set_item("k", "v")?;
        let reopened = FileStorage::new(&path);
        assert_eq!(reopened.get_item("k")?, Some("v".to_string()));

        reopened.remove_item("k")?;
        assert_eq!(FileStorage::new(&path).get_item("k")?, None);
        Ok(())
    }

    #[test]
    fn file_storage_missing_file_is_empty() -> Result<(), StorageError> {
        let dir = tempfile::tempdir()?;
        let storage = FileStorage::new(dir.path().join("absent.json"));
        assert_eq!(storage.get_item("k")?, None);
        storage.remove_item("k")?;
        assert!(!storage.path().exists());
        Ok(())
    }

    #[test]
    fn file_storage_reports_corruption() -> Result<(), StorageError> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("storage.json");
        fs::write(&path, "{not json")?;

        let storage = FileStorage::new(&path);
        assert!(matches!(storage.get_item("k"), Err(StorageError::Corrupt(_))));
        Ok(())
    }

    #[test]
    fn file_storage_replaces_corrupt_file_on_write() -> Result<(), StorageError> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("storage.json");
        fs::write(&path, "{broken")?;

        let storage = FileStorage::new(&path);
        storage.set_item("k", "v")?;
        assert_eq!(storage.get_item("k")?, Some("v".to_string()));
        Ok(())
    }

    #[test]
    fn file_storage_remove_repairs_corrupt_file() -> Result<(), StorageError> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("storage.json");
        fs::write(&path, "{broken")?;

        let storage = FileStorage::new(&path);
        storage.remove_item("k")?;
        assert_eq!(storage.get_item("k")?, None);
        assert_eq!(fs::read_to_string(&path)?.trim(), "{}");
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn file_storage_is_owner_only() -> Result<(), StorageError> {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir()?;
        let path = dir.path().join("storage.json");
        FileStorage::new(&path).set_item("k", "v")?;

        let mode = fs::metadata(&path)?.permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn leftover_temp_file_does_not_widen_permissions() -> Result<(), StorageError> {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir()?;
        let path = dir.path().join("storage.json");
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, "stale")?;
        fs::set_permissions(&tmp, fs::Permissions::from_mode(0o644))?;

        FileStorage::new(&path).set_item("k", "v")?;

        let mode = fs::metadata(&path)?.permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
        assert!(!tmp.exists());
        Ok(())
    }
}
