//! Durable JSON file storage with atomic writes.
//!
//! The whole store is one JSON object of key to string value. Every mutation
//! is a locked read-modify-write, so several processes sharing the file see
//! each other's drafts the way browser tabs share origin storage.

use super::insert_within_quota;
use recdraft_core::draft::KeyValueStorage;
use recdraft_core::error::{DraftError, Result};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};

type Items = BTreeMap<String, String>;

/// A handle to a durable key/value JSON file.
///
/// Provides:
/// - **Atomicity**: Updates are all-or-nothing via tmp file + atomic rename
/// - **Isolation**: File locking serializes concurrent read-modify-write cycles
/// - **Durability**: Explicit fsync before rename
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
    quota_bytes: Option<u64>,
}

impl JsonFileStorage {
    /// Creates a new storage handle. The file is created on first write.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            quota_bytes: None,
        }
    }

    /// Rejects writes that would push the total size past `quota_bytes`.
    pub fn with_quota(mut self, quota_bytes: Option<u64>) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads all items.
    ///
    /// # Returns
    ///
    /// - `Ok(items)`: Parsed items; empty when the file is missing or blank
    /// - `Err`: Failed to read or parse the file
    fn load(&self) -> Result<Items> {
        if !self.path.exists() {
            return Ok(Items::new());
        }

        let content = fs::read_to_string(&self.path)?;

        if content.trim().is_empty() {
            return Ok(Items::new());
        }

        Ok(serde_json::from_str(&content)?)
    }

    /// Writes all items atomically.
    fn save(&self, items: &Items) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(items)?;

        // Write to temporary file in the same directory
        let tmp_path = self.temp_path()?;
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(json.as_bytes())?;

        // Ensure data is written to disk
        tmp_file.sync_all()?;
        drop(tmp_file);

        // Atomic rename
        fs::rename(&tmp_path, &self.path)?;

        Ok(())
    }

    /// Performs a transactional update under the file lock.
    ///
    /// A file that no longer parses is replaced rather than left blocking
    /// every future write.
    fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut Items) -> Result<()>,
    {
        let _lock = FileLock::acquire(&self.path)?;

        let mut items = match self.load() {
            Ok(items) => items,
            Err(e) if e.is_serialization() => {
                tracing::warn!(
                    target: "draft_store",
                    "Draft file {:?} is corrupt, starting over: {}",
                    self.path,
                    e
                );
                Items::new()
            }
            Err(e) => return Err(e),
        };

        f(&mut items)?;
        self.save(&items)
    }

    fn temp_path(&self) -> Result<PathBuf> {
        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| DraftError::io(format!("Path has no file name: {:?}", self.path)))?;

        let tmp_name = format!(".{}.tmp", file_name.to_string_lossy());
        Ok(self.path.with_file_name(tmp_name))
    }
}

impl KeyValueStorage for JsonFileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let quota = self.quota_bytes;
        self.update(|items| insert_within_quota(items, key, value, quota))
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        self.update(|items| {
            items.remove(key);
            Ok(())
        })
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.load()?.into_keys().collect())
    }
}

/// A file lock guard that automatically releases the lock when dropped.
struct FileLock {
    #[allow(dead_code)]
    file: File,
}

impl FileLock {
    /// Acquires an exclusive lock next to `path`.
    fn acquire(path: &Path) -> Result<Self> {
        let lock_path = path.with_extension("lock");

        if let Some(parent) = lock_path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        use fs2::FileExt;
        file.lock_exclusive()
            .map_err(|e| DraftError::storage(format!("Failed to acquire lock: {}", e)))?;

        Ok(FileLock { file })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        use fs2::FileExt;
        let _ = self.file.unlock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_get_remove() {
        let temp_dir = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(temp_dir.path().join("drafts.json"));

        storage.set_item("recdraft:lease:marker", "{\"recordId\":42}").unwrap();

        assert_eq!(
            storage.get_item("recdraft:lease:marker").unwrap(),
            Some("{\"recordId\":42}".to_string())
        );
        storage.remove_item("recdraft:lease:marker").unwrap();
        assert_eq!(storage.get_item("recdraft:lease:marker").unwrap(), None);
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(temp_dir.path().join("nonexistent.json"));

        assert_eq!(storage.get_item("any").unwrap(), None);
        assert!(storage.keys().unwrap().is_empty());
        assert!(storage.remove_item("any").is_ok());
    }

    #[test]
    fn test_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("drafts.json");

        JsonFileStorage::new(path.clone())
            .set_item("a", "1")
            .unwrap();
        let reopened = JsonFileStorage::new(path);

        assert_eq!(reopened.get_item("a").unwrap(), Some("1".to_string()));
    }

    #[test]
    fn test_two_handles_share_writes() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("drafts.json");
        let tab_a = JsonFileStorage::new(path.clone());
        let tab_b = JsonFileStorage::new(path);

        tab_a.set_item("a", "1").unwrap();
        tab_b.set_item("b", "2").unwrap();

        let mut keys = tab_a.keys().unwrap();
        keys.sort();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_corrupt_file_is_read_error_but_writable() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("drafts.json");
        fs::write(&path, "{ not json").unwrap();
        let storage = JsonFileStorage::new(path);

        assert!(storage.get_item("a").unwrap_err().is_serialization());

        storage.set_item("a", "1").unwrap();
        assert_eq!(storage.get_item("a").unwrap(), Some("1".to_string()));
    }

    #[test]
    fn test_quota() {
        let temp_dir = TempDir::new().unwrap();
        let storage =
            JsonFileStorage::new(temp_dir.path().join("drafts.json")).with_quota(Some(8));

        storage.set_item("k", "1234").unwrap();
        let err = storage.set_item("k2", "123456").unwrap_err();

        assert!(matches!(err, DraftError::QuotaExceeded { .. }));
        assert_eq!(storage.get_item("k2").unwrap(), None);
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("drafts.json");
        let storage = JsonFileStorage::new(path.clone());

        storage.set_item("a", "1").unwrap();

        assert!(!temp_dir.path().join(".drafts.json.tmp").exists());
        assert!(path.exists());
    }
}
