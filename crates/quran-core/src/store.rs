//! Durable key-value storage for the reading state.
//!
//! Every persisted slice (preferences, bookmarks, memorization marks,
//! history, position, the corpus cache) is an independent JSON blob under
//! its own key. Reads never fail: anything unreadable is treated as absent.
//! Writes report `StorageUnavailable` and leave the in-memory state in charge.

use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};

/// Storage keys, shared with the web version of the reader.
pub mod keys {
    pub const PREFERENCES: &str = "quran_app_preferences";
    pub const BOOKMARKS: &str = "quran_bookmarks";
    pub const MEMORIZED: &str = "quran_memorized";
    pub const HISTORY: &str = "quran_history";
    pub const POSITION: &str = "quran_position";
    pub const CORPUS: &str = "quran_data";
}

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, blob: &str) -> Result<()>;
}

/// Read and deserialize a slice, returning `None` when it is missing or corrupt.
pub fn read_json<T, S>(store: &S, key: &str) -> Option<T>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    let blob = store.get(key)?;
    match serde_json::from_str(&blob) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Ignoring corrupt value under '{}': {}", key, e);
            None
        }
    }
}

pub fn write_json<T, S>(store: &mut S, key: &str, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let blob = serde_json::to_string(value)
        .map_err(|e| CoreError::StorageUnavailable(format!("serialize '{}': {}", key, e)))?;
    store.set(key, &blob)
}

/// One `<key>.json` file per key inside a data directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open the store in the default data directory.
    pub fn open_default() -> Result<Self> {
        let dir = Self::default_dir().ok_or_else(|| {
            CoreError::StorageUnavailable("could not determine a data directory".to_string())
        })?;
        Self::open(dir)
    }

    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            CoreError::StorageUnavailable(format!("create {}: {}", dir.display(), e))
        })?;
        log::debug!("File store opened at {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn default_dir() -> Option<PathBuf> {
        if let Ok(dir) = std::env::var("QURAN_READER_DATA_DIR") {
            return Some(PathBuf::from(dir).join("store"));
        }
        ProjectDirs::from("com", "quran-reader", "quran-reader")
            .map(|dirs| dirs.data_dir().join("store"))
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(CoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        let path = self.path_for(key).ok()?;
        match fs::read_to_string(&path) {
            Ok(blob) => Some(blob),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                log::warn!("Failed to read {}: {}", path.display(), e);
                None
            }
        }
    }

    fn set(&mut self, key: &str, blob: &str) -> Result<()> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, blob)
            .and_then(|_| fs::rename(&tmp, &path))
            .map_err(|e| CoreError::StorageUnavailable(format!("write {}: {}", path.display(), e)))
    }
}

/// In-process store. Used by tests and as the fallback when no data
/// directory can be created.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    failing: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `set` fail, as a full browser quota would.
    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, blob: &str) -> Result<()> {
        if self.failing {
            return Err(CoreError::StorageUnavailable(format!(
                "quota exceeded writing '{}'",
                key
            )));
        }
        self.entries.insert(key.to_string(), blob.to_string());
        Ok(())
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, blob: &str) -> Result<()> {
        (**self).set(key, blob)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store_roundtrip_and_failure() {
        let mut store = MemoryStore::new();
        assert!(store.get(keys::BOOKMARKS).is_none());

        write_json(&mut store, keys::BOOKMARKS, &vec![1, 2, 3]).unwrap();
        let back: Vec<u32> = read_json(&store, keys::BOOKMARKS).unwrap();
        assert_eq!(back, vec![1, 2, 3]);

        store.set_failing(true);
        let err = write_json(&mut store, keys::BOOKMARKS, &vec![4]).unwrap_err();
        assert!(matches!(err, CoreError::StorageUnavailable(_)));
        // The previous blob survives a failed write.
        let back: Vec<u32> = read_json(&store, keys::BOOKMARKS).unwrap();
        assert_eq!(back, vec![1, 2, 3]);
    }

    #[test]
    fn test_corrupt_json_reads_as_absent() {
        let mut store = MemoryStore::new();
        store.set(keys::HISTORY, "{not json").unwrap();
        let value: Option<Vec<u32>> = read_json(&store, keys::HISTORY);
        assert!(value.is_none());
    }

    #[test]
    fn test_file_store_persists_between_instances() {
        let dir = TempDir::new().unwrap();

        let mut store = FileStore::open(dir.path()).unwrap();
        store.set(keys::PREFERENCES, r#"{"fontSize":30}"#).unwrap();
        assert!(dir.path().join("quran_app_preferences.json").exists());

        let reopened = FileStore::open(dir.path()).unwrap();
        assert_eq!(
            reopened.get(keys::PREFERENCES).as_deref(),
            Some(r#"{"fontSize":30}"#)
        );
        assert!(reopened.get(keys::MEMORIZED).is_none());
    }

    #[test]
    fn test_file_store_rejects_path_like_keys() {
        let dir = TempDir::new().unwrap();
        let mut store = FileStore::open(dir.path()).unwrap();

        let err = store.set("../escape", "{}").unwrap_err();
        assert!(matches!(err, CoreError::InvalidKey(_)));
        assert!(store.get("../escape").is_none());
    }
}
