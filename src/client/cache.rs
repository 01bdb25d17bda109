//! Key/value persistence for the client, standing in for browser storage.

use serde_json::{Map, Value};
use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
    sync::{Mutex, RwLock},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Cache file is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),
}

/// Persisted client-side state keyed by strings such as `heroContent`.
pub trait LocalCache: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<Value>, CacheError>;

    fn store(&self, key: &str, value: &Value) -> Result<(), CacheError>;
}

/// Process-local cache; contents are lost when it is dropped.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalCache for MemoryCache {
    fn load(&self, key: &str) -> Result<Option<Value>, CacheError> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn store(&self, key: &str, value: &Value) -> Result<(), CacheError> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.clone());
        Ok(())
    }
}

/// All keys in one JSON object on disk. Writes go to a sibling temp file that
/// is renamed over the original.
#[derive(Debug)]
pub struct FileCache {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Map<String, Value>, CacheError> {
        match fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(Map::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl LocalCache for FileCache {
    fn load(&self, key: &str) -> Result<Option<Value>, CacheError> {
        Ok(self.read_all()?.remove(key))
    }

    fn store(&self, key: &str, value: &Value) -> Result<(), CacheError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.clone());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_cache_overwrites() {
        let cache = MemoryCache::new();
        assert!(cache.load("theme").unwrap().is_none());
        cache.store("theme", &json!("dark")).unwrap();
        cache.store("theme", &json!("light")).unwrap();
        assert_eq!(cache.load("theme").unwrap(), Some(json!("light")));
    }

    #[test]
    fn test_file_cache_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cache.json");

        let cache = FileCache::new(&path);
        cache.store("heroContent", &json!({ "name": "Ada" })).unwrap();
        cache.store("theme", &json!("dark")).unwrap();

        let reopened = FileCache::new(&path);
        assert_eq!(reopened.load("heroContent").unwrap(), Some(json!({ "name": "Ada" })));
        assert_eq!(reopened.load("theme").unwrap(), Some(json!("dark")));
        assert!(reopened.load("blogContent").unwrap().is_none());
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_file_cache_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(&path, b"{not json").unwrap();

        let cache = FileCache::new(&path);
        assert!(matches!(cache.load("theme"), Err(CacheError::Format(_))));
    }
}
