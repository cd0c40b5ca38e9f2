// Cache store for reading and writing cached datasets.
// Handles JSON serialization, atomic writes, and the get-or-compute contract.

use std::fs;
use std::future::Future;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::debug;

use super::paths::entry_path;
use crate::error::Result;

/// Wrapper for cached data with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    /// The cached data.
    pub data: T,
    /// When the data was cached.
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }
}

/// Durable key/value store with one JSON file per key.
///
/// Entries never expire. A stored value is replaced only when a caller
/// forces recomputation or the entry is missing.
#[derive(Debug, Clone)]
pub struct KeyedCache {
    root: PathBuf,
}

impl KeyedCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load the entry stored under `key`. A missing file is `Ok(None)`.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<CachedData<T>>> {
        let path = entry_path(&self.root, key);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let cached: CachedData<T> = serde_json::from_str(&contents)?;
        Ok(Some(cached))
    }

    /// Persist `data` under `key`, replacing any previous entry.
    pub fn store<T: Serialize>(&self, key: &str, data: &T) -> Result<()> {
        fs::create_dir_all(&self.root)?;

        let path = entry_path(&self.root, key);
        let json = serde_json::to_string(&CachedData::new(data))?;

        // Write atomically via temp file
        let temp_path = path.with_extension("tmp");
        if let Err(e) = write_then_rename(&temp_path, &path, json.as_bytes()) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }

        debug!(key, path = %path.display(), "stored cache entry");
        Ok(())
    }

    /// Return the entry under `key`, computing and storing it when `force`
    /// is set or nothing is stored yet.
    ///
    /// A failed `compute` leaves the existing entry untouched.
    pub async fn get_or_compute<T, F, Fut>(&self, key: &str, force: bool, compute: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if !force {
            if let Some(cached) = self.load::<T>(key)? {
                let age = Utc::now().signed_duration_since(cached.cached_at);
                debug!(key, age_secs = age.num_seconds(), "cache hit");
                return Ok(cached.data);
            }
            debug!(key, "cache miss");
        }

        let data = compute().await?;
        self.store(key, &data)?;
        Ok(data)
    }
}

fn write_then_rename(temp_path: &Path, path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(temp_path)?;
    file.write_all(contents)?;
    file.sync_all()?;
    fs::rename(temp_path, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tempfile::TempDir;

    use crate::error::SlackstatError;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct TestData {
        name: String,
        value: i32,
    }

    fn sample() -> TestData {
        TestData {
            name: "general".to_string(),
            value: 42,
        }
    }

    #[test]
    fn test_store_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let cache = KeyedCache::new(temp_dir.path().join("cache"));

        cache.store("channels", &sample()).unwrap();

        let cached: CachedData<TestData> = cache.load("channels").unwrap().unwrap();
        assert_eq!(cached.data, sample());
        assert!(temp_dir.path().join("cache/channels.json").exists());
        assert!(!temp_dir.path().join("cache/channels.tmp").exists());
    }

    #[test]
    fn test_failed_store_removes_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let cache = KeyedCache::new(temp_dir.path());
        // A non-empty directory in place of the entry makes the rename fail.
        let blocker = temp_dir.path().join("channels.json");
        fs::create_dir_all(blocker.join("occupied")).unwrap();

        assert!(cache.store("channels", &sample()).is_err());
        assert!(!temp_dir.path().join("channels.tmp").exists());
        assert!(blocker.is_dir());
    }

    #[test]
    fn test_load_nonexistent() {
        let temp_dir = TempDir::new().unwrap();
        let cache = KeyedCache::new(temp_dir.path());

        let cached: Option<CachedData<TestData>> = cache.load("missing").unwrap();
        assert!(cached.is_none());
    }

    #[test]
    fn test_load_corrupt_entry_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let cache = KeyedCache::new(temp_dir.path());
        fs::write(temp_dir.path().join("broken.json"), "{not json").unwrap();

        let result = cache.load::<TestData>("broken");
        assert!(matches!(result, Err(SlackstatError::Json(_))));
    }

    #[tokio::test]
    async fn test_miss_computes_once() {
        let temp_dir = TempDir::new().unwrap();
        let cache = KeyedCache::new(temp_dir.path());
        let calls = Cell::new(0);

        for _ in 0..2 {
            let data = cache
                .get_or_compute("userlist", false, || async {
                    calls.set(calls.get() + 1);
                    Ok(sample())
                })
                .await
                .unwrap();
            assert_eq!(data, sample());
        }

        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn test_force_overwrites_entry() {
        let temp_dir = TempDir::new().unwrap();
        let cache = KeyedCache::new(temp_dir.path());
        cache.store("userlist", &sample()).unwrap();

        let fresh = TestData {
            name: "random".to_string(),
            value: 7,
        };
        let data = cache
            .get_or_compute("userlist", true, || async { Ok(fresh.clone()) })
            .await
            .unwrap();
        assert_eq!(data, fresh);

        let cached: CachedData<TestData> = cache.load("userlist").unwrap().unwrap();
        assert_eq!(cached.data, fresh);
    }

    #[tokio::test]
    async fn test_failed_compute_keeps_previous_entry() {
        let temp_dir = TempDir::new().unwrap();
        let cache = KeyedCache::new(temp_dir.path());
        cache.store("channels", &sample()).unwrap();

        let result = cache
            .get_or_compute::<TestData, _, _>("channels", true, || async {
                Err(SlackstatError::Api {
                    method: "conversations.list".to_string(),
                    error: "ratelimited".to_string(),
                })
            })
            .await;
        assert!(result.is_err());

        let cached: CachedData<TestData> = cache.load("channels").unwrap().unwrap();
        assert_eq!(cached.data, sample());
    }

    #[tokio::test]
    async fn test_failed_compute_on_miss_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let cache = KeyedCache::new(temp_dir.path());

        let result = cache
            .get_or_compute::<TestData, _, _>("channels", false, || async {
                Err(SlackstatError::Other("offline".to_string()))
            })
            .await;
        assert!(result.is_err());
        assert!(cache.load::<TestData>("channels").unwrap().is_none());
    }
}
