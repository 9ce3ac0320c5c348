//! In-memory cache

use crate::cache::traits::{check_key, CacheError, CacheResult, ResourceCache};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

/// Cache keeping every entry in a map
///
/// Behaves like [`FsCache`](crate::cache::FsCache) with respect to empty
/// entries, so pipeline tests can run without touching the disk.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Bytes>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, empty ones included
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn poisoned(key: &str) -> CacheError {
        CacheError::Io {
            key: key.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::Other, "cache lock poisoned"),
        }
    }
}

#[async_trait]
impl ResourceCache for MemoryCache {
    async fn exists(&self, key: &str) -> CacheResult<bool> {
        check_key(key)?;
        let entries = self.entries.lock().map_err(|_| Self::poisoned(key))?;
        Ok(entries.get(key).is_some_and(|bytes| !bytes.is_empty()))
    }

    async fn read(&self, key: &str) -> CacheResult<Bytes> {
        check_key(key)?;
        let entries = self.entries.lock().map_err(|_| Self::poisoned(key))?;
        entries
            .get(key)
            .cloned()
            .ok_or_else(|| CacheError::Missing(key.to_string()))
    }

    async fn write(&self, key: &str, bytes: &[u8]) -> CacheResult<()> {
        check_key(key)?;
        let mut entries = self.entries.lock().map_err(|_| Self::poisoned(key))?;
        entries.insert(key.to_string(), Bytes::copy_from_slice(bytes));
        Ok(())
    }

    fn locate(&self, key: &str) -> PathBuf {
        PathBuf::from(key)
    }
}
