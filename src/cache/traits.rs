//! Cache trait and error types
//!
//! This module defines the key→bytes interface the fetch pipeline depends on,
//! so the filesystem store can be swapped for an in-memory one.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache entry not found: {0}")]
    Missing(String),

    #[error("Invalid cache key: {0:?}")]
    InvalidKey(String),

    #[error("IO error on cache entry {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Key→bytes store backing the fetch pipeline
///
/// Implementations must tolerate concurrent writers to the same key: the
/// payload for a given URL is always the same, so last-writer-wins is fine as
/// long as no reader ever observes a torn entry.
#[async_trait]
pub trait ResourceCache: Send + Sync {
    /// Returns true if a non-empty entry exists for `key`
    ///
    /// Zero-length entries are reported as absent; they are what an
    /// interrupted write leaves behind. Only a genuine "not found" is
    /// absence, any other failure to inspect the entry is an error.
    async fn exists(&self, key: &str) -> CacheResult<bool>;

    /// Reads the full payload stored under `key`
    async fn read(&self, key: &str) -> CacheResult<Bytes>;

    /// Stores `bytes` under `key`, creating parent directories as needed
    async fn write(&self, key: &str, bytes: &[u8]) -> CacheResult<()>;

    /// Where the entry for `key` lives
    fn locate(&self, key: &str) -> PathBuf;
}

/// Rejects keys that could escape the cache root
pub(crate) fn check_key(key: &str) -> CacheResult<()> {
    if key.is_empty() || key == "." || key == ".." || key.contains(['/', '\\']) {
        return Err(CacheError::InvalidKey(key.to_string()));
    }
    Ok(())
}
