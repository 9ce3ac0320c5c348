//! Filesystem-backed cache
//!
//! One file per key under a root directory. Writes go to a uniquely named
//! temporary file in the same directory and are renamed into place, so
//! concurrent writers to one key never interleave their bytes.

use crate::cache::traits::{check_key, CacheError, CacheResult, ResourceCache};
use async_trait::async_trait;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;

/// Distinguishes temporary files of concurrent writers within one process
static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Cache storing each entry as a file named by its key
#[derive(Debug, Clone)]
pub struct FsCache {
    root: PathBuf,
}

impl FsCache {
    /// Creates a cache rooted at `root`
    ///
    /// The directory is created lazily by the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory entries are stored in
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn io_error(key: &str, source: std::io::Error) -> CacheError {
        CacheError::Io {
            key: key.to_string(),
            source,
        }
    }
}

#[async_trait]
impl ResourceCache for FsCache {
    async fn exists(&self, key: &str) -> CacheResult<bool> {
        check_key(key)?;
        match fs::metadata(self.locate(key)).await {
            Ok(meta) => Ok(meta.is_file() && meta.len() > 0),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Self::io_error(key, e)),
        }
    }

    async fn read(&self, key: &str) -> CacheResult<Bytes> {
        check_key(key)?;
        match fs::read(self.locate(key)).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(CacheError::Missing(key.to_string())),
            Err(e) => Err(Self::io_error(key, e)),
        }
    }

    async fn write(&self, key: &str, bytes: &[u8]) -> CacheResult<()> {
        check_key(key)?;
        let target = self.locate(key);

        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| Self::io_error(key, e))?;

        let seq = WRITE_SEQ.fetch_add(1, Ordering::Relaxed);
        let temp = self
            .root
            .join(format!(".{}.{}.part", std::process::id(), seq));

        if let Err(e) = fs::write(&temp, bytes).await {
            let _ = fs::remove_file(&temp).await;
            return Err(Self::io_error(key, e));
        }

        if let Err(e) = fs::rename(&temp, &target).await {
            let _ = fs::remove_file(&temp).await;
            return Err(Self::io_error(key, e));
        }

        tracing::trace!("Cached {} bytes at {}", bytes.len(), target.display());
        Ok(())
    }

    fn locate(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}
