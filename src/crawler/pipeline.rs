//! Cached fetch pipeline
//!
//! Composes the resource cache with the resilient fetcher: check the cache,
//! fetch on a miss, populate the cache, hand back the payload. Nothing in
//! here returns an error; every failure has been logged and turned into
//! [`FetchOutcome::Absent`] by the time a caller sees it.

use crate::cache::{cache_key, page_key, ResourceCache};
use crate::crawler::fetcher::ResilientFetcher;
use crate::crawler::outcome::FetchOutcome;
use crate::url::file_name_for;
use bytes::Bytes;
use scraper::Html;
use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Raw bytes of a catalog page
#[derive(Debug, Clone)]
pub struct PageSource {
    /// The URL as requested
    pub url: String,

    /// Page body, exactly as fetched or cached
    pub body: Bytes,

    /// Whether the body came from the cache
    pub from_cache: bool,
}

impl PageSource {
    /// Body decoded as UTF-8, invalid sequences replaced
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Parses the body into an HTML tree for selector queries
    pub fn document(&self) -> Html {
        Html::parse_document(&self.text())
    }
}

/// A binary asset present on local storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedAsset {
    /// The URL as requested
    pub url: String,

    /// Where the asset lives
    pub path: PathBuf,

    /// False when an earlier run had already saved it
    pub downloaded: bool,
}

/// Counters describing how units were satisfied
#[derive(Debug, Default)]
struct PipelineCounters {
    cache_hits: AtomicU64,
    fetched: AtomicU64,
    absent: AtomicU64,
    write_failures: AtomicU64,
}

/// Point-in-time copy of the pipeline counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Units served from the cache without touching the network
    pub cache_hits: u64,

    /// Units fetched from the network
    pub fetched: u64,

    /// Units that degraded to absent
    pub absent: u64,

    /// Fetched payloads that could not be persisted
    pub write_failures: u64,

    /// HTTP requests issued, retries included
    pub requests: u64,
}

/// Cache-first fetcher shared by every stage of a crawl
pub struct CachedFetcher {
    fetcher: ResilientFetcher,
    pages: Arc<dyn ResourceCache>,
    counters: PipelineCounters,
}

impl CachedFetcher {
    /// Creates a pipeline caching pages in `pages`
    pub fn new(fetcher: ResilientFetcher, pages: Arc<dyn ResourceCache>) -> Self {
        Self {
            fetcher,
            pages,
            counters: PipelineCounters::default(),
        }
    }

    pub fn fetcher(&self) -> &ResilientFetcher {
        &self.fetcher
    }

    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            cache_hits: self.counters.cache_hits.load(Ordering::Relaxed),
            fetched: self.counters.fetched.load(Ordering::Relaxed),
            absent: self.counters.absent.load(Ordering::Relaxed),
            write_failures: self.counters.write_failures.load(Ordering::Relaxed),
            requests: self.fetcher.requests_sent(),
        }
    }

    /// Fetches a page, from the cache when possible
    ///
    /// # Flow
    ///
    /// 1. Derive the page key from `url` and ask the cache whether it exists
    /// 2. Hit → read the bytes, no network
    /// 3. Miss → fetch; on success write to the cache before returning
    /// 4. Suppressed failure → `Absent`
    ///
    /// A cache read that fails falls through to a fresh fetch.
    pub async fn fetch_page(&self, url: &str) -> FetchOutcome<PageSource> {
        let key = page_key(url);

        if self.is_cached(self.pages.as_ref(), &key).await {
            match self.pages.read(&key).await {
                Ok(body) => {
                    self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
                    tracing::trace!("Cache hit for {}", url);
                    return FetchOutcome::Found(PageSource {
                        url: url.to_string(),
                        body,
                        from_cache: true,
                    });
                }
                Err(e) => {
                    tracing::warn!("Failed to read cached {}: {}; fetching again", url, e);
                }
            }
        }

        self.fetch_and_store(url, self.pages.as_ref(), &key)
            .await
            .map(|(body, _)| PageSource {
                url: url.to_string(),
                body,
                from_cache: false,
            })
    }

    /// Fetches a page and runs `extract` over its parsed tree
    ///
    /// The tree is built and dropped inside this call, after the last
    /// suspension point.
    pub async fn fetch_document<T>(
        &self,
        url: &str,
        extract: impl FnOnce(&Html) -> T,
    ) -> FetchOutcome<T> {
        self.fetch_page(url).await.map(|page| {
            let document = page.document();
            extract(&document)
        })
    }

    /// Downloads a binary asset into `store` unless it is already there
    ///
    /// The asset is named after the final path segment of its URL. An
    /// existing non-empty file counts as complete and is neither downloaded
    /// nor rewritten. A payload that cannot be persisted yields `Absent`,
    /// since there is no local file to point at.
    pub async fn fetch_and_save(
        &self,
        url: &str,
        store: &dyn ResourceCache,
    ) -> FetchOutcome<SavedAsset> {
        let key = match self.fetcher.resolve(url) {
            Ok(resolved) => file_name_for(&resolved).unwrap_or_else(|| cache_key(url)),
            Err(e) => {
                tracing::error!("Failed to download {}: {}", url, e);
                self.counters.absent.fetch_add(1, Ordering::Relaxed);
                return FetchOutcome::Absent;
            }
        };

        if self.is_cached(store, &key).await {
            self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
            return FetchOutcome::Found(SavedAsset {
                url: url.to_string(),
                path: store.locate(&key),
                downloaded: false,
            });
        }

        match self.fetch_and_store(url, store, &key).await {
            FetchOutcome::Found((_, true)) => FetchOutcome::Found(SavedAsset {
                url: url.to_string(),
                path: store.locate(&key),
                downloaded: true,
            }),
            FetchOutcome::Found((_, false)) | FetchOutcome::Absent => FetchOutcome::Absent,
        }
    }

    /// Cache existence check that never fails
    ///
    /// Only "not found" is absence; other errors are logged and the entry is
    /// treated as missing so the unit can still make progress.
    async fn is_cached(&self, store: &dyn ResourceCache, key: &str) -> bool {
        match store.exists(key).await {
            Ok(exists) => exists,
            Err(e) => {
                tracing::warn!("Cache check failed for {}: {}; treating as miss", key, e);
                false
            }
        }
    }

    /// Fetches `url` and writes the payload under `key`
    ///
    /// Returns the payload and whether it was persisted.
    async fn fetch_and_store(
        &self,
        url: &str,
        store: &dyn ResourceCache,
        key: &str,
    ) -> FetchOutcome<(Bytes, bool)> {
        match self.fetcher.fetch(url).await {
            FetchOutcome::Found(body) => {
                self.counters.fetched.fetch_add(1, Ordering::Relaxed);
                let persisted = match store.write(key, &body).await {
                    Ok(()) => true,
                    Err(e) => {
                        self.counters.write_failures.fetch_add(1, Ordering::Relaxed);
                        tracing::error!("Failed to save {} to cache: {}", url, e);
                        false
                    }
                };
                FetchOutcome::Found((body, persisted))
            }
            FetchOutcome::Absent => {
                self.counters.absent.fetch_add(1, Ordering::Relaxed);
                FetchOutcome::Absent
            }
        }
    }
}
