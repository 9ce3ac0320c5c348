//! Resource cache for fetched pages and downloaded assets
//!
//! Every payload the pipeline fetches is memoized under a key derived from
//! its URL, which is what makes repeated runs resumable. Entries are never
//! invalidated: once a non-empty artifact exists it is treated as complete.
//!
//! Two backends implement [`ResourceCache`]:
//! - [`FsCache`] persists one file per key under a root directory
//! - [`MemoryCache`] keeps entries in a map, for tests

mod fs;
mod memory;
mod traits;

pub use fs::FsCache;
pub use memory::MemoryCache;
pub use traits::{CacheError, CacheResult, ResourceCache};

/// Suffix appended to the key of cached HTML pages
pub const PAGE_SUFFIX: &str = ".html";

/// Derives a filesystem-safe cache key from a URL
///
/// Path separators are replaced with `_`, so the same URL always maps to the
/// same key and the key never escapes the cache root.
///
/// # Examples
///
/// ```
/// use romstash::cache::cache_key;
///
/// assert_eq!(cache_key("/roms/nes/page/2"), "_roms_nes_page_2");
/// ```
pub fn cache_key(url: &str) -> String {
    url.replace(['/', '\\'], "_")
}

/// Cache key for an HTML page fetched from `url`
pub fn page_key(url: &str) -> String {
    format!("{}{}", cache_key(url), PAGE_SUFFIX)
}
