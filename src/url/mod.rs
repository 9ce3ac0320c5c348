//! URL handling module for Romstash
//!
//! This module provides resolution of catalog links against the configured
//! base origin, path segment helpers and exact-string deduplication of
//! download lists.

mod dedup;
mod resolve;

// Re-export main functions
pub use dedup::dedup_urls;
pub use resolve::{file_name_for, last_segment, resolve_url};
