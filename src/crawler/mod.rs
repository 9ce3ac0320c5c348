//! Crawler module for catalog fetching and processing
//!
//! This module contains the core harvesting logic, including:
//! - HTTP fetching with timeouts, retries and failure suppression
//! - Concurrency limiting of batches of work units
//! - The cache-first fetch pipeline
//! - Catalog markup extraction
//! - Overall harvest coordination

mod coordinator;
mod fetcher;
mod limiter;
mod outcome;
mod parser;
mod pipeline;

pub use coordinator::{run_harvest, Coordinator, RunOptions};
pub use fetcher::{build_http_client, FetchError, FetchPolicy, ResilientFetcher};
pub use limiter::Limiter;
pub use outcome::FetchOutcome;
pub use parser::{
    extract_emulators, extract_extras, extract_page_count, extract_redirect, extract_tiles,
    Extras, RomRecord, RomTile, Tag,
};
pub use pipeline::{CachedFetcher, PageSource, PipelineStats, SavedAsset};
