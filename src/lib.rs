//! Romstash: a resumable catalog harvester
//!
//! This crate crawls a paginated ROM catalog, extracts structured records from
//! its HTML and bulk-downloads the associated assets. Every network operation
//! goes through one cached, retrying, concurrency-limited fetch pipeline so
//! that repeated runs are idempotent.

pub mod cache;
pub mod config;
pub mod crawler;
pub mod output;
pub mod url;

use thiserror::Error;

/// Main error type for Romstash operations
#[derive(Debug, Error)]
pub enum StashError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to prepare output directory {path}: {source}")]
    OutputDir {
        path: String,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Romstash operations
pub type Result<T> = std::result::Result<T, StashError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use cache::{cache_key, FsCache, MemoryCache, ResourceCache};
pub use config::Config;
pub use crawler::{CachedFetcher, FetchOutcome, Limiter, ResilientFetcher};
