//! Configuration module for Romstash
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use romstash::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("romstash.toml")).unwrap();
//! println!("Concurrency ceiling: {}", config.pipeline.max_concurrent_requests);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{CatalogConfig, Config, FetcherConfig, OutputConfig, PipelineConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
