use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Romstash
///
/// Every section is optional; omitted sections fall back to the defaults
/// used against the public catalog.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fetcher: FetcherConfig,
    pub pipeline: PipelineConfig,
    pub output: OutputConfig,
    pub catalog: CatalogConfig,
}

/// Network behavior of the resilient fetcher
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Origin that relative catalog links are resolved against
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Seconds to wait for a response before an attempt counts as failed
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Total attempts per URL, including the first one
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// User agent sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl FetcherConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.consoleroms.com".to_string(),
            timeout_secs: 10,
            max_attempts: 15,
            user_agent: format!("romstash/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Admission control for network operations
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum number of simultaneously in-flight work units
    #[serde(rename = "max-concurrent-requests")]
    pub max_concurrent_requests: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 50,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Root directory for the page cache, assets and the record file
    pub directory: PathBuf,
}

impl OutputConfig {
    /// Directory holding cached catalog pages
    pub fn pages_dir(&self) -> PathBuf {
        self.directory.join("tmp")
    }

    /// Path of the JSON record file
    pub fn records_path(&self) -> PathBuf {
        self.directory.join("roms.json")
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./output"),
        }
    }
}

/// Which parts of the catalog to harvest
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Emulator slugs to crawl (e.g. "nes")
    pub emulators: Vec<String>,

    /// Read the emulator list from the catalog index instead
    #[serde(rename = "discover-emulators")]
    pub discover_emulators: bool,

    /// Upper bound on listing pages fetched per emulator
    #[serde(rename = "max-pages")]
    pub max_pages: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            emulators: vec!["nes".to_string()],
            discover_emulators: false,
            max_pages: 10_000,
        }
    }
}
