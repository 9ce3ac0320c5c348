//! Crawler coordinator - main harvest orchestration logic
//!
//! This module sequences the fetch pipeline across the stages of a harvest:
//! - Emulator discovery and per-emulator pagination
//! - Listing page fetches and tile extraction
//! - Detail page fetches and metadata extraction
//! - Writing the record file
//! - Asset downloads, one class at a time
//!
//! Each stage completes before the next starts. Within a stage every unit
//! goes through the shared [`Limiter`].

use crate::cache::{FsCache, ResourceCache};
use crate::config::Config;
use crate::crawler::fetcher::ResilientFetcher;
use crate::crawler::limiter::Limiter;
use crate::crawler::outcome::FetchOutcome;
use crate::crawler::parser::{
    extract_emulators, extract_extras, extract_page_count, extract_redirect, extract_tiles,
    RomRecord, RomTile,
};
use crate::crawler::pipeline::CachedFetcher;
use crate::output::{
    prepare_directories, write_records, AssetClass, AssetTally, ProgressSink, RunSummary,
};
use crate::url::dedup_urls;
use crate::StashError;
use std::sync::Arc;

/// Path of the catalog index listing every emulator
const CATALOG_INDEX: &str = "/roms";

/// What a run should do beyond collecting metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Download thumbnails, cover images and ROM files after the record file
    pub download_assets: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            download_assets: true,
        }
    }
}

/// Main harvest coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    pipeline: Arc<CachedFetcher>,
    limiter: Limiter,
    progress: Arc<dyn ProgressSink>,
    summary: RunSummary,
}

impl Coordinator {
    /// Creates a coordinator caching pages on disk under the output directory
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(StashError)` - The HTTP client or base URL could not be set up
    pub fn new(config: Config, progress: Arc<dyn ProgressSink>) -> Result<Self, StashError> {
        let fetcher = ResilientFetcher::from_config(&config.fetcher)?;
        let pages: Arc<dyn ResourceCache> = Arc::new(FsCache::new(config.output.pages_dir()));
        let pipeline = CachedFetcher::new(fetcher, pages);
        Ok(Self::with_pipeline(config, pipeline, progress))
    }

    /// Creates a coordinator around an existing pipeline
    pub fn with_pipeline(
        config: Config,
        pipeline: CachedFetcher,
        progress: Arc<dyn ProgressSink>,
    ) -> Self {
        let limiter = Limiter::new(config.pipeline.max_concurrent_requests);
        Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
            limiter,
            progress,
            summary: RunSummary::new(),
        }
    }

    pub fn pipeline(&self) -> &CachedFetcher {
        &self.pipeline
    }

    /// Runs a complete harvest
    ///
    /// 1. Prepare the output directories
    /// 2. Collect listing tiles for every emulator
    /// 3. Fetch detail metadata for every tile
    /// 4. Write the record file
    /// 5. Download thumbnails, then images, then ROM files
    ///
    /// Only setup failures and a failed record file write abort the run;
    /// unavailable pages and files are counted and skipped.
    pub async fn run(&mut self, options: RunOptions) -> Result<RunSummary, StashError> {
        self.summary = RunSummary::new();
        prepare_directories(&self.config.output).await?;

        let tiles = self.collect_tiles().await;
        let records = self.collect_records(tiles).await;

        write_records(&self.config.output.records_path(), &records).await?;
        self.summary.records = records.len();

        if options.download_assets {
            self.download_assets(&records).await;
        } else {
            tracing::info!("Skipping asset downloads");
        }

        self.summary.finish(self.pipeline.stats());
        let stats = &self.summary.pipeline;
        tracing::info!(
            "Harvest finished: {} records, {} cache hits, {} fetched, {} unavailable, {} requests",
            self.summary.records,
            stats.cache_hits,
            stats.fetched,
            stats.absent,
            stats.requests
        );
        Ok(self.summary.clone())
    }

    /// Emulators to crawl, from the config or the catalog index
    async fn emulators(&self) -> Vec<String> {
        if !self.config.catalog.discover_emulators {
            return self.config.catalog.emulators.clone();
        }

        match self
            .pipeline
            .fetch_document(CATALOG_INDEX, extract_emulators)
            .await
        {
            FetchOutcome::Found(found) if !found.is_empty() => {
                tracing::info!("Discovered {} emulators", found.len());
                found
            }
            _ => {
                tracing::warn!(
                    "Could not discover emulators, falling back to {:?}",
                    self.config.catalog.emulators
                );
                self.config.catalog.emulators.clone()
            }
        }
    }

    /// Fetches every listing page of every emulator and extracts its tiles
    ///
    /// Emulators are processed one after another. For each, the page count
    /// is known before any listing page is requested, and all listing pages
    /// are fetched before their tiles are read.
    pub async fn collect_tiles(&mut self) -> Vec<RomTile> {
        let emulators = self.emulators().await;
        self.summary.emulators = emulators.clone();

        let mut tiles = Vec::new();
        for emulator in &emulators {
            let page_count = self.page_count(emulator).await;
            tracing::info!("Emulator {} has {} listing pages", emulator, page_count);

            let pipeline = Arc::clone(&self.pipeline);
            let slug = emulator.clone();
            let mut pages = self
                .limiter
                .run_batch(
                    (1..=page_count).collect(),
                    move |page: u32| {
                        let pipeline = Arc::clone(&pipeline);
                        let url = format!("{}/{}/page/{}", CATALOG_INDEX, slug, page);
                        async move { (page, pipeline.fetch_document(&url, extract_tiles).await) }
                    },
                    self.progress.as_ref(),
                    |_| format!("Downloading pages for {}", emulator),
                )
                .await;

            pages.sort_by_key(|(page, _)| *page);
            for (page, outcome) in pages {
                match outcome {
                    FetchOutcome::Found(found) => {
                        self.summary.listing_pages += 1;
                        tiles.extend(found);
                    }
                    FetchOutcome::Absent => {
                        self.summary.listing_pages_missing += 1;
                        tracing::warn!("Listing page {} of {} unavailable", page, emulator);
                    }
                }
            }
        }

        tracing::info!("Collected {} tiles", tiles.len());
        tiles
    }

    /// Number of listing pages for an emulator, 1 if it cannot be read
    ///
    /// Capped at `max-pages`.
    async fn page_count(&self, emulator: &str) -> u32 {
        let url = format!("{}/{}", CATALOG_INDEX, emulator);
        let count = match self.pipeline.fetch_document(&url, extract_page_count).await {
            FetchOutcome::Found(count) => count,
            FetchOutcome::Absent => 1,
        };

        let max_pages = self.config.catalog.max_pages.max(1);
        if count > max_pages {
            tracing::warn!(
                "Emulator {} claims {} listing pages, fetching only the first {}",
                emulator,
                count,
                max_pages
            );
            return max_pages;
        }
        count
    }

    /// Fetches each tile's detail page and merges its metadata into a record
    ///
    /// Records keep the order of `tiles`. A tile whose detail page is
    /// unavailable still becomes a record, with empty extras.
    pub async fn collect_records(&mut self, tiles: Vec<RomTile>) -> Vec<RomRecord> {
        let pipeline = Arc::clone(&self.pipeline);
        let mut records = self
            .limiter
            .run_batch(
                tiles.into_iter().enumerate().collect(),
                move |(index, tile): (usize, RomTile)| {
                    let pipeline = Arc::clone(&pipeline);
                    async move {
                        let extras = if tile.href.is_empty() {
                            FetchOutcome::Absent
                        } else {
                            pipeline.fetch_document(&tile.href, extract_extras).await
                        };
                        (index, extras.is_absent(), RomRecord::new(tile, extras.unwrap_or_default()))
                    }
                },
                self.progress.as_ref(),
                |(_, _, record)| {
                    format!(
                        "Downloading ROM metadata: {}",
                        record.title.as_deref().unwrap_or("(untitled)")
                    )
                },
            )
            .await;

        records.sort_by_key(|(index, _, _)| *index);
        self.summary.details_missing = records.iter().filter(|(_, missing, _)| *missing).count();
        records.into_iter().map(|(_, _, record)| record).collect()
    }

    /// Downloads every asset class in order, each class to completion
    pub async fn download_assets(&mut self, records: &[RomRecord]) {
        let thumbnails = dedup_urls(records.iter().filter_map(|r| r.thumbnail.as_deref()));
        self.download_class(AssetClass::Thumbnails, thumbnails).await;

        let images = dedup_urls(records.iter().filter_map(|r| r.image()));
        self.download_class(AssetClass::Images, images).await;

        let roms = self.resolve_rom_urls(records).await;
        self.download_class(AssetClass::Roms, roms).await;
    }

    /// Follows each distinct download page to the actual ROM file URL
    async fn resolve_rom_urls(&self, records: &[RomRecord]) -> Vec<String> {
        let download_pages = dedup_urls(records.iter().filter_map(|r| r.download_url()));
        let pipeline = Arc::clone(&self.pipeline);

        let targets = self
            .limiter
            .run_batch(
                download_pages,
                move |url: String| {
                    let pipeline = Arc::clone(&pipeline);
                    async move { pipeline.fetch_document(&url, extract_redirect).await }
                },
                self.progress.as_ref(),
                |_| "Fetching ROMs download URLs".to_string(),
            )
            .await;

        dedup_urls(
            targets
                .into_iter()
                .filter_map(|outcome| outcome.into_option().flatten()),
        )
    }

    /// Downloads one asset class into its directory
    async fn download_class(&mut self, class: AssetClass, urls: Vec<String>) -> AssetTally {
        let store: Arc<dyn ResourceCache> =
            Arc::new(FsCache::new(class.directory(&self.config.output)));
        let pipeline = Arc::clone(&self.pipeline);
        let mut tally = AssetTally {
            scheduled: urls.len(),
            ..AssetTally::default()
        };

        tracing::info!("Downloading {} {}", urls.len(), class);

        let outcomes = self
            .limiter
            .run_batch(
                urls,
                move |url: String| {
                    let pipeline = Arc::clone(&pipeline);
                    let store = Arc::clone(&store);
                    async move { pipeline.fetch_and_save(&url, store.as_ref()).await }
                },
                self.progress.as_ref(),
                |outcome| match outcome {
                    FetchOutcome::Found(asset) => format!("Downloading file: '{}'", asset.url),
                    FetchOutcome::Absent => "Skipping unavailable file".to_string(),
                },
            )
            .await;

        for outcome in outcomes {
            match outcome {
                FetchOutcome::Found(asset) if asset.downloaded => tally.downloaded += 1,
                FetchOutcome::Found(_) => tally.already_present += 1,
                FetchOutcome::Absent => tally.missing += 1,
            }
        }

        self.summary.assets.insert(class, tally);
        tally
    }
}

/// Runs a complete harvest with the given configuration
///
/// # Example
///
/// ```no_run
/// use romstash::config::load_config;
/// use romstash::crawler::{run_harvest, RunOptions};
/// use romstash::output::NoProgress;
/// use std::path::Path;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("romstash.toml"))?;
/// let summary = run_harvest(config, Arc::new(NoProgress), RunOptions::default()).await?;
/// println!("{} records", summary.records);
/// # Ok(())
/// # }
/// ```
pub async fn run_harvest(
    config: Config,
    progress: Arc<dyn ProgressSink>,
    options: RunOptions,
) -> Result<RunSummary, StashError> {
    let mut coordinator = Coordinator::new(config, progress)?;
    coordinator.run(options).await
}
