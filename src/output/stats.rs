//! Run summary
//!
//! Counters gathered by the coordinator while a crawl runs, and a printer
//! for the end-of-run report.

use crate::crawler::PipelineStats;
use crate::output::AssetClass;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Outcome counts of one asset-class download batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssetTally {
    /// Distinct URLs handed to the batch
    pub scheduled: usize,

    /// Assets fetched during this run
    pub downloaded: usize,

    /// Assets already present from an earlier run
    pub already_present: usize,

    /// Assets that could not be obtained
    pub missing: usize,
}

impl AssetTally {
    /// Assets available locally after the batch
    pub fn saved(&self) -> usize {
        self.downloaded + self.already_present
    }
}

/// Everything worth reporting about one crawl
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    /// Emulators that were crawled
    pub emulators: Vec<String>,

    /// Listing pages that yielded content
    pub listing_pages: usize,

    /// Listing pages that came back absent
    pub listing_pages_missing: usize,

    /// Records written to the record file
    pub records: usize,

    /// Records whose detail page was unavailable
    pub details_missing: usize,

    /// Per-class download results
    pub assets: BTreeMap<AssetClass, AssetTally>,

    /// Pipeline counters at the end of the run
    pub pipeline: PipelineStats,
}

impl RunSummary {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            emulators: Vec::new(),
            listing_pages: 0,
            listing_pages_missing: 0,
            records: 0,
            details_missing: 0,
            assets: BTreeMap::new(),
            pipeline: PipelineStats::default(),
        }
    }

    /// Marks the run finished and captures the final pipeline counters
    pub fn finish(&mut self, pipeline: PipelineStats) {
        self.finished_at = Some(Utc::now());
        self.pipeline = pipeline;
    }

    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }
}

impl Default for RunSummary {
    fn default() -> Self {
        Self::new()
    }
}

/// Prints the summary to stdout in a formatted manner
pub fn print_summary(summary: &RunSummary) {
    println!("=== Harvest Summary ===\n");

    println!("Catalog:");
    println!("  Emulators: {}", summary.emulators.join(", "));
    println!(
        "  Listing pages: {} ({} unavailable)",
        summary.listing_pages, summary.listing_pages_missing
    );
    println!(
        "  Records: {} ({} without details)",
        summary.records, summary.details_missing
    );
    println!();

    if !summary.assets.is_empty() {
        println!("Assets:");
        for (class, tally) in &summary.assets {
            println!(
                "  {}: {} saved of {} ({} new, {} already present, {} unavailable)",
                class,
                tally.saved(),
                tally.scheduled,
                tally.downloaded,
                tally.already_present,
                tally.missing
            );
        }
        println!();
    }

    let pipeline = &summary.pipeline;
    println!("Pipeline:");
    println!("  Cache hits: {}", pipeline.cache_hits);
    println!("  Network fetches: {}", pipeline.fetched);
    println!("  HTTP requests (with retries): {}", pipeline.requests);
    println!("  Unavailable units: {}", pipeline.absent);
    if pipeline.write_failures > 0 {
        println!("  Cache write failures: {}", pipeline.write_failures);
    }

    if let Some(seconds) = summary.duration_seconds() {
        println!();
        println!("Finished in {}s", seconds);
    }
}
