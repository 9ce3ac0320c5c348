//! Output module for everything a harvest leaves behind
//!
//! This module handles:
//! - Preparing the output directory layout
//! - Writing the JSON record file
//! - Rendering batch progress
//! - Summarizing a run

mod progress;
mod records;
pub mod stats;

pub use progress::{BarProgress, NoProgress, ProgressSink, ProgressTally};
pub use records::write_records;
pub use stats::{print_summary, AssetTally, RunSummary};

use crate::config::OutputConfig;
use crate::StashError;
use std::fmt;
use std::path::{Path, PathBuf};

/// Kind of binary asset, each kept in its own directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AssetClass {
    Thumbnails,
    Images,
    Roms,
}

impl AssetClass {
    /// Download order: one class runs to completion before the next starts
    pub const ALL: [AssetClass; 3] = [Self::Thumbnails, Self::Images, Self::Roms];

    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Thumbnails => "thumbs",
            Self::Images => "images",
            Self::Roms => "roms",
        }
    }

    /// Directory this class is saved to under the output root
    pub fn directory(&self, output: &OutputConfig) -> PathBuf {
        output.directory.join(self.dir_name())
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Thumbnails => write!(f, "Thumbnails"),
            Self::Images => write!(f, "Images"),
            Self::Roms => write!(f, "ROMs"),
        }
    }
}

/// Creates the output root, the page cache and every asset directory
///
/// Runs before any write so that an unusable output location fails the run
/// up front instead of degrading every unit.
pub async fn prepare_directories(output: &OutputConfig) -> Result<(), StashError> {
    let mut dirs = vec![output.directory.clone(), output.pages_dir()];
    dirs.extend(AssetClass::ALL.iter().map(|class| class.directory(output)));

    for dir in dirs {
        create_dir(&dir).await?;
    }
    Ok(())
}

async fn create_dir(dir: &Path) -> Result<(), StashError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| StashError::OutputDir {
            path: dir.display().to_string(),
            source,
        })
}
