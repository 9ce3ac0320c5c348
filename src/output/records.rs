//! Record file writer

use crate::crawler::RomRecord;
use crate::StashError;
use std::path::Path;
use tokio::fs;

/// Writes the full record set as one pretty-printed JSON array
///
/// The array goes to a temporary file that is renamed over `path`, so a
/// reader never sees a partially written record file.
pub async fn write_records(path: &Path, records: &[RomRecord]) -> Result<(), StashError> {
    let json = serde_json::to_vec_pretty(records)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }

    let temp = path.with_extension("json.part");
    fs::write(&temp, &json).await?;
    fs::rename(&temp, path).await?;

    tracing::info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}
