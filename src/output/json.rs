//! JSON export of a crawl result

use crate::crawler::CrawlResult;
use crate::WeaverError;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes the crawl result to `path` as pretty-printed JSON
///
/// Parent directories are created as needed and an existing file is replaced.
///
/// # Arguments
///
/// * `result` - The crawl result to export
/// * `path` - Destination file
pub fn write_json(result: &CrawlResult, path: &Path) -> Result<(), WeaverError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, result)?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    tracing::info!("Wrote {} posts to {}", result.posts.len(), path.display());
    Ok(())
}
