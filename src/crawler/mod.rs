//! Crawler module for complete thread ingestion
//!
//! This module contains the crawl logic, including:
//! - The five-phase thread fetcher
//! - Progress reporting
//! - The crawl result and its per-phase counts

mod coordinator;
mod progress;
mod result;

pub use coordinator::{QuoteListing, ThreadFetcher};
pub use progress::{CrawlProgress, CrawlStage, PostsBatchCallback, ProgressCallback};
pub use result::{CrawlResult, CrawlSummary};

use crate::config::Config;
use crate::WeaverError;

/// Runs a complete crawl of one thread over HTTP
///
/// This is the main entry point for a crawl with no callbacks attached.
///
/// # Arguments
///
/// * `config` - Client and crawler configuration
/// * `root_uri` - `at://` URI of the thread root
///
/// # Returns
///
/// * `Ok(CrawlResult)` - The collected posts; empty if the thread was unavailable
/// * `Err(WeaverError)` - The HTTP client could not be built
pub async fn crawl(config: &Config, root_uri: &str) -> Result<CrawlResult, WeaverError> {
    let fetcher = ThreadFetcher::from_config(config)?;
    Ok(fetcher.crawl(root_uri).await)
}
