//! Progress reporting types

use crate::post::Post;
use serde::Serialize;
use std::fmt;

/// Crawl phase currently running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlStage {
    MainThread,
    TruncationRepair,
    Quotes,
    QuotesOfQuotes,
    Complete,
}

impl CrawlStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MainThread => "main_thread",
            Self::TruncationRepair => "truncation_repair",
            Self::Quotes => "quotes",
            Self::QuotesOfQuotes => "quotes_of_quotes",
            Self::Complete => "complete",
        }
    }
}

impl fmt::Display for CrawlStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot handed to the progress callback
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlProgress {
    pub stage: CrawlStage,

    /// Posts collected so far
    pub total_posts: usize,

    pub message: String,
}

/// Called with a progress snapshot at every phase boundary and merge
pub type ProgressCallback = Box<dyn Fn(&CrawlProgress) + Send + Sync>;

/// Called with each batch of newly collected posts
pub type PostsBatchCallback = Box<dyn Fn(&[Post]) + Send + Sync>;
