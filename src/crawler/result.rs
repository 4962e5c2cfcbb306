//! Crawl output

use crate::post::Post;
use crate::tree::ThreadTree;
use serde::Serialize;

/// Per-phase counts of a crawl
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlSummary {
    /// Posts collected from the initial thread fetch
    pub main_thread_posts: usize,

    /// Distinct truncated branches taken up by repair
    pub truncations_found: usize,

    /// Truncation records whose re-fetch succeeded
    pub truncations_repaired: usize,

    /// Posts added by truncation repair
    pub repaired_posts: usize,

    /// Quote posts of the root
    pub direct_quotes: usize,

    /// Replies to the root's quote posts
    pub quote_replies: usize,

    /// Quote posts found by the recursive quote crawl
    pub recursive_quotes: usize,

    /// Replies to recursively found quote posts
    pub recursive_replies: usize,

    /// Posts whose quote list was requested
    pub quote_sources_queried: usize,

    /// API calls that failed and whose branch was dropped
    pub failed_fetches: usize,

    pub total_posts: usize,
}

/// Final artifact of a crawl
#[derive(Debug, Clone, Default, Serialize)]
pub struct CrawlResult {
    /// Deduplicated posts in discovery order
    pub posts: Vec<Post>,

    /// The thread root; `None` only if the initial fetch failed
    pub root_post: Option<Post>,

    pub summary: CrawlSummary,
}

impl CrawlResult {
    /// Result of a crawl whose initial thread fetch failed
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// Builds a tree over the whole collection
    ///
    /// The thread root and every quote post are roots of the tree.
    pub fn tree(&self) -> ThreadTree {
        let root_uri = self.root_post.as_ref().map(|post| post.uri.clone());
        ThreadTree::from_posts(root_uri, self.posts.clone())
    }
}
