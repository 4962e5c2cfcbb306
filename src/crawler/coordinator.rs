//! Crawl coordinator - the five-phase thread crawl
//!
//! A crawl turns one root post URI into a deduplicated post collection:
//!
//! 1. Fetch the main thread (failure here ends the crawl with nothing)
//! 2. Re-fetch every truncated branch, recursively, each post at most once
//! 3. Page through the root's quote posts and fetch their reply threads
//! 4. Breadth-first quote-of-quote crawl of heavily quoted posts, bounded
//!    by hop depth, each source queried at most once
//! 5. Assemble the result
//!
//! One visited set spans every phase, so a post reached through several paths
//! is collected once with its first-seen metadata. Any failure after phase 1
//! only drops the affected branch.

use crate::api::{ApiClient, ApiError, ApiResult, ThreadApi};
use crate::config::{Config, CrawlerConfig};
use crate::crawler::progress::{CrawlProgress, CrawlStage, PostsBatchCallback, ProgressCallback};
use crate::crawler::result::{CrawlResult, CrawlSummary};
use crate::post::Post;
use crate::state::{CrawlState, QuoteWork};
use crate::tree::{build_thread_tree, ThreadTree, Truncation};
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Quote posts of one source, gathered across all pages
#[derive(Debug, Default)]
pub struct QuoteListing {
    pub posts: Vec<Post>,

    /// Pages fetched successfully
    pub pages: usize,

    /// Failure that stopped pagination early
    pub error: Option<ApiError>,
}

/// Drives complete crawls of a thread
pub struct ThreadFetcher {
    api: Arc<dyn ThreadApi>,
    config: CrawlerConfig,
    on_progress: Option<ProgressCallback>,
    on_posts_batch: Option<PostsBatchCallback>,
}

impl ThreadFetcher {
    /// Creates a fetcher over any [`ThreadApi`] implementation
    pub fn new(api: Arc<dyn ThreadApi>, config: CrawlerConfig) -> Self {
        Self {
            api,
            config,
            on_progress: None,
            on_posts_batch: None,
        }
    }

    /// Creates a fetcher backed by the HTTP [`ApiClient`]
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        let client = ApiClient::new(&config.client)?;
        Ok(Self::new(Arc::new(client), config.crawler.clone()))
    }

    /// Registers a callback invoked with progress snapshots
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&CrawlProgress) + Send + Sync + 'static,
    {
        self.on_progress = Some(Box::new(callback));
        self
    }

    /// Registers a callback invoked with every batch of newly collected posts
    pub fn with_posts_batch<F>(mut self, callback: F) -> Self
    where
        F: Fn(&[Post]) + Send + Sync + 'static,
    {
        self.on_posts_batch = Some(Box::new(callback));
        self
    }

    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    /// Crawls the thread rooted at `root_uri`
    ///
    /// Never fails: if the main thread cannot be fetched the result is empty
    /// and has no root post.
    pub async fn crawl(&self, root_uri: &str) -> CrawlResult {
        CrawlRun::new(self).execute(root_uri).await
    }

    /// Fetches one thread and builds its tree
    pub async fn fetch_thread_tree(&self, uri: &str) -> ApiResult<ThreadTree> {
        let response = self
            .api
            .get_post_thread(uri, self.config.thread_depth, self.config.parent_height)
            .await?;
        Ok(build_thread_tree(&response.thread))
    }

    /// Pages through every quote post of `uri`
    ///
    /// Pagination follows the cursor until it is absent, the server repeats
    /// a cursor, or a page fails. A page may be empty and still carry a
    /// cursor. Posts from pages fetched before a failure are kept.
    pub async fn fetch_all_quotes(&self, uri: &str) -> QuoteListing {
        let mut listing = QuoteListing::default();
        let mut cursor: Option<String> = None;

        loop {
            let page = match self
                .api
                .get_quotes(uri, cursor.as_deref(), Some(self.config.quotes_page_limit))
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    listing.error = Some(e);
                    break;
                }
            };

            listing.pages += 1;
            listing
                .posts
                .extend(page.posts.iter().map(|view| Post::from_view(view, 0, None)));

            match page.cursor {
                Some(next) if cursor.as_deref() != Some(next.as_str()) => cursor = Some(next),
                Some(next) => {
                    tracing::warn!("Quotes of {}: server repeated cursor {}", uri, next);
                    break;
                }
                None => break,
            }
        }

        tracing::debug!(
            "Quotes of {}: {} posts over {} pages",
            uri,
            listing.posts.len(),
            listing.pages
        );
        listing
    }

    /// Fetches several threads concurrently, keeping every outcome
    async fn fetch_thread_trees(&self, uris: Vec<String>) -> Vec<(String, ApiResult<ThreadTree>)> {
        stream::iter(uris)
            .map(move |uri| async move {
                let result = self.fetch_thread_tree(&uri).await;
                (uri, result)
            })
            .buffered(self.concurrency())
            .collect()
            .await
    }

    fn concurrency(&self) -> usize {
        self.config.max_concurrent_requests.max(1)
    }
}

/// State of one crawl in progress
struct CrawlRun<'a> {
    fetcher: &'a ThreadFetcher,
    state: CrawlState,
    summary: CrawlSummary,
}

impl<'a> CrawlRun<'a> {
    fn new(fetcher: &'a ThreadFetcher) -> Self {
        Self {
            fetcher,
            state: CrawlState::new(),
            summary: CrawlSummary::default(),
        }
    }

    async fn execute(mut self, root_uri: &str) -> CrawlResult {
        tracing::info!("Starting crawl of {}", root_uri);

        let Some((root_post, truncations)) = self.main_thread(root_uri).await else {
            self.report(CrawlStage::Complete, "Main thread unavailable".to_string());
            return CrawlResult::empty();
        };

        self.repair_truncations(truncations).await;
        self.root_quotes(&root_post.uri).await;
        self.quotes_of_quotes().await;

        self.assemble(root_post)
    }

    /// Phase 1: fetch the thread itself
    async fn main_thread(&mut self, root_uri: &str) -> Option<(Post, Vec<Truncation>)> {
        self.report(CrawlStage::MainThread, format!("Fetching thread {}", root_uri));

        let tree = match self.fetcher.fetch_thread_tree(root_uri).await {
            Ok(tree) => tree,
            Err(e) => {
                tracing::error!("Failed to fetch main thread {}: {}", root_uri, e);
                return None;
            }
        };

        let Some(root_post) = tree.root().cloned() else {
            tracing::error!("Root post {} is not viewable", root_uri);
            return None;
        };

        let (posts, truncations) = tree.into_parts();
        let added = self.state.merge(posts);
        self.summary.main_thread_posts = added.len();
        self.emit_batch(&added);

        tracing::info!(
            "Main thread: {} posts, {} truncated branches",
            added.len(),
            truncations.len()
        );
        self.report(
            CrawlStage::MainThread,
            format!("Main thread: {} posts", added.len()),
        );

        Some((root_post, truncations))
    }

    /// Phase 2: re-fetch truncated branches until none are left
    async fn repair_truncations(&mut self, truncations: Vec<Truncation>) {
        if truncations.is_empty() {
            return;
        }

        self.report(
            CrawlStage::TruncationRepair,
            format!("Repairing {} truncated branches", truncations.len()),
        );

        let mut queue: VecDeque<Truncation> = truncations.into();
        while let Some(truncation) = queue.pop_front() {
            if !self.state.mark_repaired(&truncation.uri) {
                continue;
            }
            self.summary.truncations_found += 1;

            let base_depth = self.state.depth_of(&truncation.uri).unwrap_or(0);
            tracing::debug!(
                "Repairing {} ({} of {} replies missing)",
                truncation.uri,
                truncation.missing(),
                truncation.expected_replies
            );

            let tree = match self.fetcher.fetch_thread_tree(&truncation.uri).await {
                Ok(tree) => tree,
                Err(e) => {
                    self.record_failure("truncated branch", &truncation.uri, &e);
                    continue;
                }
            };

            let (posts, nested) = tree.into_parts();
            let added = self.state.merge(posts.into_iter().map(|mut post| {
                post.depth += base_depth;
                post
            }));

            self.summary.truncations_repaired += 1;
            self.summary.repaired_posts += added.len();

            for record in nested {
                if !self.state.is_repaired(&record.uri) {
                    queue.push_back(record);
                }
            }

            self.emit_batch(&added);
            self.report(
                CrawlStage::TruncationRepair,
                format!("Recovered {} posts under {}", added.len(), truncation.uri),
            );
        }

        tracing::info!(
            "Truncation repair: {} of {} branches re-fetched, {} posts recovered",
            self.summary.truncations_repaired,
            self.summary.truncations_found,
            self.summary.repaired_posts
        );
    }

    /// Phase 3: quote posts of the root and their replies
    async fn root_quotes(&mut self, root_uri: &str) {
        self.report(CrawlStage::Quotes, format!("Fetching quotes of {}", root_uri));
        self.state.mark_quote_source(root_uri);

        let listing = self.fetcher.fetch_all_quotes(root_uri).await;
        if let Some(e) = &listing.error {
            self.record_failure("quote page", root_uri, e);
        }

        let quotes = self.state.merge(listing.posts);
        self.summary.direct_quotes = quotes.len();
        self.emit_batch(&quotes);

        let with_replies = quotes
            .iter()
            .filter(|post| post.has_replies())
            .map(|post| post.uri.clone())
            .collect();
        let replies = self.merge_reply_threads(with_replies).await;
        self.summary.quote_replies = replies.values().map(Vec::len).sum();

        tracing::info!(
            "Quotes: {} quote posts, {} replies to them",
            self.summary.direct_quotes,
            self.summary.quote_replies
        );
        self.report(
            CrawlStage::Quotes,
            format!("{} quote posts", self.summary.direct_quotes),
        );
    }

    /// Phase 4: breadth-first crawl of quotes of heavily quoted posts
    async fn quotes_of_quotes(&mut self) {
        let threshold = self.fetcher.config.quote_threshold;
        let max_depth = self.fetcher.config.max_quote_depth;

        let seeds: Vec<String> = self
            .state
            .posts()
            .iter()
            .filter(|post| post.meets_quote_threshold(threshold))
            .filter(|post| !self.state.is_quote_source(&post.uri))
            .map(|post| post.uri.clone())
            .collect();

        if seeds.is_empty() {
            return;
        }

        self.report(
            CrawlStage::QuotesOfQuotes,
            format!("{} posts with at least {} quotes", seeds.len(), threshold),
        );
        for uri in &seeds {
            self.state.enqueue_quote_work(uri, 1);
        }

        let fetcher = self.fetcher;
        let mut round = 0;

        while self.state.has_quote_work() {
            let mut sources = Vec::new();
            for work in self.state.drain_quote_round() {
                if work.depth > max_depth {
                    tracing::trace!("{} is beyond quote depth {}", work.uri, max_depth);
                    continue;
                }
                if !self.state.mark_quote_source(&work.uri) {
                    continue;
                }
                sources.push(work);
            }

            if sources.is_empty() {
                continue;
            }
            round += 1;
            tracing::debug!("Quote round {}: {} sources", round, sources.len());

            let listings: Vec<(QuoteWork, QuoteListing)> = stream::iter(sources)
                .map(move |work| async move {
                    let listing = fetcher.fetch_all_quotes(&work.uri).await;
                    (work, listing)
                })
                .buffered(fetcher.concurrency())
                .collect()
                .await;

            let mut new_quotes: Vec<(Post, u32)> = Vec::new();
            for (work, listing) in listings {
                if let Some(e) = &listing.error {
                    self.record_failure("quote page", &work.uri, e);
                }
                let added = self.state.merge(listing.posts);
                self.emit_batch(&added);
                new_quotes.extend(added.into_iter().map(|post| (post, work.depth)));
            }
            self.summary.recursive_quotes += new_quotes.len();

            let quote_depths: HashMap<String, u32> = new_quotes
                .iter()
                .map(|(post, depth)| (post.uri.clone(), *depth))
                .collect();
            let with_replies = new_quotes
                .iter()
                .filter(|(post, _)| post.has_replies())
                .map(|(post, _)| post.uri.clone())
                .collect();

            for (quote_uri, replies) in self.merge_reply_threads(with_replies).await {
                self.summary.recursive_replies += replies.len();
                let depth = quote_depths.get(&quote_uri).copied().unwrap_or(max_depth);
                for reply in replies.iter().filter(|r| r.meets_quote_threshold(threshold)) {
                    self.state.enqueue_quote_work(&reply.uri, depth + 1);
                }
            }

            for (post, depth) in &new_quotes {
                if post.meets_quote_threshold(threshold) {
                    self.state.enqueue_quote_work(&post.uri, depth + 1);
                }
            }

            self.report(
                CrawlStage::QuotesOfQuotes,
                format!("Round {}: {} new quote posts", round, new_quotes.len()),
            );
        }

        tracing::info!(
            "Quotes of quotes: {} quote posts, {} replies over {} rounds",
            self.summary.recursive_quotes,
            self.summary.recursive_replies,
            round
        );
    }

    /// Fetches the reply threads of `uris` as one batch and merges them
    ///
    /// Returns the newly collected replies per thread root. Failed fetches are
    /// recorded and skipped.
    async fn merge_reply_threads(&mut self, uris: Vec<String>) -> HashMap<String, Vec<Post>> {
        let mut merged = HashMap::new();
        if uris.is_empty() {
            return merged;
        }

        for (uri, outcome) in self.fetcher.fetch_thread_trees(uris).await {
            match outcome {
                Ok(tree) => {
                    let (posts, _) = tree.into_parts();
                    let added = self.state.merge(posts);
                    self.emit_batch(&added);
                    merged.insert(uri, added);
                }
                Err(e) => self.record_failure("reply thread", &uri, &e),
            }
        }

        merged
    }

    /// Phase 5: hand the collection over
    fn assemble(self, root_post: Post) -> CrawlResult {
        let mut summary = self.summary;
        summary.quote_sources_queried = self.state.quote_sources_queried();
        summary.total_posts = self.state.len();

        if let Some(callback) = &self.fetcher.on_progress {
            callback(&CrawlProgress {
                stage: CrawlStage::Complete,
                total_posts: summary.total_posts,
                message: format!("Collected {} posts", summary.total_posts),
            });
        }
        tracing::info!(
            "Crawl of {} complete: {} posts, {} failed fetches",
            root_post.uri,
            summary.total_posts,
            summary.failed_fetches
        );

        CrawlResult {
            posts: self.state.into_posts(),
            root_post: Some(root_post),
            summary,
        }
    }

    fn record_failure(&mut self, what: &str, uri: &str, error: &ApiError) {
        self.summary.failed_fetches += 1;
        tracing::warn!("Dropping {} for {}: {}", what, uri, error);
    }

    fn report(&self, stage: CrawlStage, message: String) {
        tracing::debug!("[{}] {}", stage, message);
        if let Some(callback) = &self.fetcher.on_progress {
            callback(&CrawlProgress {
                stage,
                total_posts: self.state.len(),
                message,
            });
        }
    }

    fn emit_batch(&self, posts: &[Post]) {
        if posts.is_empty() {
            return;
        }
        if let Some(callback) = &self.fetcher.on_posts_batch {
            callback(posts);
        }
    }
}
