//! Transient state of one crawl
//!
//! Owned by the crawl for its whole lifetime and dropped afterwards.

use crate::post::Post;
use std::collections::{HashMap, HashSet, VecDeque};

/// A post waiting to have its quote list crawled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteWork {
    pub uri: String,

    /// Quote hops from the point where the post was discovered
    pub depth: u32,
}

/// Visited set, collected posts and bookkeeping shared by all crawl phases
#[derive(Debug, Default)]
pub struct CrawlState {
    /// Collected posts in discovery order
    posts: Vec<Post>,

    /// URI -> position in `posts`; doubles as the visited set
    index: HashMap<String, usize>,

    /// Posts whose quote list has already been requested
    quote_sources: HashSet<String>,

    /// Truncated posts whose subtree has already been re-fetched
    repaired: HashSet<String>,

    /// Breadth-first queue of pending quote-list crawls
    queue: VecDeque<QuoteWork>,
}

impl CrawlState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visited(&self, uri: &str) -> bool {
        self.index.contains_key(uri)
    }

    /// Adds a post unless its URI is already known
    ///
    /// Returns true if the post was added. A rediscovered post keeps its
    /// first-seen metadata.
    pub fn insert(&mut self, post: Post) -> bool {
        if self.index.contains_key(&post.uri) {
            return false;
        }
        self.index.insert(post.uri.clone(), self.posts.len());
        self.posts.push(post);
        true
    }

    /// Adds every unseen post and returns the ones that were new
    pub fn merge<I>(&mut self, posts: I) -> Vec<Post>
    where
        I: IntoIterator<Item = Post>,
    {
        let mut added = Vec::new();
        for post in posts {
            if !self.is_visited(&post.uri) {
                added.push(post.clone());
                self.insert(post);
            }
        }
        added
    }

    pub fn get(&self, uri: &str) -> Option<&Post> {
        self.index.get(uri).map(|&i| &self.posts[i])
    }

    /// Known depth of a collected post
    pub fn depth_of(&self, uri: &str) -> Option<u32> {
        self.get(uri).map(|post| post.depth)
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn into_posts(self) -> Vec<Post> {
        self.posts
    }

    /// Records that the quote list of `uri` is being fetched
    ///
    /// Returns false if it was fetched before.
    pub fn mark_quote_source(&mut self, uri: &str) -> bool {
        self.quote_sources.insert(uri.to_string())
    }

    pub fn is_quote_source(&self, uri: &str) -> bool {
        self.quote_sources.contains(uri)
    }

    pub fn quote_sources_queried(&self) -> usize {
        self.quote_sources.len()
    }

    /// Records that the subtree of `uri` is being repaired
    ///
    /// Returns false if it was repaired before.
    pub fn mark_repaired(&mut self, uri: &str) -> bool {
        self.repaired.insert(uri.to_string())
    }

    pub fn is_repaired(&self, uri: &str) -> bool {
        self.repaired.contains(uri)
    }

    pub fn enqueue_quote_work(&mut self, uri: &str, depth: u32) {
        self.queue.push_back(QuoteWork {
            uri: uri.to_string(),
            depth,
        });
    }

    pub fn has_quote_work(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Takes every queued item, leaving the queue empty for the next round
    pub fn drain_quote_round(&mut self) -> Vec<QuoteWork> {
        self.queue.drain(..).collect()
    }
}
