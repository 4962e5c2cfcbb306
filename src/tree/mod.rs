//! Thread tree abstraction
//!
//! A [`ThreadTree`] is a navigable view over a set of posts: parent and child
//! lookup, branch authors, and the truncation records found while building
//! it from a thread payload. Trees are built either from a single
//! `getPostThread` response ([`build_thread_tree`]) or from any post list,
//! such as a whole crawl result ([`ThreadTree::from_posts`]).

mod builder;

pub use builder::build_thread_tree;

use crate::post::Post;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// A post whose reported reply count exceeds the replies actually returned
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Truncation {
    pub uri: String,
    pub expected_replies: u32,
    pub actual_replies: u32,
}

impl Truncation {
    /// Number of replies the server left out
    pub fn missing(&self) -> u32 {
        self.expected_replies.saturating_sub(self.actual_replies)
    }
}

/// Navigable view over a deduplicated post set
#[derive(Debug, Clone, Default)]
pub struct ThreadTree {
    root_uri: Option<String>,
    posts: Vec<Post>,
    index: HashMap<String, usize>,
    children: HashMap<String, Vec<String>>,
    truncated: Vec<Truncation>,
}

impl ThreadTree {
    /// Builds a tree over `posts`, keeping the first occurrence of each URI
    ///
    /// Parent links come from each post's `parent_uri`; posts whose parent is
    /// not part of the set act as additional roots.
    pub fn from_posts(root_uri: Option<String>, posts: Vec<Post>) -> Self {
        let mut index = HashMap::with_capacity(posts.len());
        let mut unique = Vec::with_capacity(posts.len());

        for post in posts {
            if index.contains_key(&post.uri) {
                continue;
            }
            index.insert(post.uri.clone(), unique.len());
            unique.push(post);
        }

        let mut children: HashMap<String, Vec<String>> = HashMap::new();
        for post in &unique {
            if let Some(parent) = &post.parent_uri {
                children
                    .entry(parent.clone())
                    .or_default()
                    .push(post.uri.clone());
            }
        }

        Self {
            root_uri,
            posts: unique,
            index,
            children,
            truncated: Vec::new(),
        }
    }

    pub(crate) fn with_truncations(mut self, truncated: Vec<Truncation>) -> Self {
        self.truncated = truncated;
        self
    }

    pub fn root_uri(&self) -> Option<&str> {
        self.root_uri.as_deref()
    }

    pub fn root(&self) -> Option<&Post> {
        self.root_uri.as_deref().and_then(|uri| self.get(uri))
    }

    /// All posts in traversal order
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.index.contains_key(uri)
    }

    pub fn get(&self, uri: &str) -> Option<&Post> {
        self.index.get(uri).map(|&i| &self.posts[i])
    }

    /// Parent URI of a post; `None` for roots, quote posts and unknown URIs
    pub fn parent_uri(&self, uri: &str) -> Option<&str> {
        self.get(uri).and_then(|post| post.parent_uri.as_deref())
    }

    /// Parent post, if it is part of this tree
    pub fn parent(&self, uri: &str) -> Option<&Post> {
        self.parent_uri(uri).and_then(|parent| self.get(parent))
    }

    /// URIs of the direct replies present in this tree
    pub fn children(&self, uri: &str) -> &[String] {
        self.children.get(uri).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Truncation records found while building the tree
    pub fn truncated(&self) -> &[Truncation] {
        &self.truncated
    }

    /// Distinct author handles on the path from the root down to `uri`
    ///
    /// The walk is bounded by the number of posts, so a malformed parent
    /// cycle cannot loop forever.
    pub fn branch_authors(&self, uri: &str) -> Vec<String> {
        let mut path = Vec::new();
        let mut current = self.get(uri);

        while let Some(post) = current {
            if path.len() > self.posts.len() {
                tracing::warn!("parent cycle detected while walking up from {}", uri);
                break;
            }
            path.push(post.author.handle.as_str());
            current = post.parent_uri.as_deref().and_then(|p| self.get(p));
        }

        let mut seen = HashSet::new();
        path.into_iter()
            .rev()
            .filter(|handle| seen.insert(*handle))
            .map(str::to_string)
            .collect()
    }

    /// Consumes the tree, returning its posts and truncation records
    pub fn into_parts(self) -> (Vec<Post>, Vec<Truncation>) {
        (self.posts, self.truncated)
    }
}
