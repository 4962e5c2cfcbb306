//! Wire types of the AppView endpoints used by the crawler
//!
//! Only the fields the crawl needs are modelled; everything else in the
//! responses is ignored during deserialization.

use serde::Deserialize;
use serde_json::Value;

/// Response body of `app.bsky.feed.getPostThread`
#[derive(Debug, Clone, Deserialize)]
pub struct ThreadResponse {
    pub thread: ThreadNode,
}

/// One node of a nested thread, discriminated by `$type`
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "$type")]
pub enum ThreadNode {
    #[serde(rename = "app.bsky.feed.defs#threadViewPost")]
    Post(ThreadViewPost),

    #[serde(rename = "app.bsky.feed.defs#notFoundPost")]
    NotFound(NotFoundPost),

    #[serde(rename = "app.bsky.feed.defs#blockedPost")]
    Blocked(BlockedPost),

    #[serde(other)]
    Unknown,
}

impl ThreadNode {
    /// URI of the node, if the node type carries one
    pub fn uri(&self) -> Option<&str> {
        match self {
            Self::Post(node) => Some(&node.post.uri),
            Self::NotFound(node) => Some(&node.uri),
            Self::Blocked(node) => Some(&node.uri),
            Self::Unknown => None,
        }
    }
}

/// A viewable post together with whatever replies the server returned
#[derive(Debug, Clone, Deserialize)]
pub struct ThreadViewPost {
    pub post: PostView,

    /// Absent when the requested depth was exhausted
    #[serde(default)]
    pub replies: Vec<ThreadNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotFoundPost {
    pub uri: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockedPost {
    pub uri: String,
}

/// `app.bsky.feed.defs#postView`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub uri: String,
    pub cid: String,
    pub author: ProfileViewBasic,
    #[serde(default)]
    pub record: Value,
    pub embed: Option<Value>,
    pub reply_count: Option<u32>,
    pub repost_count: Option<u32>,
    pub like_count: Option<u32>,
    pub quote_count: Option<u32>,
    pub indexed_at: Option<String>,
}

/// `app.bsky.actor.defs#profileViewBasic`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileViewBasic {
    pub did: String,
    pub handle: String,
    pub display_name: Option<String>,
}

/// Response body of `app.bsky.feed.getQuotes`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuotesPage {
    pub uri: Option<String>,
    pub cursor: Option<String>,
    #[serde(default)]
    pub posts: Vec<PostView>,
}

/// Error body returned by XRPC endpoints on failure
#[derive(Debug, Clone, Deserialize)]
pub struct XrpcErrorBody {
    pub error: Option<String>,
    pub message: Option<String>,
}
