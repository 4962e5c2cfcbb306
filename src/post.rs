//! Collected post representation
//!
//! A [`Post`] is the flattened, immutable form of an API `postView`, annotated
//! with where the crawl found it: its depth inside the thread it was fetched
//! in and the URI of its parent (absent for thread roots and quote posts).

use crate::api::types::PostView;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const IMAGES_VIEW: &str = "app.bsky.embed.images#view";
const VIDEO_VIEW: &str = "app.bsky.embed.video#view";
const RECORD_VIEW: &str = "app.bsky.embed.record#view";
const RECORD_WITH_MEDIA_VIEW: &str = "app.bsky.embed.recordWithMedia#view";
const RECORD_EMBED: &str = "app.bsky.embed.record";
const RECORD_WITH_MEDIA_EMBED: &str = "app.bsky.embed.recordWithMedia";

/// Author identity of a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub did: String,
    pub handle: String,
    pub display_name: Option<String>,
}

/// A post collected by the crawl
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Stable identifier (AT URI)
    pub uri: String,

    /// Content hash of the record
    pub cid: String,

    pub author: Author,

    /// Record creation time, falling back to the index time
    pub created_at: Option<DateTime<Utc>>,

    pub text: String,

    /// Alt texts of embedded images or video
    pub alt_texts: Vec<String>,

    /// URI of the quoted post, if this post quotes one
    pub quoted_uri: Option<String>,

    /// Direct reply count as reported by the server
    pub reply_count: u32,

    /// Quote count as reported by the server
    pub quote_count: u32,

    pub like_count: u32,
    pub repost_count: u32,

    /// Distance from the root of the thread this post was fetched in
    pub depth: u32,

    /// Parent post; `None` for thread roots and quote posts
    pub parent_uri: Option<String>,
}

impl Post {
    /// Builds a post from an API view
    pub fn from_view(view: &PostView, depth: u32, parent_uri: Option<&str>) -> Self {
        let text = view
            .record
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let created_at = view
            .record
            .get("createdAt")
            .and_then(Value::as_str)
            .and_then(parse_timestamp)
            .or_else(|| view.indexed_at.as_deref().and_then(parse_timestamp));

        let mut alt_texts = Vec::new();
        let mut quoted_uri = None;
        if let Some(embed) = &view.embed {
            collect_embed(embed, &mut alt_texts, &mut quoted_uri);
        }
        if quoted_uri.is_none() {
            quoted_uri = quoted_uri_from_record(&view.record);
        }

        Self {
            uri: view.uri.clone(),
            cid: view.cid.clone(),
            author: Author {
                did: view.author.did.clone(),
                handle: view.author.handle.clone(),
                display_name: view.author.display_name.clone(),
            },
            created_at,
            text,
            alt_texts,
            quoted_uri,
            reply_count: view.reply_count.unwrap_or(0),
            quote_count: view.quote_count.unwrap_or(0),
            like_count: view.like_count.unwrap_or(0),
            repost_count: view.repost_count.unwrap_or(0),
            depth,
            parent_uri: parent_uri.map(str::to_string),
        }
    }

    /// Returns true if the post embeds another post
    pub fn is_quote(&self) -> bool {
        self.quoted_uri.is_some()
    }

    /// Returns true if the server reports at least one reply
    pub fn has_replies(&self) -> bool {
        self.reply_count > 0
    }

    /// Returns true if the post is quoted often enough to be crawled for quotes
    pub fn meets_quote_threshold(&self, threshold: u32) -> bool {
        self.quote_count >= threshold
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn embed_type(embed: &Value) -> &str {
    embed.get("$type").and_then(Value::as_str).unwrap_or_default()
}

fn collect_embed(embed: &Value, alt_texts: &mut Vec<String>, quoted_uri: &mut Option<String>) {
    match embed_type(embed) {
        IMAGES_VIEW => {
            let images = embed.get("images").and_then(Value::as_array);
            for image in images.into_iter().flatten() {
                if let Some(alt) = image.get("alt").and_then(Value::as_str) {
                    if !alt.is_empty() {
                        alt_texts.push(alt.to_string());
                    }
                }
            }
        }
        VIDEO_VIEW => {
            if let Some(alt) = embed.get("alt").and_then(Value::as_str) {
                if !alt.is_empty() {
                    alt_texts.push(alt.to_string());
                }
            }
        }
        RECORD_VIEW => {
            *quoted_uri = embed
                .pointer("/record/uri")
                .and_then(Value::as_str)
                .map(str::to_string);
        }
        RECORD_WITH_MEDIA_VIEW => {
            *quoted_uri = embed
                .pointer("/record/record/uri")
                .and_then(Value::as_str)
                .map(str::to_string);
            if let Some(media) = embed.get("media") {
                collect_embed(media, alt_texts, quoted_uri);
            }
        }
        _ => {}
    }
}

/// Reads the quoted URI from the raw record when the view carries no embed
fn quoted_uri_from_record(record: &Value) -> Option<String> {
    let embed = record.get("embed")?;
    let pointer = match embed_type(embed) {
        RECORD_EMBED => "/record/uri",
        RECORD_WITH_MEDIA_EMBED => "/record/record/uri",
        _ => return None,
    };
    embed.pointer(pointer).and_then(Value::as_str).map(str::to_string)
}
