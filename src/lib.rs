//! Thread-Weaver: a complete-thread crawler for the Bluesky public API
//!
//! This crate ingests a discussion thread into a deduplicated post collection,
//! repairing reply lists truncated by the server, following quote posts and
//! their reply sub-threads, and recursively crawling quotes of quotes up to a
//! bounded depth.

pub mod api;
pub mod config;
pub mod crawler;
pub mod output;
pub mod post;
pub mod state;
pub mod tree;
pub mod uri;

use thiserror::Error;

/// Main error type for Thread-Weaver operations
#[derive(Debug, Error)]
pub enum WeaverError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("API error: {0}")]
    Api(#[from] api::ApiError),

    #[error("URI error: {0}")]
    Uri(#[from] UriError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Post URI errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UriError {
    #[error("Failed to parse post URI: {0}")]
    Parse(String),

    #[error("Unsupported URI scheme: {0}")]
    InvalidScheme(String),

    #[error("Not a post URI: {0}")]
    NotAPost(String),

    #[error("Missing authority in URI")]
    MissingAuthority,
}

/// Result type alias for Thread-Weaver operations
pub type Result<T> = std::result::Result<T, WeaverError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URI operations
pub type UriResult<T> = std::result::Result<T, UriError>;

// Re-export commonly used types
pub use api::{ApiClient, ApiError, ThreadApi};
pub use config::Config;
pub use crawler::{CrawlProgress, CrawlResult, CrawlStage, CrawlSummary, ThreadFetcher};
pub use post::{Author, Post};
pub use tree::{build_thread_tree, ThreadTree, Truncation};
pub use uri::{normalize_post_uri, AtUri};
