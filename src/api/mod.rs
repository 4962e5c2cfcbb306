//! Client for the public AppView read API
//!
//! This module contains:
//! - The [`ThreadApi`] trait, the seam the crawler talks to
//! - [`ApiClient`], the reqwest implementation with 429 backoff and retry
//! - Wire types for `getPostThread` and `getQuotes`
//! - Rate-limit header parsing and the backoff calculation

mod client;
pub mod rate_limit;
pub mod types;

pub use client::{build_http_client, ApiClient, GET_POST_THREAD, GET_QUOTES};
pub use rate_limit::{compute_backoff, latest_rate_limit, server_wait, RateLimitSnapshot};
pub use types::{PostView, QuotesPage, ThreadNode, ThreadResponse, ThreadViewPost};

use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by a single API call
///
/// Every failure of a call maps to one of these variants; callers never see
/// a transport exception directly.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("rate limited: gave up after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// HTTP status of the failure, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RateLimited { .. } => Some(429),
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

/// Result type for API calls
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// The two remote reads the crawl depends on
#[async_trait]
pub trait ThreadApi: Send + Sync {
    /// Fetches the nested reply tree rooted at `uri`
    async fn get_post_thread(
        &self,
        uri: &str,
        depth: u32,
        parent_height: u32,
    ) -> ApiResult<ThreadResponse>;

    /// Fetches one page of posts quoting `uri`
    async fn get_quotes(
        &self,
        uri: &str,
        cursor: Option<&str>,
        limit: Option<u32>,
    ) -> ApiResult<QuotesPage>;
}
