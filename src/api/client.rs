//! HTTP implementation of [`ThreadApi`]
//!
//! Handles:
//! - Building the reqwest client with timeouts and user agent
//! - Recording rate-limit headers from successful responses
//! - Retrying HTTP 429 with a bounded number of backoff waits
//! - Mapping every other failure to an [`ApiError`]

use crate::api::rate_limit::{compute_backoff, record_snapshot, server_wait, RateLimitSnapshot};
use crate::api::types::{QuotesPage, ThreadResponse, XrpcErrorBody};
use crate::api::{ApiError, ApiResult, ThreadApi};
use crate::config::ClientConfig;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const GET_POST_THREAD: &str = "app.bsky.feed.getPostThread";
pub const GET_QUOTES: &str = "app.bsky.feed.getQuotes";

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The client configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &ClientConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.timeout())
        .connect_timeout(config.connect_timeout())
        .gzip(true)
        .brotli(true)
        .build()
}

/// AppView client with rate-limit aware retries
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    max_retries: u32,
    backoff_base: Duration,
    max_backoff: Duration,
}

impl ApiClient {
    /// Creates a client from configuration
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let http = build_http_client(config)
            .map_err(|e| ApiError::InvalidRequest(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries,
            backoff_base: config.backoff_base(),
            max_backoff: config.max_backoff(),
        })
    }

    fn endpoint(&self, nsid: &str) -> String {
        format!("{}/xrpc/{}", self.base_url, nsid)
    }

    /// Issues a GET against an XRPC endpoint and decodes the JSON body
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | HTTP 2xx | Decode body, record rate-limit headers |
    /// | HTTP 429 | Wait per [`compute_backoff`], retry up to `max_retries` times |
    /// | HTTP 429, server wait above `max_backoff` | Immediate [`ApiError::RateLimited`] |
    /// | Other non-2xx | Immediate [`ApiError::Status`] |
    /// | Transport failure | Immediate [`ApiError::Transport`] |
    /// | Undecodable 2xx body | Immediate [`ApiError::Decode`] |
    async fn get_json<T: DeserializeOwned>(
        &self,
        nsid: &str,
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        let url = self.endpoint(nsid);
        let mut attempt = 0;

        loop {
            tracing::debug!("GET {} {:?} (attempt {})", nsid, query, attempt + 1);

            let response = self
                .http
                .get(&url)
                .query(query)
                .send()
                .await
                .map_err(|e| ApiError::Transport(e.to_string()))?;

            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                if attempt >= self.max_retries {
                    tracing::warn!("{} still rate limited after {} attempts", nsid, attempt + 1);
                    return Err(ApiError::RateLimited {
                        attempts: attempt + 1,
                    });
                }

                let now = Utc::now();
                let demanded = server_wait(response.headers(), now);
                if let Some(wait) = demanded.filter(|wait| *wait > self.max_backoff) {
                    tracing::warn!(
                        "{} rate limited for {:?}, longer than the {:?} backoff limit",
                        nsid,
                        wait,
                        self.max_backoff
                    );
                    return Err(ApiError::RateLimited {
                        attempts: attempt + 1,
                    });
                }

                let wait = compute_backoff(attempt, response.headers(), now, self.backoff_base)
                    .min(self.max_backoff);
                tracing::warn!(
                    "{} rate limited, retrying in {:?} ({}/{})",
                    nsid,
                    wait,
                    attempt + 1,
                    self.max_retries
                );
                tokio::time::sleep(wait).await;
                attempt += 1;
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let error = status_error(status, &body);
                tracing::debug!("{} failed: {}", nsid, error);
                return Err(error);
            }

            if let Some(snapshot) = RateLimitSnapshot::from_headers(response.headers()) {
                tracing::trace!("rate limit: {:?}", snapshot);
                record_snapshot(snapshot);
            }

            let body = response
                .bytes()
                .await
                .map_err(|e| ApiError::Transport(e.to_string()))?;

            return serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()));
        }
    }
}

#[async_trait]
impl ThreadApi for ApiClient {
    async fn get_post_thread(
        &self,
        uri: &str,
        depth: u32,
        parent_height: u32,
    ) -> ApiResult<ThreadResponse> {
        let query = [
            ("uri", uri.to_string()),
            ("depth", depth.to_string()),
            ("parentHeight", parent_height.to_string()),
        ];
        self.get_json(GET_POST_THREAD, &query).await
    }

    async fn get_quotes(
        &self,
        uri: &str,
        cursor: Option<&str>,
        limit: Option<u32>,
    ) -> ApiResult<QuotesPage> {
        let mut query = vec![("uri", uri.to_string())];
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor.to_string()));
        }
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }
        self.get_json(GET_QUOTES, &query).await
    }
}

/// Maps a non-2xx response to an error, preferring the XRPC error message
fn status_error(status: StatusCode, body: &str) -> ApiError {
    let parsed = serde_json::from_str::<XrpcErrorBody>(body).ok();
    let message = parsed
        .and_then(|b| b.message.or(b.error))
        .filter(|m| !m.is_empty())
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| status.as_u16().to_string());

    ApiError::Status {
        status: status.as_u16(),
        message,
    }
}
