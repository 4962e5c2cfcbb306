use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Thread-Weaver
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
}

/// API client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ClientConfig {
    /// Base URL of the public AppView API
    pub base_url: String,

    /// User-Agent header sent with every request
    pub user_agent: String,

    /// Total request timeout (seconds)
    pub timeout_secs: u64,

    /// Connection timeout (seconds)
    pub connect_timeout_secs: u64,

    /// Number of retries after an HTTP 429 before giving up
    pub max_retries: u32,

    /// Base delay of the exponential backoff (milliseconds)
    pub backoff_base_ms: u64,

    /// Upper bound for any single backoff wait (milliseconds)
    pub max_backoff_ms: u64,
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://public.api.bsky.app".to_string(),
            user_agent: concat!("thread-weaver/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
            max_retries: 3,
            backoff_base_ms: 1000,
            max_backoff_ms: 60_000,
        }
    }
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CrawlerConfig {
    /// Reply depth requested from getPostThread
    pub thread_depth: u32,

    /// Parent height requested from getPostThread
    pub parent_height: u32,

    /// Page size requested from getQuotes
    pub quotes_page_limit: u32,

    /// Minimum quote count for a post to be crawled for quotes of quotes
    pub quote_threshold: u32,

    /// Maximum quote-hop depth of the recursive quote crawl
    pub max_quote_depth: u32,

    /// Maximum number of in-flight requests within one batch
    pub max_concurrent_requests: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            thread_depth: 1000,
            parent_height: 0,
            quotes_page_limit: 100,
            quote_threshold: 3,
            max_quote_depth: 3,
            max_concurrent_requests: 8,
        }
    }
}
