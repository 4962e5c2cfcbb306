//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlState`: visited URIs, collected posts, queried quote sources and
//!   repaired subtrees, shared by every crawl phase
//! - `QuoteWork`: one pending quote-list crawl with its hop depth

mod crawl_state;

pub use crawl_state::{CrawlState, QuoteWork};
