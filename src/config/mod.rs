//! Configuration module for Thread-Weaver
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional; missing keys fall back to the defaults.
//!
//! # Example
//!
//! ```no_run
//! use thread_weaver::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("weaver.toml")).unwrap();
//! println!("Quote threshold: {}", config.crawler.quote_threshold);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{ClientConfig, Config, CrawlerConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
