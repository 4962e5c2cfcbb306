//! Output module for crawl reports and exports
//!
//! This module handles:
//! - Printing the per-phase crawl statistics
//! - Exporting the collected posts as JSON

mod json;
pub mod stats;

pub use json::write_json;
pub use stats::{format_statistics, print_statistics};
