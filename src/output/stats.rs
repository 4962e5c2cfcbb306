//! Crawl statistics display
//!
//! This module renders the per-phase counts of a finished crawl.

use crate::crawler::CrawlSummary;
use std::fmt::Write;

/// Renders the statistics as the text printed by [`print_statistics`]
pub fn format_statistics(summary: &CrawlSummary) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "=== Crawl Statistics ===\n");

    let _ = writeln!(out, "Main Thread:");
    let _ = writeln!(out, "  Posts: {}", summary.main_thread_posts);
    let _ = writeln!(
        out,
        "  Truncated branches: {} ({} re-fetched, {} posts recovered)",
        summary.truncations_found, summary.truncations_repaired, summary.repaired_posts
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "Quotes:");
    let _ = writeln!(out, "  Direct quotes: {}", summary.direct_quotes);
    let _ = writeln!(out, "  Replies to quotes: {}", summary.quote_replies);
    let _ = writeln!(out, "  Quotes of quotes: {}", summary.recursive_quotes);
    let _ = writeln!(out, "  Replies to quotes of quotes: {}", summary.recursive_replies);
    let _ = writeln!(out, "  Quote lists queried: {}", summary.quote_sources_queried);
    let _ = writeln!(out);

    if summary.failed_fetches > 0 {
        let _ = writeln!(out, "Failed fetches: {}\n", summary.failed_fetches);
    }

    let main_share = if summary.total_posts > 0 {
        ((summary.main_thread_posts + summary.repaired_posts) as f64
            / summary.total_posts as f64)
            * 100.0
    } else {
        0.0
    };
    let _ = writeln!(
        out,
        "Total: {} posts ({:.1}% from the reply tree)",
        summary.total_posts, main_share
    );

    out
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `summary` - The crawl counts to display
pub fn print_statistics(summary: &CrawlSummary) {
    print!("{}", format_statistics(summary));
}
