//! Thread-Weaver main entry point
//!
//! This is the command-line interface for the Thread-Weaver thread crawler.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use thread_weaver::config::{load_config_with_hash, Config};
use thread_weaver::output::{print_statistics, write_json};
use thread_weaver::{normalize_post_uri, ThreadFetcher};
use tracing_subscriber::EnvFilter;

/// Thread-Weaver: complete Bluesky thread crawler
///
/// Thread-Weaver fetches a discussion thread, re-fetches branches the server
/// cut short, and follows quote posts and quotes of quotes up to a bounded
/// depth.
#[derive(Parser, Debug)]
#[command(name = "thread-weaver")]
#[command(version)]
#[command(about = "Crawls a complete Bluesky thread", long_about = None)]
struct Cli {
    /// Root post, as an at:// URI or a bsky.app post URL
    #[arg(value_name = "POST")]
    post: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write the collected posts to this file as JSON
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    let root_uri = normalize_post_uri(&cli.post)?;
    tracing::info!("Crawling thread {}", root_uri);

    let fetcher = ThreadFetcher::from_config(&config)?.with_progress(|progress| {
        tracing::info!(
            "[{}] {} ({} posts)",
            progress.stage,
            progress.message,
            progress.total_posts
        );
    });

    let result = fetcher.crawl(&root_uri).await;
    if result.root_post.is_none() {
        anyhow::bail!("thread {} could not be fetched", root_uri);
    }

    if !cli.quiet {
        print_statistics(&result.summary);
    }

    if let Some(path) = &cli.output {
        write_json(&result, path)?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("thread_weaver=info,warn"),
            1 => EnvFilter::new("thread_weaver=debug,info"),
            2 => EnvFilter::new("thread_weaver=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}
