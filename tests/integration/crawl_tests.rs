//! Integration tests for the crawler
//!
//! These tests use wiremock to create a mock AppView and run complete
//! crawls end-to-end through the HTTP client.

use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use thread_weaver::config::{ClientConfig, Config, CrawlerConfig};
use thread_weaver::crawler::{crawl, CrawlStage, ThreadFetcher};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ROOT: &str = "at://did:plc:alice/app.bsky.feed.post/root";
const R1: &str = "at://did:plc:bob/app.bsky.feed.post/r1";
const R1A: &str = "at://did:plc:alice/app.bsky.feed.post/r1a";
const Q1: &str = "at://did:plc:carol/app.bsky.feed.post/q1";
const Q1R: &str = "at://did:plc:dave/app.bsky.feed.post/q1r";
const QQ1: &str = "at://did:plc:erin/app.bsky.feed.post/qq1";

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str) -> Config {
    Config {
        client: ClientConfig {
            base_url: base_url.to_string(),
            max_retries: 1,
            backoff_base_ms: 1,
            max_backoff_ms: 10,
            ..ClientConfig::default()
        },
        crawler: CrawlerConfig {
            max_concurrent_requests: 2,
            ..CrawlerConfig::default()
        },
    }
}

fn view(uri: &str, replies: u32, quotes: u32) -> Value {
    let handle = uri.split('/').nth(2).unwrap_or("unknown");
    json!({
        "uri": uri,
        "cid": "bafy",
        "author": { "did": handle, "handle": format!("{}.test", handle) },
        "record": { "text": format!("post {}", uri) },
        "replyCount": replies,
        "quoteCount": quotes
    })
}

fn node(post: Value, replies: Vec<Value>) -> Value {
    json!({
        "$type": "app.bsky.feed.defs#threadViewPost",
        "post": post,
        "replies": replies
    })
}

async fn mount_thread(server: &MockServer, uri: &str, thread: Value) {
    Mock::given(method("GET"))
        .and(path("/xrpc/app.bsky.feed.getPostThread"))
        .and(query_param("uri", uri))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "thread": thread })))
        .mount(server)
        .await;
}

async fn mount_quotes(server: &MockServer, uri: &str, cursor: Option<&str>, body: Value) {
    let mock = Mock::given(method("GET"))
        .and(path("/xrpc/app.bsky.feed.getQuotes"))
        .and(query_param("uri", uri));
    let mock = match cursor {
        Some(cursor) => mock.and(query_param("cursor", cursor)),
        None => mock,
    };
    mock.respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_all_phases() {
    let mock_server = MockServer::start().await;

    // Main thread: R1 claims one reply but none is included
    mount_thread(
        &mock_server,
        ROOT,
        node(view(ROOT, 1, 1), vec![node(view(R1, 1, 0), vec![])]),
    )
    .await;
    mount_thread(
        &mock_server,
        R1,
        node(view(R1, 1, 0), vec![node(view(R1A, 0, 0), vec![])]),
    )
    .await;

    // Cursor-specific mocks first so they win over the first-page mocks
    mount_quotes(&mock_server, ROOT, Some("c1"), json!({ "uri": ROOT, "posts": [] })).await;
    mount_quotes(
        &mock_server,
        ROOT,
        None,
        json!({ "uri": ROOT, "cursor": "c1", "posts": [view(Q1, 1, 3)] }),
    )
    .await;
    mount_thread(
        &mock_server,
        Q1,
        node(view(Q1, 1, 3), vec![node(view(Q1R, 0, 0), vec![])]),
    )
    .await;
    mount_quotes(
        &mock_server,
        Q1,
        None,
        json!({ "uri": Q1, "posts": [view(QQ1, 0, 0)] }),
    )
    .await;

    let config = create_test_config(&mock_server.uri());
    let stages = Arc::new(Mutex::new(Vec::new()));
    let sink = stages.clone();
    let fetcher = ThreadFetcher::from_config(&config)
        .unwrap()
        .with_progress(move |progress| sink.lock().unwrap().push(progress.stage));

    let result = fetcher.crawl(ROOT).await;

    let uris: Vec<&str> = result.posts.iter().map(|p| p.uri.as_str()).collect();
    assert_eq!(uris, vec![ROOT, R1, R1A, Q1, Q1R, QQ1]);
    assert_eq!(result.root_post.as_ref().map(|p| p.uri.as_str()), Some(ROOT));

    let summary = &result.summary;
    assert_eq!(summary.main_thread_posts, 2);
    assert_eq!(summary.truncations_found, 1);
    assert_eq!(summary.truncations_repaired, 1);
    assert_eq!(summary.repaired_posts, 1);
    assert_eq!(summary.direct_quotes, 1);
    assert_eq!(summary.quote_replies, 1);
    assert_eq!(summary.recursive_quotes, 1);
    assert_eq!(summary.failed_fetches, 0);
    assert_eq!(summary.total_posts, 6);

    let tree = result.tree();
    assert_eq!(tree.parent_uri(R1A), Some(R1));
    assert_eq!(tree.get(R1A).map(|p| p.depth), Some(2));
    assert_eq!(tree.parent_uri(Q1R), Some(Q1));
    assert_eq!(tree.parent_uri(Q1), None);
    assert_eq!(tree.parent_uri(QQ1), None);

    let stages = stages.lock().unwrap();
    assert_eq!(stages.first(), Some(&CrawlStage::MainThread));
    assert_eq!(stages.last(), Some(&CrawlStage::Complete));
}

#[tokio::test]
async fn test_crawl_of_missing_thread_is_empty() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/xrpc/app.bsky.feed.getPostThread"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "NotFound",
            "message": "Post not found"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/xrpc/app.bsky.feed.getQuotes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "uri": ROOT, "posts": [] })))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri());
    let result = crawl(&config, ROOT).await.unwrap();

    assert!(result.is_empty());
    assert!(result.root_post.is_none());
    assert_eq!(result.summary.total_posts, 0);
}

#[tokio::test]
async fn test_crawl_survives_failing_quote_listing() {
    let mock_server = MockServer::start().await;

    mount_thread(
        &mock_server,
        ROOT,
        node(view(ROOT, 1, 5), vec![node(view(R1, 0, 0), vec![])]),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/xrpc/app.bsky.feed.getQuotes"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": "InternalServerError",
            "message": "Internal Server Error"
        })))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri());
    let result = crawl(&config, ROOT).await.unwrap();

    let uris: Vec<&str> = result.posts.iter().map(|p| p.uri.as_str()).collect();
    assert_eq!(uris, vec![ROOT, R1]);
    assert_eq!(result.summary.failed_fetches, 1);
    assert_eq!(result.summary.direct_quotes, 0);
}
