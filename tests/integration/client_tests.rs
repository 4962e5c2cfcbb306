//! Integration tests for the HTTP API client
//!
//! These tests use wiremock to stand in for the AppView and exercise the
//! real `ApiClient`: query encoding, 429 retries and error mapping.

use serde_json::json;
use thread_weaver::api::{latest_rate_limit, ApiClient, ApiError, ThreadApi, ThreadNode};
use thread_weaver::config::ClientConfig;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a client config pointing at the mock server with instant backoff
fn create_test_config(base_url: &str, max_retries: u32) -> ClientConfig {
    ClientConfig {
        base_url: base_url.to_string(),
        max_retries,
        backoff_base_ms: 1,
        max_backoff_ms: 10,
        ..ClientConfig::default()
    }
}

fn thread_body(uri: &str) -> serde_json::Value {
    json!({
        "thread": {
            "$type": "app.bsky.feed.defs#threadViewPost",
            "post": {
                "uri": uri,
                "cid": "bafyroot",
                "author": { "did": "did:plc:alice", "handle": "alice.test" },
                "record": { "text": "root", "createdAt": "2024-05-01T12:00:00Z" },
                "replyCount": 0
            },
            "replies": []
        }
    })
}

const ROOT: &str = "at://did:plc:alice/app.bsky.feed.post/root";

#[tokio::test]
async fn test_get_post_thread_sends_query() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/xrpc/app.bsky.feed.getPostThread"))
        .and(query_param("uri", ROOT))
        .and(query_param("depth", "1000"))
        .and(query_param("parentHeight", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(thread_body(ROOT)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(&create_test_config(&mock_server.uri(), 3)).unwrap();
    let response = client.get_post_thread(ROOT, 1000, 0).await.unwrap();

    match response.thread {
        ThreadNode::Post(node) => assert_eq!(node.post.uri, ROOT),
        other => panic!("unexpected node: {:?}", other),
    }
}

#[tokio::test]
async fn test_get_quotes_passes_cursor_and_limit() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/xrpc/app.bsky.feed.getQuotes"))
        .and(query_param("uri", ROOT))
        .and(query_param("cursor", "page2"))
        .and(query_param("limit", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uri": ROOT,
            "posts": []
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(&create_test_config(&mock_server.uri(), 3)).unwrap();
    let page = client.get_quotes(ROOT, Some("page2"), Some(50)).await.unwrap();

    assert!(page.posts.is_empty());
    assert!(page.cursor.is_none());
}

#[tokio::test]
async fn test_rate_limited_request_is_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/xrpc/app.bsky.feed.getPostThread"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/xrpc/app.bsky.feed.getPostThread"))
        .respond_with(ResponseTemplate::new(200).set_body_json(thread_body(ROOT)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(&create_test_config(&mock_server.uri(), 3)).unwrap();
    let response = client.get_post_thread(ROOT, 10, 0).await;

    assert!(response.is_ok(), "expected success, got {:?}", response.err());
}

#[tokio::test]
async fn test_rate_limit_retries_are_bounded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/xrpc/app.bsky.feed.getQuotes"))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(&create_test_config(&mock_server.uri(), 2)).unwrap();
    let error = client.get_quotes(ROOT, None, None).await.unwrap_err();

    assert_eq!(error, ApiError::RateLimited { attempts: 3 });
    assert!(error.is_rate_limited());
}

#[tokio::test]
async fn test_retry_after_beyond_backoff_limit_gives_up() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/xrpc/app.bsky.feed.getPostThread"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "120"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(&create_test_config(&mock_server.uri(), 3)).unwrap();
    let error = client.get_post_thread(ROOT, 10, 0).await.unwrap_err();

    assert_eq!(error, ApiError::RateLimited { attempts: 1 });
}

#[tokio::test]
async fn test_client_error_uses_xrpc_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/xrpc/app.bsky.feed.getPostThread"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "NotFound",
            "message": "Post not found: at://did:plc:alice/app.bsky.feed.post/gone"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(&create_test_config(&mock_server.uri(), 3)).unwrap();
    let error = client.get_post_thread(ROOT, 10, 0).await.unwrap_err();

    assert_eq!(error.status(), Some(400));
    assert_eq!(
        error,
        ApiError::Status {
            status: 400,
            message: "Post not found: at://did:plc:alice/app.bsky.feed.post/gone".to_string(),
        }
    );
}

#[tokio::test]
async fn test_server_error_without_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/xrpc/app.bsky.feed.getQuotes"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(&create_test_config(&mock_server.uri(), 3)).unwrap();
    let error = client.get_quotes(ROOT, None, None).await.unwrap_err();

    assert_eq!(
        error,
        ApiError::Status {
            status: 502,
            message: "Bad Gateway".to_string(),
        }
    );
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/xrpc/app.bsky.feed.getPostThread"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(&create_test_config(&mock_server.uri(), 3)).unwrap();
    let error = client.get_post_thread(ROOT, 10, 0).await.unwrap_err();

    assert!(matches!(error, ApiError::Decode(_)), "got {:?}", error);
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    // Nothing listens on the discard port
    let client = ApiClient::new(&create_test_config("http://127.0.0.1:9", 3)).unwrap();
    let error = client.get_post_thread(ROOT, 10, 0).await.unwrap_err();

    assert!(matches!(error, ApiError::Transport(_)), "got {:?}", error);
}

#[tokio::test]
async fn test_rate_limit_headers_are_recorded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/xrpc/app.bsky.feed.getPostThread"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(thread_body(ROOT))
                .insert_header("ratelimit-limit", "3000")
                .insert_header("ratelimit-remaining", "2999")
                .insert_header("ratelimit-reset", "1714564800")
                .insert_header("ratelimit-policy", "3000;w=300"),
        )
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(&create_test_config(&mock_server.uri(), 3)).unwrap();
    client.get_post_thread(ROOT, 10, 0).await.unwrap();

    let snapshot = latest_rate_limit().expect("snapshot recorded");
    assert_eq!(snapshot.limit, Some(3000));
    assert_eq!(snapshot.remaining, Some(2999));
    assert_eq!(snapshot.reset.map(|t| t.timestamp()), Some(1714564800));
    assert_eq!(snapshot.policy.as_deref(), Some("3000;w=300"));
}
