//! Integration tests for the resilient source clients.
//!
//! Every test drives a real client against a local mock server, so the
//! full shell is exercised: cache check, rate-limited admission, retry
//! with backoff, and payload normalization.

use std::time::Duration;

use paperscout::sources::arxiv::{ArxivClient, ArxivConfig};
use paperscout::sources::openalex::{OpenAlexClient, OpenAlexConfig};
use paperscout::{FileResultCache, NoOpCache, ResultCache, RetryPolicy, SearchOutcome, SourceClient};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        backoff_base: Duration::from_millis(5),
        rate_limit_backoff: Duration::from_millis(5),
    }
}

fn openalex_client(server_uri: &str, cache: Box<dyn ResultCache>) -> OpenAlexClient {
    let config = OpenAlexConfig::default()
        .with_base_url(format!("{}/works", server_uri))
        .with_mailto("tests@example.org")
        .with_retry(fast_retry());
    OpenAlexClient::new(config, cache).unwrap()
}

fn arxiv_client(server_uri: &str, cache: Box<dyn ResultCache>) -> ArxivClient {
    let config = ArxivConfig::default()
        .with_base_url(format!("{}/api/query", server_uri))
        .with_retry(fast_retry());
    ArxivClient::new(config, cache).unwrap()
}

fn openalex_body() -> serde_json::Value {
    json!({
        "results": [
            {
                "title": "Attention is all you need",
                "publication_year": 2017,
                "cited_by_count": 90000,
                "abstract_inverted_index": {"a": [0, 2], "b": [1]},
                "authorships": [
                    {"author": {"display_name": "Ashish Vaswani"}}
                ],
                "id": "https://openalex.org/W2741809807"
            }
        ]
    })
}

const ARXIV_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>ArXiv Query</title>
  <entry>
    <id>http://arxiv.org/abs/1706.03762v7</id>
    <published>2017-06-12T17:57:34Z</published>
    <title>Attention Is All You Need</title>
    <summary>The dominant sequence transduction models.</summary>
    <author><name>Ashish Vaswani</name></author>
  </entry>
</feed>"#;

// ============= OpenAlex =============

#[tokio::test]
async fn test_openalex_normalizes_works() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/works"))
        .and(query_param("search", "transformers"))
        .and(query_param("sort", "cited_by_count:desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openalex_body()))
        .mount(&server)
        .await;

    let client = openalex_client(&server.uri(), Box::new(NoOpCache::new()));
    let papers = client.search("transformers", 10).await;

    assert_eq!(papers.len(), 1);
    assert_eq!(papers[0].title, "Attention is all you need");
    assert_eq!(papers[0].abstract_text, "a b a");
    assert_eq!(papers[0].year, 2017);
    assert_eq!(papers[0].citation_count, 90000);
    assert_eq!(papers[0].authors[0].name, "Ashish Vaswani");
    assert_eq!(papers[0].url, "https://openalex.org/W2741809807");
}

#[tokio::test]
async fn test_openalex_caps_per_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/works"))
        .and(query_param("per_page", "200"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openalex_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = openalex_client(&server.uri(), Box::new(NoOpCache::new()));
    let papers = client.search("transformers", 5000).await;
    assert_eq!(papers.len(), 1);
}

#[tokio::test]
async fn test_openalex_cache_idempotence() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/works"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openalex_body()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let cache = FileResultCache::new(dir.path()).unwrap();
    let client = openalex_client(&server.uri(), Box::new(cache));

    let first = client.search("transformers", 10).await;
    let second = client.search("transformers", 10).await;

    // Identical lists, and the expect(1) above verifies the second call
    // never reached the server.
    assert_eq!(first, second);
    assert_eq!(first.len(), 1);
}

#[tokio::test]
async fn test_openalex_retries_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/works"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/works"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openalex_body()))
        .mount(&server)
        .await;

    let client = openalex_client(&server.uri(), Box::new(NoOpCache::new()));
    let outcome = client.search_outcome("transformers", 10).await;

    assert!(outcome.is_success());
}

#[tokio::test]
async fn test_openalex_gives_up_after_retry_budget() {
    let server = MockServer::start().await;
    // Three attempts per search, two searches below.
    Mock::given(method("GET"))
        .and(path("/works"))
        .respond_with(ResponseTemplate::new(500))
        .expect(6)
        .mount(&server)
        .await;

    let client = openalex_client(&server.uri(), Box::new(NoOpCache::new()));
    let outcome = client.search_outcome("transformers", 10).await;

    assert!(matches!(outcome, SearchOutcome::TransientFailure(_)));
    // The public boundary degrades the same failure to an empty list.
    assert!(client.search("transformers", 10).await.is_empty());
}

#[tokio::test]
async fn test_openalex_does_not_retry_client_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/works"))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&server)
        .await;

    let client = openalex_client(&server.uri(), Box::new(NoOpCache::new()));
    let outcome = client.search_outcome("transformers", 10).await;

    assert!(matches!(outcome, SearchOutcome::PermanentFailure(_)));
}

#[tokio::test]
async fn test_openalex_recovers_from_rate_limit_signal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/works"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/works"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openalex_body()))
        .mount(&server)
        .await;

    let client = openalex_client(&server.uri(), Box::new(NoOpCache::new()));
    let outcome = client.search_outcome("transformers", 10).await;

    assert!(outcome.is_success());
}

#[tokio::test]
async fn test_openalex_malformed_payload_is_permanent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/works"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"results\": \"oops\"}"))
        .expect(1)
        .mount(&server)
        .await;

    let client = openalex_client(&server.uri(), Box::new(NoOpCache::new()));
    let outcome = client.search_outcome("transformers", 10).await;

    assert!(matches!(outcome, SearchOutcome::PermanentFailure(_)));
}

#[tokio::test]
async fn test_openalex_empty_results_are_not_a_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/works"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .mount(&server)
        .await;

    let client = openalex_client(&server.uri(), Box::new(NoOpCache::new()));
    assert_eq!(
        client.search_outcome("unheard of topic", 10).await,
        SearchOutcome::Empty
    );
}

// ============= arXiv =============

#[tokio::test]
async fn test_arxiv_parses_atom_feed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/query"))
        .and(query_param("search_query", "all:transformers"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(ARXIV_FEED)
                .insert_header("content-type", "application/atom+xml"),
        )
        .mount(&server)
        .await;

    let client = arxiv_client(&server.uri(), Box::new(NoOpCache::new()));
    let papers = client.search("transformers", 10).await;

    assert_eq!(papers.len(), 1);
    assert_eq!(papers[0].title, "Attention Is All You Need");
    assert_eq!(
        papers[0].abstract_text,
        "The dominant sequence transduction models."
    );
    assert_eq!(papers[0].year, 2017);
    assert_eq!(papers[0].citation_count, 0);
    assert_eq!(papers[0].url, "http://arxiv.org/abs/1706.03762v7");
}

#[tokio::test]
async fn test_arxiv_cache_idempotence() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/query"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ARXIV_FEED))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let cache = FileResultCache::new(dir.path()).unwrap();
    let client = arxiv_client(&server.uri(), Box::new(cache));

    let first = client.search("transformers", 10).await;
    let second = client.search("transformers", 10).await;
    assert_eq!(first, second);
    assert_eq!(first.len(), 1);
}

#[tokio::test]
async fn test_arxiv_empty_feed_is_empty_outcome() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/query"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>empty</title></feed>"#,
        ))
        .mount(&server)
        .await;

    let client = arxiv_client(&server.uri(), Box::new(NoOpCache::new()));
    assert_eq!(
        client.search_outcome("nothing here", 10).await,
        SearchOutcome::Empty
    );
}

#[tokio::test]
async fn test_arxiv_malformed_feed_is_permanent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/query"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<feed><entry></wrong></feed>"))
        .expect(1)
        .mount(&server)
        .await;

    let client = arxiv_client(&server.uri(), Box::new(NoOpCache::new()));
    let outcome = client.search_outcome("broken", 10).await;
    assert!(matches!(outcome, SearchOutcome::PermanentFailure(_)));
}
