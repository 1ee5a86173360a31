//! OpenAlex works client.
//!
//! Talks to the OpenAlex `/works` endpoint. No API key is required;
//! requests join the polite pool by carrying a `mailto:` user agent.
//! Results are sorted by citation count, and abstracts are rebuilt from
//! the inverted index OpenAlex ships instead of plain text.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::sources::cache::ResultCache;
use crate::sources::limiter::RateLimiter;
use crate::sources::retry::{Attempt, RetryOutcome, RetryPolicy};
use crate::sources::{SearchOutcome, SourceClient};
use crate::types::{AppError, Author, Paper, Result, SourceId};

/// OpenAlex caps `per_page` at 200.
const MAX_PER_PAGE: usize = 200;

/// Configuration for the OpenAlex client.
#[derive(Debug, Clone)]
pub struct OpenAlexConfig {
    /// Works endpoint URL.
    pub base_url: String,
    /// Contact address for the polite pool user agent.
    pub mailto: String,
    /// Admission ceiling per minute.
    pub requests_per_minute: u32,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
    /// Retry schedule for transient failures.
    pub retry: RetryPolicy,
}

impl Default for OpenAlexConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openalex.org/works".to_string(),
            mailto: "contact@example.org".to_string(),
            requests_per_minute: 100,
            request_timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        }
    }
}

impl OpenAlexConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_mailto(mut self, mailto: impl Into<String>) -> Self {
        self.mailto = mailto.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Cached, rate-limited OpenAlex client.
pub struct OpenAlexClient {
    http: reqwest::Client,
    config: OpenAlexConfig,
    cache: Box<dyn ResultCache>,
    limiter: RateLimiter,
}

impl OpenAlexClient {
    pub fn new(config: OpenAlexConfig, cache: Box<dyn ResultCache>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(format!("mailto:{}", config.mailto))
            .build()
            .map_err(|e| AppError::Source(format!("Failed to build OpenAlex client: {}", e)))?;

        let limiter = RateLimiter::per_minute(config.requests_per_minute);

        Ok(Self {
            http,
            config,
            cache,
            limiter,
        })
    }

    async fn fetch_works(&self, query: &str, limit: usize) -> Attempt<Vec<Paper>> {
        let per_page = limit.min(MAX_PER_PAGE);
        let params = [
            ("search", query.to_string()),
            ("per_page", per_page.to_string()),
            ("sort", "cited_by_count:desc".to_string()),
        ];

        let response = match self.http.get(&self.config.base_url).query(&params).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return Attempt::Transient(format!("request timed out: {}", e));
            }
            Err(e) => return Attempt::Transient(format!("request failed: {}", e)),
        };

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Attempt::RateLimited;
        }
        if status.is_server_error() {
            return Attempt::Transient(format!("server error: {}", status));
        }
        if !status.is_success() {
            return Attempt::Permanent(format!("unexpected status: {}", status));
        }

        match response.json::<WorksResponse>().await {
            Ok(body) => Attempt::Ok(body.results.into_iter().map(normalize_work).collect()),
            Err(e) => Attempt::Permanent(format!("malformed payload: {}", e)),
        }
    }
}

#[async_trait]
impl SourceClient for OpenAlexClient {
    fn source(&self) -> SourceId {
        SourceId::OpenAlex
    }

    async fn search_outcome(&self, query: &str, limit: usize) -> SearchOutcome {
        let key = self.cache.compute_key(SourceId::OpenAlex, query);
        if let Some(papers) = self.cache.get(&key) {
            if !papers.is_empty() {
                return SearchOutcome::Success(papers);
            }
        }

        let outcome = self
            .config
            .retry
            .run(SourceId::OpenAlex.as_str(), || async move {
                self.limiter.acquire().await;
                self.fetch_works(query, limit).await
            })
            .await;

        match outcome {
            RetryOutcome::Ok(papers) if papers.is_empty() => SearchOutcome::Empty,
            RetryOutcome::Ok(papers) => {
                if let Err(e) = self.cache.put(&key, &papers) {
                    tracing::warn!(error = %e, "failed to persist OpenAlex cache entry");
                }
                SearchOutcome::Success(papers)
            }
            RetryOutcome::Transient(reason) => SearchOutcome::TransientFailure(reason),
            RetryOutcome::Permanent(reason) => SearchOutcome::PermanentFailure(reason),
        }
    }
}

// ============= Payload Normalization =============

#[derive(Debug, Deserialize)]
struct WorksResponse {
    #[serde(default)]
    results: Vec<Work>,
}

#[derive(Debug, Deserialize)]
struct Work {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    publication_year: Option<i32>,
    #[serde(default)]
    cited_by_count: Option<u32>,
    #[serde(default)]
    abstract_inverted_index: Option<HashMap<String, Vec<usize>>>,
    #[serde(default)]
    authorships: Vec<Authorship>,
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Authorship {
    #[serde(default)]
    author: Option<WorkAuthor>,
}

#[derive(Debug, Deserialize)]
struct WorkAuthor {
    #[serde(default)]
    display_name: Option<String>,
}

fn normalize_work(work: Work) -> Paper {
    let abstract_text = work
        .abstract_inverted_index
        .as_ref()
        .and_then(reconstruct_abstract)
        .or(work.display_name)
        .unwrap_or_else(|| "No abstract available".to_string());

    Paper {
        title: work.title.unwrap_or_else(|| "No title".to_string()),
        abstract_text,
        year: work.publication_year.unwrap_or(0),
        citation_count: work.cited_by_count.unwrap_or(0),
        authors: work
            .authorships
            .into_iter()
            .map(|authorship| Author {
                name: authorship
                    .author
                    .and_then(|a| a.display_name)
                    .unwrap_or_else(|| "Unknown".to_string()),
            })
            .collect(),
        url: work.id.unwrap_or_default(),
    }
}

/// Rebuild the free-text abstract from a word → positions inverted index.
///
/// Allocates a slot per position up to the maximum listed position and
/// writes each word at each of its positions, then joins with single
/// spaces. Returns `None` for an empty index.
fn reconstruct_abstract(index: &HashMap<String, Vec<usize>>) -> Option<String> {
    let len = index.values().flat_map(|positions| positions.iter()).copied().max()? + 1;
    let mut words = vec![""; len];
    for (word, positions) in index {
        for &pos in positions {
            words[pos] = word.as_str();
        }
    }
    Some(words.join(" "))
}
