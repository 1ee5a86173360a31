//! arXiv query client.
//!
//! The arXiv export API answers with an Atom feed rather than JSON, so
//! this client pulls the body as text and walks the XML events to build
//! normalized records. arXiv does not expose citation counts; they are
//! reported as 0.

use std::time::Duration;

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::sources::cache::ResultCache;
use crate::sources::limiter::RateLimiter;
use crate::sources::retry::{Attempt, RetryOutcome, RetryPolicy};
use crate::sources::{SearchOutcome, SourceClient};
use crate::types::{AppError, Author, Paper, Result, SourceId};

/// Configuration for the arXiv client.
#[derive(Debug, Clone)]
pub struct ArxivConfig {
    /// Query endpoint URL.
    pub base_url: String,
    /// Admission ceiling per minute (arXiv asks for restraint).
    pub requests_per_minute: u32,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
    /// Retry schedule for transient failures.
    pub retry: RetryPolicy,
}

impl Default for ArxivConfig {
    fn default() -> Self {
        Self {
            base_url: "https://export.arxiv.org/api/query".to_string(),
            requests_per_minute: 20,
            request_timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        }
    }
}

impl ArxivConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Cached, rate-limited arXiv client.
pub struct ArxivClient {
    http: reqwest::Client,
    config: ArxivConfig,
    cache: Box<dyn ResultCache>,
    limiter: RateLimiter,
}

impl ArxivClient {
    pub fn new(config: ArxivConfig, cache: Box<dyn ResultCache>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AppError::Source(format!("Failed to build arXiv client: {}", e)))?;

        let limiter = RateLimiter::per_minute(config.requests_per_minute);

        Ok(Self {
            http,
            config,
            cache,
            limiter,
        })
    }

    async fn fetch_feed(&self, query: &str, limit: usize) -> Attempt<Vec<Paper>> {
        let params = [
            ("search_query", format!("all:{}", query)),
            ("start", "0".to_string()),
            ("max_results", limit.to_string()),
            ("sortBy", "relevance".to_string()),
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

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return Attempt::Transient(format!("failed to read body: {}", e)),
        };

        match parse_atom_feed(&body) {
            Ok(papers) => Attempt::Ok(papers),
            Err(reason) => Attempt::Permanent(format!("malformed payload: {}", reason)),
        }
    }
}

#[async_trait]
impl SourceClient for ArxivClient {
    fn source(&self) -> SourceId {
        SourceId::Arxiv
    }

    async fn search_outcome(&self, query: &str, limit: usize) -> SearchOutcome {
        let key = self.cache.compute_key(SourceId::Arxiv, query);
        if let Some(papers) = self.cache.get(&key) {
            if !papers.is_empty() {
                return SearchOutcome::Success(papers);
            }
        }

        let outcome = self
            .config
            .retry
            .run(SourceId::Arxiv.as_str(), || async move {
                self.limiter.acquire().await;
                self.fetch_feed(query, limit).await
            })
            .await;

        match outcome {
            RetryOutcome::Ok(papers) if papers.is_empty() => SearchOutcome::Empty,
            RetryOutcome::Ok(papers) => {
                if let Err(e) = self.cache.put(&key, &papers) {
                    tracing::warn!(error = %e, "failed to persist arXiv cache entry");
                }
                SearchOutcome::Success(papers)
            }
            RetryOutcome::Transient(reason) => SearchOutcome::TransientFailure(reason),
            RetryOutcome::Permanent(reason) => SearchOutcome::PermanentFailure(reason),
        }
    }
}

// ============= Atom Feed Parsing =============

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextField {
    Title,
    Summary,
    Published,
    EntryId,
    AuthorName,
}

#[derive(Debug, Default)]
struct AtomEntry {
    title: String,
    summary: String,
    published: String,
    id: String,
    authors: Vec<String>,
}

impl AtomEntry {
    fn into_paper(self) -> Paper {
        // Atom timestamps look like 2021-06-03T17:59:59Z.
        let year = self
            .published
            .get(0..4)
            .and_then(|y| y.parse::<i32>().ok())
            .unwrap_or(0);

        Paper {
            title: self.title,
            abstract_text: self.summary,
            year,
            citation_count: 0,
            authors: self.authors.into_iter().map(|name| Author { name }).collect(),
            url: self.id,
        }
    }

    fn append(&mut self, field: TextField, text: &str) {
        let target = match field {
            TextField::Title => &mut self.title,
            TextField::Summary => &mut self.summary,
            TextField::Published => &mut self.published,
            TextField::EntryId => &mut self.id,
            TextField::AuthorName => {
                if let Some(last) = self.authors.last_mut() {
                    if !last.is_empty() {
                        last.push(' ');
                    }
                    last.push_str(text);
                }
                return;
            }
        };
        if !target.is_empty() {
            target.push(' ');
        }
        target.push_str(text);
    }
}

fn parse_atom_feed(xml: &str) -> std::result::Result<Vec<Paper>, String> {
    let mut reader = Reader::from_str(xml);
    let mut papers = Vec::new();
    let mut entry: Option<AtomEntry> = None;
    let mut in_author = false;
    let mut field: Option<TextField> = None;

    loop {
        match reader.read_event() {
            Err(e) => return Err(format!("XML error: {}", e)),
            Ok(Event::Eof) => break,
            Ok(Event::Start(start)) => match start.local_name().as_ref() {
                b"entry" => entry = Some(AtomEntry::default()),
                b"author" if entry.is_some() => {
                    in_author = true;
                    if let Some(current) = entry.as_mut() {
                        current.authors.push(String::new());
                    }
                }
                b"name" if in_author => field = Some(TextField::AuthorName),
                b"title" if entry.is_some() => field = Some(TextField::Title),
                b"summary" if entry.is_some() => field = Some(TextField::Summary),
                b"published" if entry.is_some() => field = Some(TextField::Published),
                b"id" if entry.is_some() => field = Some(TextField::EntryId),
                _ => {}
            },
            Ok(Event::End(end)) => match end.local_name().as_ref() {
                b"entry" => {
                    if let Some(done) = entry.take() {
                        papers.push(done.into_paper());
                    }
                }
                b"author" => {
                    in_author = false;
                    field = None;
                }
                _ => field = None,
            },
            Ok(Event::Text(text)) => {
                if let (Some(current), Some(active)) = (entry.as_mut(), field) {
                    let unescaped = text
                        .unescape()
                        .map_err(|e| format!("bad text node: {}", e))?;
                    let trimmed = unescaped.trim();
                    if !trimmed.is_empty() {
                        current.append(active, trimmed);
                    }
                }
            }
            Ok(_) => {}
        }
    }

    Ok(papers)
}
