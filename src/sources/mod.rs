//! Resilient clients for external paper-search providers.
//!
//! Every provider client follows the same shell: a cache check, a
//! rate-limited HTTP request, bounded retry with backoff, and
//! normalization into the common [`Paper`] shape. Internally each search
//! resolves to a [`SearchOutcome`] so every failure path stays
//! independently testable; the public [`SourceClient::search`] boundary
//! collapses all of them to an empty list and callers never see an error.

pub mod arxiv;
pub mod cache;
pub mod limiter;
pub mod openalex;
pub mod retry;
pub mod toolkit;

use crate::types::{Paper, SourceId};
use async_trait::async_trait;

/// Internal result of one provider search.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// The provider answered with at least one paper.
    Success(Vec<Paper>),
    /// The provider answered but had nothing for this query.
    Empty,
    /// Retries were exhausted on timeouts, 5xx or rate-limit signals.
    TransientFailure(String),
    /// Bad request or malformed payload; retrying cannot help.
    PermanentFailure(String),
}

impl SearchOutcome {
    /// Collapse to the public representation: papers or nothing.
    pub fn into_papers(self) -> Vec<Paper> {
        match self {
            SearchOutcome::Success(papers) => papers,
            _ => Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SearchOutcome::Success(_))
    }
}

/// A client for one external paper-search provider.
#[async_trait]
pub trait SourceClient: Send + Sync {
    /// Which provider this client talks to.
    fn source(&self) -> SourceId;

    /// Run a search and report the classified outcome.
    async fn search_outcome(&self, query: &str, limit: usize) -> SearchOutcome;

    /// Run a search, degrading every failure to an empty list.
    async fn search(&self, query: &str, limit: usize) -> Vec<Paper> {
        self.search_outcome(query, limit).await.into_papers()
    }
}
