//! Unified interface over the registered providers.
//!
//! Routes a (query, source) request to the matching client and keeps
//! per-source usage counters. Counters live on the toolkit instance;
//! two toolkits never share state.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::RwLock;
use serde::Serialize;

use crate::sources::arxiv::{ArxivClient, ArxivConfig};
use crate::sources::cache::FileResultCache;
use crate::sources::openalex::{OpenAlexClient, OpenAlexConfig};
use crate::sources::retry::RetryPolicy;
use crate::sources::SourceClient;
use crate::types::{Paper, Result, SourceId};
use crate::utils::config::Config;

#[derive(Default)]
struct SourceCounters {
    calls: AtomicU64,
    failures: AtomicU64,
}

/// Aggregate usage statistics across all sources, recomputed on demand.
#[derive(Debug, Clone, Serialize)]
pub struct UsageStats {
    pub total_calls: u64,
    pub by_source: HashMap<String, u64>,
    pub failures: HashMap<String, u64>,
    /// `1 − failures/calls` per source, with calls floored at 1.
    pub success_rate: HashMap<String, f64>,
}

/// Routing layer over the registered source clients.
pub struct SearchToolkit {
    clients: HashMap<SourceId, Box<dyn SourceClient>>,
    counters: RwLock<HashMap<SourceId, SourceCounters>>,
}

impl SearchToolkit {
    pub fn new() -> Self {
        Self {
            clients: HashMap::new(),
            counters: RwLock::new(HashMap::new()),
        }
    }

    /// Build a toolkit with both bundled providers wired from `config`.
    ///
    /// Each provider gets its own cache namespace under the configured
    /// cache root.
    pub fn from_config(config: &Config) -> Result<Self> {
        let timeout = Duration::from_secs(config.search.request_timeout_secs);

        let openalex_cache =
            FileResultCache::new(config.cache.dir.join(SourceId::OpenAlex.as_str()))?;
        let openalex = OpenAlexClient::new(
            OpenAlexConfig {
                base_url: config.openalex.base_url.clone(),
                mailto: config.openalex.mailto.clone(),
                requests_per_minute: config.openalex.requests_per_minute,
                request_timeout: timeout,
                retry: RetryPolicy::default(),
            },
            Box::new(openalex_cache),
        )?;

        let arxiv_cache = FileResultCache::new(config.cache.dir.join(SourceId::Arxiv.as_str()))?;
        let arxiv = ArxivClient::new(
            ArxivConfig {
                base_url: config.arxiv.base_url.clone(),
                requests_per_minute: config.arxiv.requests_per_minute,
                request_timeout: timeout,
                retry: RetryPolicy::default(),
            },
            Box::new(arxiv_cache),
        )?;

        let mut toolkit = Self::new();
        toolkit.register(Box::new(openalex));
        toolkit.register(Box::new(arxiv));
        Ok(toolkit)
    }

    /// Register a client under the source id it reports.
    pub fn register(&mut self, client: Box<dyn SourceClient>) {
        self.clients.insert(client.source(), client);
    }

    /// Source ids with a registered client.
    pub fn sources(&self) -> Vec<SourceId> {
        self.clients.keys().copied().collect()
    }

    /// Search `source` for `query`.
    ///
    /// The call is always counted; the failure counter moves iff the
    /// returned list is empty. A source without a registered client
    /// degrades to an empty list like any other permanent failure.
    pub async fn search(&self, query: &str, source: SourceId, limit: usize) -> Vec<Paper> {
        self.bump(source, |c| &c.calls);

        let papers = match self.clients.get(&source) {
            Some(client) => client.search(query, limit).await,
            None => {
                tracing::warn!(%source, "no client registered for source");
                Vec::new()
            }
        };

        if papers.is_empty() {
            self.bump(source, |c| &c.failures);
        }
        tracing::info!(%source, query, count = papers.len(), "search completed");

        papers
    }

    /// Current usage statistics.
    pub fn stats(&self) -> UsageStats {
        let counters = self.counters.read();
        let mut by_source = HashMap::new();
        let mut failures = HashMap::new();
        let mut success_rate = HashMap::new();
        let mut total_calls = 0;

        for (source, counter) in counters.iter() {
            let calls = counter.calls.load(Ordering::Relaxed);
            let failed = counter.failures.load(Ordering::Relaxed);
            total_calls += calls;
            by_source.insert(source.to_string(), calls);
            failures.insert(source.to_string(), failed);
            success_rate.insert(
                source.to_string(),
                1.0 - failed as f64 / calls.max(1) as f64,
            );
        }

        UsageStats {
            total_calls,
            by_source,
            failures,
            success_rate,
        }
    }

    fn bump(&self, source: SourceId, pick: impl Fn(&SourceCounters) -> &AtomicU64) {
        {
            let counters = self.counters.read();
            if let Some(counter) = counters.get(&source) {
                pick(counter).fetch_add(1, Ordering::Relaxed);
                return;
            }
        }
        let mut counters = self.counters.write();
        pick(counters.entry(source).or_default()).fetch_add(1, Ordering::Relaxed);
    }
}

impl Default for SearchToolkit {
    fn default() -> Self {
        Self::new()
    }
}
