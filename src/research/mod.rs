//! Multi-agent research coordination.
//!
//! The [`coordinator`] module owns the decision pipeline; this module
//! defines the environment seam the pipeline searches through, plus a
//! toolkit-backed implementation of it.

pub mod coordinator;

pub use coordinator::{
    AllocationHistory, CoordinatorConfig, ResearchCoordinator, ResearchOutcome, ResearchReport,
    VoteOutcome, Voter,
};

use async_trait::async_trait;

use crate::sources::toolkit::SearchToolkit;
use crate::types::{Paper, Result, SourceId, Strategy, Task};

/// Default number of papers requested per search.
pub const DEFAULT_RESULT_LIMIT: usize = 10;

/// Search environment consumed by the coordinator.
///
/// `execute_search` may fail with a generic error; the coordinator
/// treats a failure exactly like an empty result and moves to the
/// fallback chain.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResearchEnv: Send {
    /// Run one search framed by `strategy` against `source`, returning
    /// the papers and the cost incurred.
    async fn execute_search(
        &mut self,
        strategy: Strategy,
        source: SourceId,
    ) -> Result<(Vec<Paper>, f64)>;

    /// Base reward for a retrieval, before the synthesis bonus.
    fn get_reward(&self, papers: &[Paper], cost: f64) -> f64;
}

/// Toolkit-backed environment scoped to one task.
///
/// Frames the query from the task up front: a broad search uses the
/// topic, a specific search uses the joined query terms (falling back to
/// the topic when the task has none). Every executed search charges a
/// fixed cost.
pub struct ToolkitEnv<'a> {
    toolkit: &'a SearchToolkit,
    broad_query: String,
    specific_query: String,
    limit: usize,
    cost_per_call: f64,
}

impl<'a> ToolkitEnv<'a> {
    pub fn for_task(toolkit: &'a SearchToolkit, task: &Task) -> Self {
        let specific_query = if task.query_terms.is_empty() {
            task.topic.clone()
        } else {
            task.query_terms.join(" ")
        };

        Self {
            toolkit,
            broad_query: task.topic.clone(),
            specific_query,
            limit: DEFAULT_RESULT_LIMIT,
            cost_per_call: 1.0,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub fn with_cost_per_call(mut self, cost: f64) -> Self {
        self.cost_per_call = cost;
        self
    }

    /// The query string a given strategy will send.
    pub fn query_for(&self, strategy: Strategy) -> &str {
        match strategy {
            Strategy::Broad => &self.broad_query,
            Strategy::Specific => &self.specific_query,
        }
    }
}

#[async_trait]
impl ResearchEnv for ToolkitEnv<'_> {
    async fn execute_search(
        &mut self,
        strategy: Strategy,
        source: SourceId,
    ) -> Result<(Vec<Paper>, f64)> {
        let query = self.query_for(strategy).to_string();
        tracing::debug!(%strategy, %source, %query, "executing search");
        let papers = self.toolkit.search(&query, source, self.limit).await;
        Ok((papers, self.cost_per_call))
    }

    fn get_reward(&self, papers: &[Paper], cost: f64) -> f64 {
        let volume = papers.len().min(self.limit) as f64 / self.limit as f64;
        5.0 * volume - 0.1 * cost
    }
}
