//! # paperscout - Adaptive Literature Search Core
//!
//! The decision-and-resilience layer of an automated literature search
//! system: a coordinator that allocates each research task across two
//! independent learning agents, resolves disagreement by voting, and
//! recovers from provider failures via a fallback chain; plus a
//! resilient client layer over external bibliographic APIs with
//! per-source caching, rate limiting, retry-with-backoff and response
//! normalization.
//!
//! ## Overview
//!
//! The learning agents and the paper synthesizer are collaborators
//! implemented outside this crate; paperscout defines the traits they
//! plug into ([`StrategyAgent`], [`SourceAgent`], [`Synthesizer`]) and
//! guarantees that whatever happens during retrieval, the learning loop
//! always receives a well-formed outcome: failures become empty paper
//! lists and penalty rewards, never errors.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use paperscout::{
//!     Config, Difficulty, ResearchCoordinator, SearchToolkit, Task, ToolkitEnv,
//! };
//!
//! #[tokio::main]
//! async fn main() -> paperscout::Result<()> {
//!     let config = Config::from_env()?;
//!     let toolkit = SearchToolkit::from_config(&config)?;
//!
//!     // Agents and synthesizer come from your learning stack.
//!     let mut coordinator = ResearchCoordinator::new(q_agent, ucb_agent, synthesizer);
//!
//!     let task = Task::new(
//!         "graph neural networks",
//!         vec!["message passing".to_string()],
//!         Difficulty::Medium,
//!     );
//!     let mut env = ToolkitEnv::for_task(&toolkit, &task);
//!
//!     let outcome = coordinator.execute(&mut env, &task).await;
//!     println!(
//!         "{} papers, reward {:.2}, fallback used: {}",
//!         outcome.report.papers_count, outcome.total_reward, outcome.report.fallback_used
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`agents`] - Learning-agent traits consumed by the coordinator
//! - [`research`] - Coordinator: allocation, voting, fallback, reward
//! - [`sources`] - Resilient provider clients, cache, rate limiting
//! - [`synthesis`] - Synthesizer trait and result type
//! - [`types`] - Common types and error handling
//! - [`utils`] - Environment-driven configuration

/// Learning-agent seams consumed by the coordinator.
pub mod agents;
/// Multi-agent research coordination.
pub mod research;
/// Resilient clients for external paper-search providers.
pub mod sources;
/// Paper synthesis seam.
pub mod synthesis;
/// Core types (papers, tasks, decisions, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;

// Re-export commonly used types
pub use agents::{SourceAgent, StrategyAgent};
pub use research::{
    AllocationHistory, CoordinatorConfig, ResearchCoordinator, ResearchEnv, ResearchOutcome,
    ResearchReport, ToolkitEnv, VoteOutcome, Voter, DEFAULT_RESULT_LIMIT,
};
pub use sources::cache::{CacheStats, FileResultCache, NoOpCache, ResultCache};
pub use sources::limiter::RateLimiter;
pub use sources::retry::RetryPolicy;
pub use sources::toolkit::{SearchToolkit, UsageStats};
pub use sources::{SearchOutcome, SourceClient};
pub use synthesis::{SynthesisResult, Synthesizer};
pub use types::{
    Allocation, AppError, Author, Difficulty, Paper, Result, SourceId, Strategy, Task,
};
pub use utils::config::Config;
