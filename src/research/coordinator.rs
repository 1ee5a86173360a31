//! Adaptive research coordination.
//!
//! The coordinator drives one task through a fixed pipeline:
//! allocation → (voting) → primary search → fallback chain → synthesis
//! → reward → agent updates. Nothing in the pipeline can fail outward;
//! every retrieval failure is converted into data (an empty paper list,
//! a penalty reward, a `fallback_used` flag) so the learning loop always
//! receives a well-formed outcome.

use std::collections::HashMap;

use serde::Serialize;

use crate::agents::{SourceAgent, StrategyAgent};
use crate::research::ResearchEnv;
use crate::synthesis::Synthesizer;
use crate::types::{Allocation, Difficulty, Paper, SourceId, Strategy, Task};

/// Tuning knobs for coordinator decision-making.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// While the strategy agent's episode count is below this, every
    /// task goes to both agents regardless of difficulty.
    pub warmup_episodes: u64,

    /// Multiplier applied to synthesis quality in the total reward.
    pub synthesis_bonus_weight: f64,

    /// Total reward when retrieval comes up completely empty.
    pub failure_penalty: f64,

    /// Cost reported when the whole fallback chain is exhausted.
    pub exhausted_cost: f64,

    /// Ordered fallback chain per primary source. Each entry is tried
    /// once, in order, after the primary search fails or returns
    /// nothing.
    pub fallback_chains: HashMap<SourceId, Vec<SourceId>>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        let mut fallback_chains = HashMap::new();
        fallback_chains.insert(SourceId::OpenAlex, vec![SourceId::Arxiv]);
        fallback_chains.insert(SourceId::Arxiv, vec![SourceId::OpenAlex]);

        Self {
            warmup_episodes: 50,
            synthesis_bonus_weight: 2.0,
            failure_penalty: -10.0,
            exhausted_cost: 5.0,
            fallback_chains,
        }
    }
}

impl CoordinatorConfig {
    pub fn with_warmup_episodes(mut self, episodes: u64) -> Self {
        self.warmup_episodes = episodes;
        self
    }

    pub fn with_fallback_chain(mut self, source: SourceId, chain: Vec<SourceId>) -> Self {
        self.fallback_chains.insert(source, chain);
        self
    }
}

/// Per-coordinator allocation counters, bumped once per task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AllocationHistory {
    pub q_agent: u64,
    pub ucb_agent: u64,
    pub both: u64,
}

impl AllocationHistory {
    fn record(&mut self, allocation: Allocation) {
        match allocation {
            Allocation::QAgent => self.q_agent += 1,
            Allocation::UcbAgent => self.ucb_agent += 1,
            Allocation::Both => self.both += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.q_agent + self.ucb_agent + self.both
    }
}

/// Identity of a ballot in the voting protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Voter {
    QAgent,
    UcbAgent,
}

/// Result of one voting round.
#[derive(Debug, Clone, Serialize)]
pub struct VoteOutcome {
    pub winner: SourceId,
    /// Always the strategy agent's proposal, independent of the winner.
    pub strategy: Strategy,
    /// Ballots in the order they were counted.
    pub ballots: Vec<(Voter, SourceId)>,
}

/// Diagnostics for one executed task.
#[derive(Debug, Clone, Serialize)]
pub struct ResearchReport {
    pub strategy: Strategy,
    /// The source that actually produced the returned papers (or the
    /// last one attempted when nothing did).
    pub source: SourceId,
    pub cost: f64,
    pub relevance: f64,
    pub papers_count: usize,
    pub synthesis: String,
    pub synthesis_quality: f64,
    pub new_terms: Vec<String>,
    pub allocation: Allocation,
    pub sources_tried: Vec<SourceId>,
    pub fallback_used: bool,
}

/// Everything `execute` hands back for one task.
#[derive(Debug)]
pub struct ResearchOutcome {
    pub papers: Vec<Paper>,
    pub total_reward: f64,
    pub report: ResearchReport,
}

/// Coordinator allocating tasks across two learning agents, resolving
/// disagreement by voting and recovering from source failures via a
/// configured fallback chain.
pub struct ResearchCoordinator {
    strategy_agent: Box<dyn StrategyAgent>,
    source_agent: Box<dyn SourceAgent>,
    synthesizer: Box<dyn Synthesizer>,
    config: CoordinatorConfig,
    history: AllocationHistory,
}

impl ResearchCoordinator {
    pub fn new(
        strategy_agent: Box<dyn StrategyAgent>,
        source_agent: Box<dyn SourceAgent>,
        synthesizer: Box<dyn Synthesizer>,
    ) -> Self {
        Self::with_config(
            strategy_agent,
            source_agent,
            synthesizer,
            CoordinatorConfig::default(),
        )
    }

    pub fn with_config(
        strategy_agent: Box<dyn StrategyAgent>,
        source_agent: Box<dyn SourceAgent>,
        synthesizer: Box<dyn Synthesizer>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            strategy_agent,
            source_agent,
            synthesizer,
            config,
            history: AllocationHistory::default(),
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn allocation_history(&self) -> AllocationHistory {
        self.history
    }

    /// Decide which agent(s) handle this task.
    ///
    /// Early episodes keep both agents learning on every task; once the
    /// strategy agent is past warm-up, allocation specializes by
    /// difficulty.
    pub fn allocate(&mut self, task: &Task) -> Allocation {
        let allocation = if self.strategy_agent.episode_count() < self.config.warmup_episodes {
            Allocation::Both
        } else {
            match task.difficulty {
                Difficulty::Easy => Allocation::UcbAgent,
                Difficulty::Hard => Allocation::QAgent,
                Difficulty::Medium => Allocation::Both,
            }
        };

        self.history.record(allocation);
        tracing::debug!(?allocation, topic = %task.topic, "task allocated");
        allocation
    }

    /// Let both agents vote on the source for this decision.
    ///
    /// Each agent is queried exactly once. Ballots are counted in
    /// insertion order and ties resolve to the first counted ballot, so
    /// on a 1–1 split the strategy agent's choice prevails.
    pub fn vote(&mut self, state: &str, topic: &str) -> VoteOutcome {
        let (strategy, q_source) = self.strategy_agent.choose_action(state);
        let ucb_source = self.source_agent.choose_source(topic);

        let ballots = vec![(Voter::QAgent, q_source), (Voter::UcbAgent, ucb_source)];
        let winner = tally(&ballots).unwrap_or(q_source);
        tracing::info!(%winner, %strategy, ?ballots, "vote resolved");

        VoteOutcome {
            winner,
            strategy,
            ballots,
        }
    }

    /// Run the full research pipeline for one task. Never fails; all
    /// retrieval failure is folded into the outcome.
    pub async fn execute(&mut self, env: &mut dyn ResearchEnv, task: &Task) -> ResearchOutcome {
        let state = self.strategy_agent.state_for(task);
        let allocation = self.allocate(task);

        let (strategy, chosen) = match allocation {
            Allocation::UcbAgent => (
                Strategy::Specific,
                self.source_agent.choose_source(&task.topic),
            ),
            Allocation::QAgent => self.strategy_agent.choose_action(&state),
            Allocation::Both => {
                let outcome = self.vote(&state, &task.topic);
                (outcome.strategy, outcome.winner)
            }
        };

        let mut source = chosen;
        let mut sources_tried = vec![chosen];
        let mut papers = Vec::new();
        let mut cost = self.config.exhausted_cost;
        let mut retrieved = false;

        match env.execute_search(strategy, chosen).await {
            Ok((found, search_cost)) if !found.is_empty() => {
                papers = found;
                cost = search_cost;
                retrieved = true;
            }
            Ok(_) => tracing::warn!(source = %chosen, "primary search returned no papers"),
            Err(e) => tracing::warn!(source = %chosen, error = %e, "primary search failed"),
        }

        if !retrieved {
            let chain = self
                .config
                .fallback_chains
                .get(&chosen)
                .cloned()
                .unwrap_or_default();

            for backup in chain {
                sources_tried.push(backup);
                match env.execute_search(strategy, backup).await {
                    Ok((found, search_cost)) if !found.is_empty() => {
                        papers = found;
                        cost = search_cost;
                        source = backup;
                        retrieved = true;
                        break;
                    }
                    Ok(_) => tracing::warn!(%backup, "fallback search returned no papers"),
                    Err(e) => tracing::warn!(%backup, error = %e, "fallback search failed"),
                }
            }
        }

        if !retrieved {
            tracing::warn!(topic = %task.topic, ?sources_tried, "all sources exhausted");
        }

        let synthesis = self.synthesizer.synthesize(&papers, &task.query_terms);

        let total_reward = if papers.is_empty() {
            self.config.failure_penalty
        } else {
            env.get_reward(&papers, cost)
                + self.config.synthesis_bonus_weight * synthesis.quality
        };

        // Single-step bandit update: the next state is the pre-decision
        // state, not a lookahead.
        if matches!(allocation, Allocation::QAgent | Allocation::Both) {
            self.strategy_agent
                .update(&state, (strategy, source), total_reward, &state);
        }
        if matches!(allocation, Allocation::UcbAgent | Allocation::Both) {
            self.source_agent.update(&task.topic, source, total_reward);
        }

        let relevance = if papers.is_empty() {
            0.0
        } else {
            task.evaluate_results(&papers)
        };

        let report = ResearchReport {
            strategy,
            source,
            cost,
            relevance,
            papers_count: papers.len(),
            synthesis: synthesis.synthesis,
            synthesis_quality: synthesis.quality,
            new_terms: synthesis.new_terms_discovered,
            allocation,
            fallback_used: sources_tried.len() > 1,
            sources_tried,
        };

        ResearchOutcome {
            papers,
            total_reward,
            report,
        }
    }
}

/// Count ballots in insertion order; the first ballot value to reach the
/// maximum count wins (strictly-greater replacement keeps the earliest
/// ballot on top of a tie).
fn tally(ballots: &[(Voter, SourceId)]) -> Option<SourceId> {
    let mut counts: Vec<(SourceId, usize)> = Vec::new();
    for (_, source) in ballots {
        match counts.iter_mut().find(|(counted, _)| counted == source) {
            Some(entry) => entry.1 += 1,
            None => counts.push((*source, 1)),
        }
    }

    let mut best: Option<(SourceId, usize)> = None;
    for (source, count) in counts {
        match best {
            Some((_, top)) if count > top => best = Some((source, count)),
            None => best = Some((source, count)),
            _ => {}
        }
    }
    best.map(|(source, _)| source)
}
