//! Learning-agent seams consumed by the coordinator.
//!
//! The decision layer treats both agents as black boxes: a strategy agent
//! that picks a (strategy, source) action from a task state, and a
//! source-only agent that picks a provider for a topic. Their internal
//! state representation and update rules live outside this crate; the
//! traits below are the full contract the coordinator relies on.

use crate::types::{SourceId, Strategy, Task};

/// Strategy/source chooser keyed on task state (the "q_agent").
///
/// Implementations are expected to be in-memory and cheap to call; the
/// coordinator invokes `choose_action` at most once per task.
#[cfg_attr(test, mockall::automock)]
pub trait StrategyAgent: Send {
    /// Derive the opaque state key the agent wants to be updated under.
    fn state_for(&self, task: &Task) -> String;

    /// Pick a (strategy, source) action for the given state.
    fn choose_action(&mut self, state: &str) -> (Strategy, SourceId);

    /// Feed back the observed reward for an action taken in `state`.
    fn update(
        &mut self,
        state: &str,
        action: (Strategy, SourceId),
        reward: f64,
        next_state: &str,
    );

    /// How many episodes this agent has been trained on so far.
    ///
    /// The coordinator keeps every task on both agents while this is
    /// below its warm-up threshold.
    fn episode_count(&self) -> u64;
}

/// Source-only chooser keyed on topic (the "ucb_agent").
#[cfg_attr(test, mockall::automock)]
pub trait SourceAgent: Send {
    /// Pick a provider for the given topic.
    fn choose_source(&mut self, topic: &str) -> SourceId;

    /// Feed back the observed reward for a source chosen for `topic`.
    fn update(&mut self, topic: &str, source: SourceId, reward: f64);
}
