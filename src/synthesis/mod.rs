//! Synthesizer seam consumed by the coordinator.

use crate::types::Paper;
use serde::{Deserialize, Serialize};

/// Outcome of synthesizing a set of retrieved papers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisResult {
    /// Free-text synthesis of the retrieved papers.
    pub synthesis: String,
    /// Quality of the synthesis in `[0, 1]`.
    pub quality: f64,
    /// Query terms discovered while reading the papers.
    pub new_terms_discovered: Vec<String>,
}

/// Paper synthesis and quality scoring, implemented outside this crate.
///
/// The coordinator calls this exactly once per task, after retrieval,
/// including when retrieval came up empty.
#[cfg_attr(test, mockall::automock)]
pub trait Synthesizer: Send {
    fn synthesize(&self, papers: &[Paper], query_terms: &[String]) -> SynthesisResult;
}
