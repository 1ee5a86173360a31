use serde::{Deserialize, Serialize};

// ============= Paper Records =============

/// A paper author as returned by every provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
}

/// Normalized paper record shared across all providers.
///
/// Source clients translate provider-specific payloads into this shape;
/// once returned the record is never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub year: i32,
    pub citation_count: u32,
    pub authors: Vec<Author>,
    pub url: String,
}

// ============= Task Types =============

/// How hard a research task is expected to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// A single research request handed to the coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub topic: String,
    pub query_terms: Vec<String>,
    pub difficulty: Difficulty,
}

impl Task {
    pub fn new(
        topic: impl Into<String>,
        query_terms: Vec<String>,
        difficulty: Difficulty,
    ) -> Self {
        Self {
            topic: topic.into(),
            query_terms,
            difficulty,
        }
    }

    /// Score how relevant a result set is to this task, in `[0, 1]`.
    ///
    /// Mean over papers of the fraction of query terms that appear
    /// (case-insensitively) in the title or abstract. No papers or no
    /// query terms scores 0.0.
    pub fn evaluate_results(&self, papers: &[Paper]) -> f64 {
        if papers.is_empty() || self.query_terms.is_empty() {
            return 0.0;
        }

        let terms: Vec<String> = self
            .query_terms
            .iter()
            .map(|t| t.to_lowercase())
            .collect();

        let total: f64 = papers
            .iter()
            .map(|paper| {
                let text = format!("{} {}", paper.title, paper.abstract_text).to_lowercase();
                let hits = terms.iter().filter(|t| text.contains(t.as_str())).count();
                hits as f64 / terms.len() as f64
            })
            .sum();

        total / papers.len() as f64
    }
}

// ============= Decision Types =============

/// How a search query is framed against a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Search the task topic alone.
    Broad,
    /// Search the task's precise query terms.
    Specific,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Broad => "broad",
            Strategy::Specific => "specific",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// External paper-search provider identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceId {
    OpenAlex,
    Arxiv,
}

impl SourceId {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::OpenAlex => "openalex",
            SourceId::Arxiv => "arxiv",
        }
    }

    /// All providers this crate knows how to talk to.
    pub fn all() -> [SourceId; 2] {
        [SourceId::OpenAlex, SourceId::Arxiv]
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which learning agent(s) the coordinator assigned to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Allocation {
    QAgent,
    UcbAgent,
    Both,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Source error: {0}")]
    Source(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
