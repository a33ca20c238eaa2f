//! Search types: options, results, hop expansion records.

use serde::{Deserialize, Serialize};

use strata_core::models::span::SourceType;

/// How search results are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    Relevance,
    Importance,
    /// `0.7 × relevance + 0.3 × importance`.
    #[default]
    Combined,
}

/// Where a search result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultOrigin {
    ThreadSummary,
    PlanSummary,
    Reference,
}

/// Query options for `search`.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub query: String,
    /// Restrict candidates to these source types; `None` searches all.
    pub source_types: Option<Vec<SourceType>>,
    /// Hard cap on result count.
    pub max_results: usize,
    /// Optional token budget; results accumulate greedily until it is hit.
    pub max_tokens: Option<usize>,
    /// Results scoring below this relevance are dropped.
    pub min_relevance: Option<f64>,
    pub sort_by: SortBy,
}

impl SearchOptions {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            source_types: None,
            max_results: 10,
            max_tokens: None,
            min_relevance: None,
            sort_by: SortBy::default(),
        }
    }
}

/// One scored search result.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub id: String,
    pub origin: ResultOrigin,
    pub source_type: SourceType,
    pub label: String,
    /// The text the score was computed against.
    pub text: String,
    pub relevance: f64,
    /// Importance weight in [0, 1]; 0.5 where the item declares none.
    pub importance: f64,
    /// `0.7 × relevance + 0.3 × importance`.
    pub combined_score: f64,
    pub token_count: usize,
}

impl SearchResult {
    pub(crate) fn sort_key(&self, sort_by: SortBy) -> f64 {
        match sort_by {
            SortBy::Relevance => self.relevance,
            SortBy::Importance => self.importance,
            SortBy::Combined => self.combined_score,
        }
    }
}

/// A search result annotated with its hop distance from the initial
/// result set, and the id path that reached it.
#[derive(Debug, Clone)]
pub struct HopResult {
    pub result: SearchResult,
    /// 0 for the initial search, 1.. for link expansions.
    pub hop: usize,
    /// Ids walked to reach this result, starting at an initial result.
    pub path: Vec<String>,
}
