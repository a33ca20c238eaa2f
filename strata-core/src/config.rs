//! Workspace configuration, loadable from TOML. Every field has a default
//! so a missing file or partial file is always usable.

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::errors::{StrataError, StrataResult};

/// Span chunking policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Bytes per chunk window.
    pub chunk_size: usize,
    /// Overlap between adjacent windows, in bytes. Must be smaller than
    /// `chunk_size`.
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: constants::DEFAULT_CHUNK_SIZE,
            chunk_overlap: constants::DEFAULT_CHUNK_OVERLAP,
        }
    }
}

/// Default ceilings for sessions started without an explicit budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionBudgetConfig {
    pub max_tokens: usize,
    pub max_time_ms: u64,
    pub max_retries: u32,
    pub max_subcalls: u32,
    pub max_tool_calls: u32,
}

impl Default for SessionBudgetConfig {
    fn default() -> Self {
        Self {
            max_tokens: constants::DEFAULT_MAX_TOKENS,
            max_time_ms: constants::DEFAULT_MAX_TIME_MS,
            max_retries: constants::DEFAULT_MAX_RETRIES,
            max_subcalls: constants::DEFAULT_MAX_SUBCALLS,
            max_tool_calls: constants::DEFAULT_MAX_TOOL_CALLS,
        }
    }
}

/// Floors applied when delegating a fraction of a parent's remaining
/// budget, so children are never starved.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DelegationConfig {
    pub min_tokens: usize,
    pub min_time_ms: u64,
}

impl Default for DelegationConfig {
    fn default() -> Self {
        Self {
            min_tokens: constants::DEFAULT_MIN_DELEGATED_TOKENS,
            min_time_ms: constants::DEFAULT_MIN_DELEGATED_TIME_MS,
        }
    }
}

/// Context window defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Tokens held back for the model response.
    pub reserved_for_response: usize,
    /// Head share for middle truncation.
    pub middle_head_ratio: f64,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            reserved_for_response: constants::DEFAULT_RESERVED_FOR_RESPONSE,
            middle_head_ratio: constants::DEFAULT_MIDDLE_HEAD_RATIO,
        }
    }
}

/// Retrieval facade defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Weight of relevance in the combined sort.
    pub relevance_weight: f64,
    /// Weight of importance in the combined sort.
    pub importance_weight: f64,
    /// Hop ceiling for multi-hop search.
    pub max_hops: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            relevance_weight: constants::COMBINED_RELEVANCE_WEIGHT,
            importance_weight: constants::COMBINED_IMPORTANCE_WEIGHT,
            max_hops: constants::DEFAULT_MAX_HOPS,
        }
    }
}

/// Top-level configuration for one Strata environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StrataConfig {
    pub chunking: ChunkingConfig,
    pub session_budget: SessionBudgetConfig,
    pub delegation: DelegationConfig,
    pub context: ContextConfig,
    pub retrieval: RetrievalConfig,
}

impl StrataConfig {
    /// Parse a TOML document. Missing sections and fields fall back to
    /// their defaults.
    pub fn from_toml_str(s: &str) -> StrataResult<Self> {
        toml::from_str(s).map_err(|e| StrataError::Config(e.to_string()))
    }
}
