//! Per-session access log. Entries append in real operation order within
//! a session; the session mutex provides the ordering.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The operations a session exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionOperation {
    Retrieve,
    Peek,
    Write,
    Delegate,
    ToolCall,
    Retry,
    End,
}

/// One logged operation, success or failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessEntry {
    pub operation: SessionOperation,
    pub at: DateTime<Utc>,
    pub duration_ms: u64,
    /// Tokens charged by the operation. Zero for free operations and for
    /// failures.
    pub tokens: usize,
    /// The error message when the operation failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
