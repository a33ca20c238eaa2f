//! Access tracking: every dereference is recorded with session id,
//! operation kind, and timestamp. Appends are monotonic per session;
//! there is no cross-session ordering guarantee.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What kind of operation dereferenced a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessOperation {
    Peek,
    Chunk,
    Search,
    Traverse,
    Resolve,
}

/// One recorded dereference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRecord {
    pub session_id: String,
    pub operation: AccessOperation,
    pub at: DateTime<Utc>,
}

/// Aggregate view over a reference's access records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessStats {
    /// Total dereferences.
    pub access_count: u64,
    /// Timestamp of the most recent dereference.
    pub last_accessed: Option<DateTime<Utc>>,
    /// Dereference counts broken down by operation kind.
    pub by_operation: HashMap<AccessOperation, u64>,
}

impl AccessStats {
    pub fn from_records(records: &[AccessRecord]) -> Self {
        let mut by_operation = HashMap::new();
        for record in records {
            *by_operation.entry(record.operation).or_insert(0) += 1;
        }
        Self {
            access_count: records.len() as u64,
            last_accessed: records.last().map(|r| r.at),
            by_operation,
        }
    }
}
