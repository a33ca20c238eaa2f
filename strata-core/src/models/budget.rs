use serde::{Deserialize, Serialize};

/// The resource dimensions a budget governs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Tokens,
    TimeMs,
    Retries,
    Subcalls,
    ToolCalls,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Tokens => "tokens",
            Self::TimeMs => "time_ms",
            Self::Retries => "retries",
            Self::Subcalls => "subcalls",
            Self::ToolCalls => "tool_calls",
        };
        f.write_str(s)
    }
}

/// An immutable resource ceiling, fixed at session creation.
///
/// Sub-session ceilings may additionally cap sub-sessions and tool calls;
/// `None` means unlimited for that dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub max_tokens: usize,
    pub max_time_ms: u64,
    pub max_retries: u32,
    pub max_subcalls: Option<u32>,
    pub max_tool_calls: Option<u32>,
}

impl Budget {
    pub fn new(max_tokens: usize, max_time_ms: u64, max_retries: u32) -> Self {
        Self {
            max_tokens,
            max_time_ms,
            max_retries,
            max_subcalls: None,
            max_tool_calls: None,
        }
    }

    pub fn with_subcalls(mut self, max_subcalls: u32) -> Self {
        self.max_subcalls = Some(max_subcalls);
        self
    }

    pub fn with_tool_calls(mut self, max_tool_calls: u32) -> Self {
        self.max_tool_calls = Some(max_tool_calls);
        self
    }
}

/// Mutable consumption counters. Every field is monotonically
/// non-decreasing; only the owning session's operations mutate them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetState {
    pub tokens_used: usize,
    pub time_elapsed_ms: u64,
    pub retries_used: u32,
    pub subcalls_used: u32,
    pub tool_calls_used: u32,
}

impl BudgetState {
    /// Remaining tokens under `budget`, saturating at zero.
    pub fn tokens_remaining(&self, budget: &Budget) -> usize {
        budget.max_tokens.saturating_sub(self.tokens_used)
    }

    /// Remaining wall-clock milliseconds under `budget`, saturating at zero.
    pub fn time_remaining_ms(&self, budget: &Budget) -> u64 {
        budget.max_time_ms.saturating_sub(self.time_elapsed_ms)
    }

    /// Remaining retries under `budget`, saturating at zero.
    pub fn retries_remaining(&self, budget: &Budget) -> u32 {
        budget.max_retries.saturating_sub(self.retries_used)
    }

    /// Remaining sub-sessions, `None` when the dimension is uncapped.
    pub fn subcalls_remaining(&self, budget: &Budget) -> Option<u32> {
        budget.max_subcalls.map(|m| m.saturating_sub(self.subcalls_used))
    }

    /// Remaining tool calls, `None` when the dimension is uncapped.
    pub fn tool_calls_remaining(&self, budget: &Budget) -> Option<u32> {
        budget
            .max_tool_calls
            .map(|m| m.saturating_sub(self.tool_calls_used))
    }
}

/// The amounts a single operation wants to consume. Checked atomically
/// against every ceiling before any counter mutates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BudgetCharge {
    pub tokens: usize,
    pub retries: u32,
    pub subcalls: u32,
    pub tool_calls: u32,
}

impl BudgetCharge {
    pub fn tokens(n: usize) -> Self {
        Self {
            tokens: n,
            ..Default::default()
        }
    }

    pub fn subcall() -> Self {
        Self {
            subcalls: 1,
            ..Default::default()
        }
    }

    pub fn tool_call() -> Self {
        Self {
            tool_calls: 1,
            ..Default::default()
        }
    }

    pub fn retry() -> Self {
        Self {
            retries: 1,
            ..Default::default()
        }
    }
}
