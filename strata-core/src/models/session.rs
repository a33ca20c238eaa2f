use serde::{Deserialize, Serialize};

/// Lifecycle state of a session. Once it leaves `Active` it is terminal;
/// no operation may resume it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Completed,
    Failed,
    Timeout,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Active)
    }
}

/// How an episode halted, reported by the caller to `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionOutcome {
    Success,
    Failure,
    Timeout,
    BudgetExhausted,
}

impl SessionOutcome {
    /// The terminal status this outcome maps a session to.
    pub fn terminal_status(&self) -> SessionStatus {
        match self {
            Self::Success => SessionStatus::Completed,
            Self::Failure | Self::BudgetExhausted => SessionStatus::Failed,
            Self::Timeout => SessionStatus::Timeout,
        }
    }
}
