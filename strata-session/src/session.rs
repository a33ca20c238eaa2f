//! One session: identity, budget, counters, status, access log.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use strata_core::errors::SessionError;
use strata_core::models::budget::{Budget, BudgetState};
use strata_core::models::session::SessionStatus;

use crate::access_log::AccessEntry;

/// A budget-bounded unit of interaction between an agent and the memory
/// environment, scoped to one episode or delegated sub-unit.
///
/// Sessions live in the environment's arena behind a per-session mutex;
/// `parent_session_id` is a lookup key, never an ownership edge.
#[derive(Debug)]
pub struct Session {
    pub id: String,
    pub client_id: String,
    pub agent_type: String,
    pub episode_id: String,
    pub parent_session_id: Option<String>,
    pub status: SessionStatus,
    pub budget: Budget,
    pub state: BudgetState,
    pub started_at: DateTime<Utc>,
    pub access_log: Vec<AccessEntry>,
}

impl Session {
    pub fn new(
        client_id: impl Into<String>,
        agent_type: impl Into<String>,
        episode_id: impl Into<String>,
        budget: Budget,
        parent_session_id: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            client_id: client_id.into(),
            agent_type: agent_type.into(),
            episode_id: episode_id.into(),
            parent_session_id,
            status: SessionStatus::Active,
            budget,
            state: BudgetState::default(),
            started_at: Utc::now(),
            access_log: Vec::new(),
        }
    }

    /// Gate every operation: terminal sessions reject outright, and lazy
    /// timeout is discovered here. Crossing `max_time_ms` flips the
    /// status to `Timeout` on this access, not via a background timer.
    pub fn ensure_active(&mut self) -> Result<(), SessionError> {
        if self.status.is_terminal() {
            return Err(SessionError::Terminated {
                session_id: self.id.clone(),
                status: self.status,
            });
        }

        let elapsed = self.elapsed_ms();
        // Monotonic: the counter only moves forward.
        self.state.time_elapsed_ms = self.state.time_elapsed_ms.max(elapsed);
        if elapsed >= self.budget.max_time_ms {
            self.status = SessionStatus::Timeout;
            return Err(SessionError::Timeout {
                session_id: self.id.clone(),
                elapsed_ms: elapsed,
                max_time_ms: self.budget.max_time_ms,
            });
        }
        Ok(())
    }

    /// Wall-clock time since the session started, in milliseconds.
    pub fn elapsed_ms(&self) -> u64 {
        (Utc::now() - self.started_at).num_milliseconds().max(0) as u64
    }
}
