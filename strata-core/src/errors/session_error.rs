use crate::models::session::SessionStatus;

/// Session lifecycle errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("session {session_id} timed out: {elapsed_ms}ms elapsed, ceiling {max_time_ms}ms")]
    Timeout {
        session_id: String,
        elapsed_ms: u64,
        max_time_ms: u64,
    },

    #[error("session {session_id} is terminal ({status:?}); no further operations allowed")]
    Terminated {
        session_id: String,
        status: SessionStatus,
    },

    #[error("session not found: {session_id}")]
    NotFound { session_id: String },
}
