//! Error taxonomy for every subsystem, aggregated into [`StrataError`].
//!
//! All failures are typed and returned to the caller; nothing is swallowed
//! internally, and no operation retries itself.

mod budget_error;
mod context_error;
mod memory_error;
mod session_error;
mod span_error;

pub use budget_error::BudgetError;
pub use context_error::ContextError;
pub use memory_error::MemoryError;
pub use session_error::SessionError;
pub use span_error::SpanError;

/// Workspace-wide error type.
#[derive(Debug, thiserror::Error)]
pub enum StrataError {
    #[error(transparent)]
    Budget(#[from] BudgetError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Memory(#[from] MemoryError),

    #[error(transparent)]
    Span(#[from] SpanError),

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),
}

/// Workspace-wide result alias.
pub type StrataResult<T> = Result<T, StrataError>;
