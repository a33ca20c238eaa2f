//! # strata-session
//!
//! The session/budget engine. An [`Environment`] holds the shared stores
//! and an arena of sessions, each a budget-bounded unit of interaction.
//! Every budget-consuming operation is an atomic check-then-consume under
//! the session's own lock; delegation carves a child ceiling out of the
//! parent's remaining budget.

mod access_log;
mod budget;
mod env;
mod session;

pub use access_log::{AccessEntry, SessionOperation};
pub use budget::{check_and_consume, delegate_ceiling, validate_fraction};
pub use env::{
    EndReport, Environment, PeekResult, RetrieveFilters, RetrieveResult, RetrievedSpan,
    SessionInfo, SessionParams,
};
pub use session::Session;
