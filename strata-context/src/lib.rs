//! # strata-context
//!
//! Token-bounded prompt assembly: prioritized sections with all-or-nothing
//! eviction, category budget allocation, and four deterministic truncation
//! strategies.

mod truncate;
mod window;

pub use truncate::{truncate_to_fit, truncate_middle_with_ratio, TruncationStrategy};
pub use window::{
    AddReport, BudgetCategory, ComposeOptions, Composition, ContextWindow, ContextWindowSnapshot,
    SectionTokens,
};
