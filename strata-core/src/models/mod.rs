//! Data model: spans, budgets, sessions, context sections, references,
//! and summary projections.

pub mod budget;
pub mod reference;
pub mod section;
pub mod session;
pub mod span;
pub mod summary;
