//! # strata-core
//!
//! Foundation crate for the Strata memory substrate.
//! Defines all shared types, traits, errors, config, and constants.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::StrataConfig;
pub use errors::{StrataError, StrataResult};
pub use models::budget::{Budget, BudgetCharge, BudgetState, ResourceKind};
pub use models::reference::{LinkType, Reference, ReferenceLink, SpanPointer};
pub use models::section::{ContextSection, SectionType};
pub use models::session::{SessionOutcome, SessionStatus};
pub use models::span::{SourceType, Span, SpanMetadata};
pub use models::summary::{PlanSummary, ThreadSummary};
pub use traits::scorer::{RelevanceScorer, TokenOverlapScorer};
