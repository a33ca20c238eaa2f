//! Trait seams between subsystems.

pub mod scorer;

pub use scorer::{RelevanceScorer, TokenOverlapScorer};
