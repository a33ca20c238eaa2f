//! # strata-registry
//!
//! Directed, optionally-bidirectional link graph over references, with
//! append-only version chains and per-reference access statistics.

mod access;
mod registry;

pub use access::{AccessOperation, AccessRecord, AccessStats};
pub use registry::{
    LinkDirection, LinkOptions, LinkQuery, LinkedReference, ReferenceChanges, ReferenceRegistry,
    RegistrySnapshot,
};
