use crate::models::budget::ResourceKind;

/// Budget engine errors. Raised before any work is done; a rejected
/// operation leaves every counter untouched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BudgetError {
    #[error("budget exhausted: {resource} needs {requested}, {remaining} remaining")]
    Exhausted {
        resource: ResourceKind,
        requested: u64,
        remaining: u64,
    },

    #[error("delegation fraction {fraction} outside (0, 1]")]
    InvalidFraction { fraction: f64 },
}
