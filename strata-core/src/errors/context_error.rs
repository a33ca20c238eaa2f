/// Context window composer errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ContextError {
    #[error("section {section_id} needs {needed} tokens but only {available} are available")]
    SectionTooLarge {
        section_id: String,
        needed: usize,
        available: usize,
    },

    #[error("budget ratios sum to {total:.3}; must not exceed 1.01")]
    InvalidRatios { total: f64 },

    #[error("reserved_for_response {reserved} exceeds window max_tokens {max_tokens}")]
    ReservationTooLarge { reserved: usize, max_tokens: usize },
}
