/// Retrieval-facade errors for id resolution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MemoryError {
    #[error("no summary or reference found for id: {id}")]
    NotFound { id: String },

    #[error("reference {id} has no resolvable content")]
    NoContent { id: String },
}
