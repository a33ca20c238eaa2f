/// Span store errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpanError {
    #[error("span not found: {span_id}")]
    NotFound { span_id: String },

    #[error("integrity mismatch for span {span_id}: stored {expected}, recomputed {actual}")]
    IntegrityMismatch {
        span_id: String,
        expected: String,
        actual: String,
    },

    #[error("empty content for source {source_id}; nothing to chunk")]
    EmptyContent { source_id: String },
}
