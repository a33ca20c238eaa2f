//! Append-only span registry with a per-source index of current spans.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use strata_core::errors::{SpanError, StrataResult};
use strata_core::models::span::{SourceType, Span, SpanMetadata};
use strata_tokens::TokenCounter;

use crate::chunker::{chunk_windows, ChunkPolicy};

/// A span plus its owned content slice.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredSpan {
    span: Span,
    content: String,
}

/// Serializable image of the store, the persistence extension point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpanStoreSnapshot {
    spans: Vec<StoredSpan>,
    source_index: Vec<(String, Vec<String>)>,
}

/// Content-addressed span store. Spans are immutable once written; a
/// re-write of the same source appends new spans and repoints the source
/// index, leaving old spans resolvable by id but out of retrieval.
pub struct SpanStore {
    policy: ChunkPolicy,
    spans: DashMap<String, StoredSpan>,
    /// source_id → current span ids, in write order.
    source_index: DashMap<String, Vec<String>>,
}

impl SpanStore {
    pub fn new(policy: ChunkPolicy) -> Self {
        Self {
            policy,
            spans: DashMap::new(),
            source_index: DashMap::new(),
        }
    }

    /// Chunk `content` into overlapping windows and register one span per
    /// window. Returns the new spans in byte order.
    pub fn write(
        &self,
        source_type: SourceType,
        source_id: &str,
        content: &str,
        metadata: SpanMetadata,
        counter: &TokenCounter,
    ) -> StrataResult<Vec<Span>> {
        if content.is_empty() {
            return Err(SpanError::EmptyContent {
                source_id: source_id.to_string(),
            }
            .into());
        }

        let windows = chunk_windows(content, self.policy);
        let mut created = Vec::with_capacity(windows.len());
        let mut ids = Vec::with_capacity(windows.len());

        for (start_byte, end_byte) in windows {
            let slice = &content[start_byte..end_byte];
            let span = Span {
                id: Uuid::new_v4().to_string(),
                source_type,
                source_id: source_id.to_string(),
                start_byte,
                end_byte,
                content_hash: Span::hash_content(slice),
                token_count: counter.count_cached(slice),
                metadata: metadata.clone(),
            };
            ids.push(span.id.clone());
            self.spans.insert(
                span.id.clone(),
                StoredSpan {
                    span: span.clone(),
                    content: slice.to_string(),
                },
            );
            created.push(span);
        }

        // Supersede: the index points only at the newest generation.
        self.source_index.insert(source_id.to_string(), ids);
        Ok(created)
    }

    /// Span metadata by id.
    pub fn get(&self, span_id: &str) -> Option<Span> {
        self.spans.get(span_id).map(|s| s.span.clone())
    }

    /// Span content by id, integrity-verified: the stored bytes are
    /// rehashed and must match the hash fixed at write time.
    pub fn get_content(&self, span_id: &str) -> StrataResult<String> {
        let stored = self.spans.get(span_id).ok_or_else(|| SpanError::NotFound {
            span_id: span_id.to_string(),
        })?;
        let actual = Span::hash_content(&stored.content);
        if actual != stored.span.content_hash {
            return Err(SpanError::IntegrityMismatch {
                span_id: span_id.to_string(),
                expected: stored.span.content_hash.clone(),
                actual,
            }
            .into());
        }
        Ok(stored.content.clone())
    }

    /// Re-hash a span's stored content against its recorded hash.
    pub fn verify(&self, span_id: &str) -> StrataResult<()> {
        self.get_content(span_id).map(|_| ())
    }

    /// Current spans for a source, in write order. Empty for unknown
    /// sources or superseded generations.
    pub fn spans_for_source(&self, source_id: &str) -> Vec<Span> {
        self.source_index
            .get(source_id)
            .map(|ids| ids.iter().filter_map(|id| self.get(id)).collect())
            .unwrap_or_default()
    }

    /// All current spans, optionally filtered by source type. These are
    /// the retrieval candidates; superseded spans are excluded.
    pub fn current_spans(&self, source_types: Option<&[SourceType]>) -> Vec<Span> {
        let mut out = Vec::new();
        for entry in self.source_index.iter() {
            for id in entry.value() {
                if let Some(span) = self.get(id) {
                    if source_types.map_or(true, |ts| ts.contains(&span.source_type)) {
                        out.push(span);
                    }
                }
            }
        }
        out
    }

    /// Number of spans ever written (superseded generations included).
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Serializable image for persistence.
    pub fn snapshot(&self) -> SpanStoreSnapshot {
        SpanStoreSnapshot {
            spans: self.spans.iter().map(|e| e.value().clone()).collect(),
            source_index: self
                .source_index
                .iter()
                .map(|e| (e.key().clone(), e.value().clone()))
                .collect(),
        }
    }

    /// Replace store contents from a snapshot.
    pub fn restore(&self, snapshot: SpanStoreSnapshot) {
        self.spans.clear();
        self.source_index.clear();
        for stored in snapshot.spans {
            self.spans.insert(stored.span.id.clone(), stored);
        }
        for (source_id, ids) in snapshot.source_index {
            self.source_index.insert(source_id, ids);
        }
    }
}

impl Default for SpanStore {
    fn default() -> Self {
        Self::new(ChunkPolicy::default())
    }
}
