use serde::{Deserialize, Serialize};

/// The closed set of content kinds a span can originate from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    KnowledgeBase,
    ThreadSummary,
    PlanSummary,
    EpisodeLog,
    BrandKit,
    Offer,
}

impl SourceType {
    /// Total number of source types.
    pub const COUNT: usize = 6;

    /// All variants for iteration.
    pub const ALL: [SourceType; 6] = [
        Self::KnowledgeBase,
        Self::ThreadSummary,
        Self::PlanSummary,
        Self::EpisodeLog,
        Self::BrandKit,
        Self::Offer,
    ];

    /// Short label used in composed context headers.
    pub fn label(&self) -> &'static str {
        match self {
            Self::KnowledgeBase => "knowledge_base",
            Self::ThreadSummary => "thread_summary",
            Self::PlanSummary => "plan_summary",
            Self::EpisodeLog => "episode_log",
            Self::BrandKit => "brand_kit",
            Self::Offer => "offer",
        }
    }
}

/// Optional retrieval hints attached to a span at write time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpanMetadata {
    /// Importance weight in [0, 1].
    pub importance: Option<f64>,
    /// Recency weight in [0, 1].
    pub recency: Option<f64>,
    /// Free-form tags.
    pub tags: Vec<String>,
}

/// An immutable, hash-verified, byte-addressed chunk of content.
///
/// Spans are created once when content is written and never updated in
/// place; a re-write of the same source supersedes them with new spans.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Span {
    /// UUID v4 identifier.
    pub id: String,
    /// Kind of content this span was cut from.
    pub source_type: SourceType,
    /// Identifier of the originating content item.
    pub source_id: String,
    /// Start of the byte range within the original content (inclusive).
    pub start_byte: usize,
    /// End of the byte range (exclusive). Always greater than `start_byte`.
    pub end_byte: usize,
    /// blake3 hash of the byte range, fixed at write time.
    pub content_hash: String,
    /// Token cost of the range. Always positive.
    pub token_count: usize,
    /// Retrieval hints.
    pub metadata: SpanMetadata,
}

impl Span {
    /// blake3 hex digest of a content slice. The single hashing function
    /// used at write time and by every later integrity check.
    pub fn hash_content(content: &str) -> String {
        blake3::hash(content.as_bytes()).to_hex().to_string()
    }

    /// Length of the byte range.
    pub fn byte_len(&self) -> usize {
        self.end_byte - self.start_byte
    }
}

/// Identity equality: two spans are equal if they have the same ID.
/// For content comparison, compare `content_hash` directly.
impl PartialEq for Span {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Span {}
