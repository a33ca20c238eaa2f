/// Strata system version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Bytes per content chunk when writing spans.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Overlap between adjacent chunks, in bytes.
pub const DEFAULT_CHUNK_OVERLAP: usize = 100;

/// Default session token ceiling.
pub const DEFAULT_MAX_TOKENS: usize = 100_000;

/// Default session wall-clock ceiling in milliseconds.
pub const DEFAULT_MAX_TIME_MS: u64 = 300_000;

/// Default retry ceiling per session.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default sub-session ceiling per session.
pub const DEFAULT_MAX_SUBCALLS: u32 = 10;

/// Default tool-call ceiling per session.
pub const DEFAULT_MAX_TOOL_CALLS: u32 = 50;

/// Tokens a delegated child is guaranteed regardless of fraction.
pub const DEFAULT_MIN_DELEGATED_TOKENS: usize = 100;

/// Milliseconds a delegated child is guaranteed regardless of fraction.
pub const DEFAULT_MIN_DELEGATED_TIME_MS: u64 = 1_000;

/// Tokens held back from a context window for the model response.
pub const DEFAULT_RESERVED_FOR_RESPONSE: usize = 1_000;

/// Head share for middle truncation (tail gets the remainder).
pub const DEFAULT_MIDDLE_HEAD_RATIO: f64 = 0.6;

/// Weight of relevance in the combined search sort.
pub const COMBINED_RELEVANCE_WEIGHT: f64 = 0.7;

/// Weight of importance in the combined search sort.
pub const COMBINED_IMPORTANCE_WEIGHT: f64 = 0.3;

/// Default hop ceiling for multi-hop search.
pub const DEFAULT_MAX_HOPS: usize = 2;

/// Marker appended when content is cut at the end.
pub const TRUNCATION_SUFFIX: &str = "…";

/// Marker joining head and tail in middle truncation.
pub const TRUNCATION_ELLIPSIS: &str = "\n…\n";
