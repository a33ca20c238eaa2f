//! # strata-tokens
//!
//! Token counting for budget arithmetic. A pure text → integer estimate:
//! tiktoken's cl100k_base when available, a chars/4 heuristic otherwise.

use moka::sync::Cache;
use tiktoken_rs::CoreBPE;

/// Default capacity of the count cache.
const CACHE_CAPACITY: u64 = 10_000;

/// Counts tokens in text. `count` is pure; `count_cached` memoizes by
/// content hash so repeated counting of the same text is O(1).
pub struct TokenCounter {
    bpe: Option<CoreBPE>,
    cache: Cache<String, usize>,
}

impl TokenCounter {
    pub fn new() -> Self {
        Self {
            bpe: tiktoken_rs::cl100k_base().ok(),
            cache: Cache::new(CACHE_CAPACITY),
        }
    }

    /// Count tokens in `text`. Empty text costs zero.
    pub fn count(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        match &self.bpe {
            Some(bpe) => bpe.encode_with_special_tokens(text).len(),
            None => Self::heuristic(text),
        }
    }

    /// Cached variant of [`count`](Self::count), keyed by content hash.
    pub fn count_cached(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        let key = blake3::hash(text.as_bytes()).to_hex().to_string();
        if let Some(n) = self.cache.get(&key) {
            return n;
        }
        let n = self.count(text);
        self.cache.insert(key, n);
        n
    }

    /// Fallback estimate: roughly one token per four characters.
    fn heuristic(text: &str) -> usize {
        text.chars().count().div_ceil(4).max(1)
    }
}

impl Default for TokenCounter {
    fn default() -> Self {
        Self::new()
    }
}
