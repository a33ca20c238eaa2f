use std::collections::HashSet;

/// Pluggable relevance scoring.
///
/// The signature (`text, query → score ∈ [0, 1]`) is the stable contract:
/// production deployments substitute embedding-based scorers behind it
/// without touching the retrieval pipeline.
pub trait RelevanceScorer: Send + Sync {
    /// Score how relevant `text` is to `query`, in [0, 1].
    fn score(&self, text: &str, query: &str) -> f64;
}

/// Default scorer: fraction of distinct query words present in the text,
/// case-insensitive. Cheap, deterministic, and good enough for exact-word
/// recall; not a ranking algorithm.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenOverlapScorer;

impl RelevanceScorer for TokenOverlapScorer {
    fn score(&self, text: &str, query: &str) -> f64 {
        let query_words: HashSet<String> = query
            .split_whitespace()
            .map(|w| w.to_lowercase())
            .collect();
        if query_words.is_empty() {
            return 0.0;
        }

        let text_words: HashSet<String> = text
            .split_whitespace()
            .map(|w| w.to_lowercase())
            .collect();

        let overlap = query_words.intersection(&text_words).count();
        overlap as f64 / query_words.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_overlap_scores_one() {
        let scorer = TokenOverlapScorer;
        assert_eq!(scorer.score("launch the summer campaign", "summer campaign"), 1.0);
    }

    #[test]
    fn no_overlap_scores_zero() {
        let scorer = TokenOverlapScorer;
        assert_eq!(scorer.score("quarterly revenue report", "summer campaign"), 0.0);
    }

    #[test]
    fn partial_overlap_is_fractional() {
        let scorer = TokenOverlapScorer;
        let s = scorer.score("the summer report", "summer campaign");
        assert!((s - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn case_insensitive() {
        let scorer = TokenOverlapScorer;
        assert_eq!(scorer.score("Summer CAMPAIGN brief", "summer campaign"), 1.0);
    }

    #[test]
    fn empty_query_scores_zero() {
        let scorer = TokenOverlapScorer;
        assert_eq!(scorer.score("anything", ""), 0.0);
    }
}
