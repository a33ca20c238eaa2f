use proptest::prelude::*;
use strata_tokens::TokenCounter;

proptest! {
    #[test]
    fn count_is_bounded(s in ".{0,300}") {
        let counter = TokenCounter::default();
        let count = counter.count(&s);
        // BPE emits at most one token per input byte.
        prop_assert!(count <= s.len() + 1);
    }

    #[test]
    fn cached_equals_uncached(s in ".{0,200}") {
        let counter = TokenCounter::default();
        let uncached = counter.count(&s);
        let cached = counter.count_cached(&s);
        prop_assert_eq!(uncached, cached);
        // Second hit comes from the cache and must agree too.
        prop_assert_eq!(counter.count_cached(&s), uncached);
    }

    #[test]
    fn near_subadditivity(a in "[a-z .]{0,100}", b in "[a-z .]{0,100}") {
        let counter = TokenCounter::default();
        let combined = format!("{}{}", a, b);
        let count_a = counter.count(&a);
        let count_b = counter.count(&b);
        let count_combined = counter.count(&combined);
        // BPE merges across the seam can shift costs by a token or two,
        // never more.
        prop_assert!(
            count_combined <= count_a + count_b + 2,
            "near-subadditivity: {} <= {} + {} + 2",
            count_combined, count_a, count_b
        );
    }

    #[test]
    fn empty_only_when_input_empty(s in ".{1,50}") {
        let counter = TokenCounter::default();
        prop_assert!(counter.count(&s) >= 1);
    }
}
