use proptest::prelude::*;
use strata_context::{truncate_to_fit, TruncationStrategy};
use strata_tokens::TokenCounter;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn end_result_fits_budget(s in "[a-z ]{0,800}", budget in 0usize..60) {
        let counter = TokenCounter::default();
        let out = truncate_to_fit(&s, budget, TruncationStrategy::End, &counter);
        if counter.count(&s) > budget {
            prop_assert!(counter.count(&out) <= budget);
        } else {
            prop_assert_eq!(out, s);
        }
    }

    #[test]
    fn every_strategy_fits_budget(s in "[a-zA-Z .!?\n]{1,600}", budget in 1usize..50) {
        let counter = TokenCounter::default();
        for strategy in [
            TruncationStrategy::End,
            TruncationStrategy::Sentence,
            TruncationStrategy::Paragraph,
            TruncationStrategy::Middle,
        ] {
            let out = truncate_to_fit(&s, budget, strategy, &counter);
            prop_assert!(
                counter.count(&out) <= budget,
                "{:?} overflowed: {} > {}",
                strategy, counter.count(&out), budget
            );
        }
    }

    #[test]
    fn within_budget_is_identity(s in "[a-z ]{0,100}") {
        let counter = TokenCounter::default();
        let tokens = counter.count(&s);
        let out = truncate_to_fit(&s, tokens + 1, TruncationStrategy::End, &counter);
        prop_assert_eq!(out, s);
    }

    #[test]
    fn end_output_is_prefix_plus_marker(s in "[a-z ]{50,500}") {
        let counter = TokenCounter::default();
        let budget = 10usize;
        let out = truncate_to_fit(&s, budget, TruncationStrategy::End, &counter);
        if counter.count(&s) > budget && !out.is_empty() {
            let body = out.strip_suffix('…').unwrap_or(&out);
            prop_assert!(s.starts_with(body));
        }
    }
}
