use proptest::prelude::*;
use strata_core::config::DelegationConfig;
use strata_core::models::budget::{Budget, BudgetCharge, BudgetState};
use strata_session::{check_and_consume, delegate_ceiling};

proptest! {
    #[test]
    fn counters_are_monotonic_and_capped(
        max_tokens in 1usize..10_000,
        charges in prop::collection::vec(0usize..2_000, 0..30),
    ) {
        let budget = Budget::new(max_tokens, 60_000, 3);
        let mut state = BudgetState::default();
        let mut last = 0usize;
        for charge in charges {
            let before = state;
            match check_and_consume(&budget, &mut state, BudgetCharge::tokens(charge)) {
                Ok(()) => prop_assert_eq!(state.tokens_used, before.tokens_used + charge),
                Err(_) => prop_assert_eq!(state, before),
            }
            prop_assert!(state.tokens_used >= last);
            prop_assert!(state.tokens_used <= max_tokens);
            last = state.tokens_used;
        }
    }

    #[test]
    fn child_ceiling_never_exceeds_parent_remaining(
        max_tokens in 1usize..100_000,
        used in 0usize..100_000,
        fraction in 0.001f64..=1.0,
    ) {
        let budget = Budget::new(max_tokens, 60_000, 3);
        let state = BudgetState {
            tokens_used: used.min(max_tokens),
            ..Default::default()
        };
        let child = delegate_ceiling(
            &budget,
            &state,
            fraction,
            &DelegationConfig::default(),
            None,
        ).unwrap();
        prop_assert!(child.max_tokens <= state.tokens_remaining(&budget));
        prop_assert!(child.max_time_ms <= budget.max_time_ms);
        prop_assert_eq!(child.max_retries, 3);
    }

    #[test]
    fn full_fraction_hands_over_everything_remaining(
        max_tokens in 1usize..50_000,
        used in 0usize..50_000,
    ) {
        let budget = Budget::new(max_tokens, 60_000, 3);
        let state = BudgetState {
            tokens_used: used.min(max_tokens),
            ..Default::default()
        };
        let child = delegate_ceiling(
            &budget,
            &state,
            1.0,
            &DelegationConfig { min_tokens: 0, min_time_ms: 0 },
            None,
        ).unwrap();
        prop_assert_eq!(child.max_tokens, state.tokens_remaining(&budget));
    }
}
