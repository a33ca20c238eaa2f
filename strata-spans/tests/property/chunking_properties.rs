use proptest::prelude::*;
use strata_spans::{chunk_windows, ChunkPolicy};

proptest! {
    #[test]
    fn windows_cover_all_content(s in ".{1,5000}") {
        let policy = ChunkPolicy::new(1000, 100);
        let windows = chunk_windows(&s, policy);
        prop_assert!(!windows.is_empty());
        prop_assert_eq!(windows[0].0, 0);
        prop_assert_eq!(windows.last().unwrap().1, s.len());
        // Consecutive windows overlap or at least touch.
        for pair in windows.windows(2) {
            prop_assert!(pair[1].0 <= pair[0].1);
        }
    }

    #[test]
    fn windows_are_nonempty_and_on_boundaries(s in ".{1,3000}") {
        let policy = ChunkPolicy::new(500, 50);
        for (start, end) in chunk_windows(&s, policy) {
            prop_assert!(end > start);
            prop_assert!(s.is_char_boundary(start));
            prop_assert!(s.is_char_boundary(end));
        }
    }

    #[test]
    fn starts_strictly_increase(s in ".{1,4000}") {
        let policy = ChunkPolicy::new(300, 60);
        let windows = chunk_windows(&s, policy);
        for pair in windows.windows(2) {
            prop_assert!(pair[1].0 > pair[0].0);
        }
    }
}
