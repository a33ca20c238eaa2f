use strata_context::{BudgetCategory, ComposeOptions, ContextWindow};
use strata_core::models::section::{ContextSection, SectionType};
use strata_core::StrataError;
use strata_tokens::TokenCounter;

fn section(id: &str, priority: i32, tokens: usize) -> ContextSection {
    ContextSection::new(id, SectionType::Retrieved, format!("content of {id}"))
        .with_priority(priority)
        .with_token_count(tokens)
}

#[test]
fn add_and_account() {
    let counter = TokenCounter::default();
    let mut window = ContextWindow::new(100, 10).unwrap();

    let report = window.add_section(section("a", 1, 30), &counter).unwrap();
    assert_eq!(report.token_count, 30);
    assert!(!report.replaced);
    assert_eq!(window.used_tokens(), 30);
    assert_eq!(window.available_tokens(), 60);
}

#[test]
fn readding_same_id_replaces_with_delta() {
    let counter = TokenCounter::default();
    let mut window = ContextWindow::new(100, 0).unwrap();

    window.add_section(section("a", 1, 60), &counter).unwrap();
    // 60 used; replacing with 80 fits because the old 60 is freed first.
    let report = window.add_section(section("a", 1, 80), &counter).unwrap();
    assert!(report.replaced);
    assert_eq!(window.used_tokens(), 80);
    assert_eq!(window.section_ids(), vec!["a"]);
}

#[test]
fn counts_content_when_no_override() {
    let counter = TokenCounter::default();
    let mut window = ContextWindow::new(1000, 0).unwrap();
    let s = ContextSection::new("auto", SectionType::System, "you are a helpful agent");
    let report = window.add_section(s, &counter).unwrap();
    assert!(report.token_count > 0);
    assert_eq!(window.used_tokens(), report.token_count);
}

#[test]
fn eviction_frees_exactly_enough_lowest_first() {
    let counter = TokenCounter::default();
    let mut window = ContextWindow::new(100, 0).unwrap();
    window.add_section(section("low", 1, 40), &counter).unwrap();
    window.add_section(section("mid", 2, 40), &counter).unwrap();
    // 20 free; a 50-token priority-3 add needs 30 more. Evicting "low"
    // (priority 1) covers the shortfall; "mid" survives.
    let big = section("big", 3, 50).with_eviction();
    let report = window.add_section(big, &counter).unwrap();

    assert_eq!(report.evicted, vec!["low".to_string()]);
    assert_eq!(window.used_tokens(), 90);
    assert!(window.get_section("mid").is_some());
    assert!(window.get_section("big").is_some());
}

#[test]
fn eviction_is_all_or_nothing() {
    let counter = TokenCounter::default();
    let mut window = ContextWindow::new(100, 0).unwrap();
    window.add_section(section("low", 1, 20), &counter).unwrap();
    window.add_section(section("peer", 3, 70), &counter).unwrap();

    // Needs 80, only 10 free; evicting every strictly-lower-priority
    // section (just "low", 20 tokens) still cannot cover it. Nothing is
    // evicted and the state is unchanged.
    let before = window.snapshot();
    let err = window
        .add_section(section("big", 3, 80).with_eviction(), &counter)
        .unwrap_err();
    assert!(matches!(err, StrataError::Context(_)));

    let after = window.snapshot();
    assert_eq!(
        serde_json::to_string(&before.sections).unwrap(),
        serde_json::to_string(&after.sections).unwrap(),
        "failed add must leave the window byte-for-byte unchanged"
    );
    assert_eq!(window.used_tokens(), 90);
}

#[test]
fn equal_priority_is_never_evicted() {
    let counter = TokenCounter::default();
    let mut window = ContextWindow::new(100, 0).unwrap();
    window.add_section(section("peer", 5, 90), &counter).unwrap();

    let err = window
        .add_section(section("rival", 5, 50).with_eviction(), &counter)
        .unwrap_err();
    assert!(matches!(err, StrataError::Context(_)));
    assert!(window.get_section("peer").is_some());
}

#[test]
fn oversized_add_without_eviction_fails() {
    let counter = TokenCounter::default();
    let mut window = ContextWindow::new(50, 10).unwrap();
    let err = window.add_section(section("big", 1, 45), &counter).unwrap_err();
    assert!(matches!(err, StrataError::Context(_)));
    assert_eq!(window.used_tokens(), 0);
}

#[test]
fn allocate_budget_splits_and_validates() {
    let counter = TokenCounter::default();
    let _ = counter;
    let mut window = ContextWindow::new(1000, 0).unwrap();
    let allocations = window
        .allocate_budget(&[
            (BudgetCategory::System, 0.2),
            (BudgetCategory::Retrieved, 0.5),
            (BudgetCategory::Response, 0.3),
        ])
        .unwrap();
    assert_eq!(allocations[&BudgetCategory::System], 200);
    assert_eq!(allocations[&BudgetCategory::Retrieved], 500);
    assert_eq!(allocations[&BudgetCategory::Response], 300);
    assert_eq!(window.allocation(BudgetCategory::Retrieved), Some(500));

    let err = window
        .allocate_budget(&[
            (BudgetCategory::System, 0.6),
            (BudgetCategory::Retrieved, 0.6),
        ])
        .unwrap_err();
    assert!(matches!(err, StrataError::Context(_)));
}

#[test]
fn compose_orders_by_descending_priority() {
    let counter = TokenCounter::default();
    let mut window = ContextWindow::new(1000, 0).unwrap();
    window
        .add_section(
            ContextSection::new("later", SectionType::Conversation, "conversation turn")
                .with_priority(1),
            &counter,
        )
        .unwrap();
    window
        .add_section(
            ContextSection::new("first", SectionType::System, "system prompt").with_priority(10),
            &counter,
        )
        .unwrap();

    let text = window.compose();
    let system_pos = text.find("system prompt").unwrap();
    let convo_pos = text.find("conversation turn").unwrap();
    assert!(system_pos < convo_pos);
}

#[test]
fn compose_with_headers_and_explicit_order() {
    let counter = TokenCounter::default();
    let mut window = ContextWindow::new(1000, 0).unwrap();
    window
        .add_section(
            ContextSection::new("a", SectionType::System, "sys").with_priority(10),
            &counter,
        )
        .unwrap();
    window
        .add_section(
            ContextSection::new("b", SectionType::Retrieved, "facts").with_priority(1),
            &counter,
        )
        .unwrap();

    let composition = window.compose_with_metadata(&ComposeOptions {
        include_headers: true,
        order: Some(vec!["b".into(), "a".into()]),
    });
    assert!(composition.text.starts_with("[retrieved]\nfacts"));
    assert!(composition.text.contains("[system]\nsys"));
    assert_eq!(composition.included.len(), 2);
    assert_eq!(composition.included[0].id, "b");
    assert!(composition.total_tokens > 0);
}

#[test]
fn snapshot_restore_roundtrip() {
    let counter = TokenCounter::default();
    let mut window = ContextWindow::new(200, 20).unwrap();
    window.add_section(section("keep", 2, 50), &counter).unwrap();

    let restored = ContextWindow::restore(window.snapshot());
    assert_eq!(restored.max_tokens(), 200);
    assert_eq!(restored.used_tokens(), 50);
    assert!(restored.get_section("keep").is_some());
}

#[test]
fn reservation_larger_than_window_is_rejected() {
    assert!(ContextWindow::new(10, 20).is_err());
}
