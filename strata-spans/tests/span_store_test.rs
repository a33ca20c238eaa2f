use strata_core::models::span::{SourceType, SpanMetadata};
use strata_core::StrataError;
use strata_spans::{ChunkPolicy, SpanStore};
use strata_tokens::TokenCounter;

fn store() -> (SpanStore, TokenCounter) {
    (SpanStore::new(ChunkPolicy::new(1000, 100)), TokenCounter::default())
}

#[test]
fn write_chunks_with_overlap() {
    let (store, counter) = store();
    let content = "a".repeat(1500);
    let spans = store
        .write(
            SourceType::KnowledgeBase,
            "kb-1",
            &content,
            SpanMetadata::default(),
            &counter,
        )
        .unwrap();

    assert_eq!(spans.len(), 2, "1500 chars under 1000/100 policy yield 2 spans");
    assert_eq!((spans[0].start_byte, spans[0].end_byte), (0, 1000));
    assert_eq!((spans[1].start_byte, spans[1].end_byte), (900, 1500));
    for span in &spans {
        assert!(span.end_byte > span.start_byte);
        assert!(span.token_count > 0);
    }
}

#[test]
fn content_roundtrips_with_integrity() {
    let (store, counter) = store();
    let spans = store
        .write(
            SourceType::EpisodeLog,
            "ep-1",
            "the agent planned, acted, and observed",
            SpanMetadata::default(),
            &counter,
        )
        .unwrap();

    let content = store.get_content(&spans[0].id).unwrap();
    assert_eq!(content, "the agent planned, acted, and observed");
    store.verify(&spans[0].id).unwrap();
}

#[test]
fn empty_content_is_rejected() {
    let (store, counter) = store();
    let err = store
        .write(
            SourceType::Offer,
            "offer-1",
            "",
            SpanMetadata::default(),
            &counter,
        )
        .unwrap_err();
    assert!(matches!(err, StrataError::Span(_)));
}

#[test]
fn unknown_span_is_not_found() {
    let (store, _) = store();
    assert!(store.get("missing").is_none());
    assert!(store.get_content("missing").is_err());
}

#[test]
fn rewrite_supersedes_previous_generation() {
    let (store, counter) = store();
    let old = store
        .write(
            SourceType::ThreadSummary,
            "th-1",
            "first draft of the thread",
            SpanMetadata::default(),
            &counter,
        )
        .unwrap();
    let new = store
        .write(
            SourceType::ThreadSummary,
            "th-1",
            "second draft, rather longer than the first one was",
            SpanMetadata::default(),
            &counter,
        )
        .unwrap();

    // Index points only at the new generation.
    let current = store.spans_for_source("th-1");
    assert_eq!(current.len(), new.len());
    assert!(current.iter().all(|s| s.id != old[0].id));

    // The superseded span is still resolvable by id (immutability).
    assert!(store.get(&old[0].id).is_some());
    assert_eq!(store.get_content(&old[0].id).unwrap(), "first draft of the thread");
}

#[test]
fn current_spans_filters_by_source_type() {
    let (store, counter) = store();
    store
        .write(
            SourceType::KnowledgeBase,
            "kb-1",
            "brand voice guidelines",
            SpanMetadata::default(),
            &counter,
        )
        .unwrap();
    store
        .write(
            SourceType::PlanSummary,
            "plan-1",
            "q3 launch plan",
            SpanMetadata::default(),
            &counter,
        )
        .unwrap();

    let all = store.current_spans(None);
    assert_eq!(all.len(), 2);
    let kb_only = store.current_spans(Some(&[SourceType::KnowledgeBase]));
    assert_eq!(kb_only.len(), 1);
    assert_eq!(kb_only[0].source_id, "kb-1");
}

#[test]
fn snapshot_restore_roundtrip() {
    let (store, counter) = store();
    let spans = store
        .write(
            SourceType::BrandKit,
            "brand-1",
            "palette, typography, tone of voice",
            SpanMetadata::default(),
            &counter,
        )
        .unwrap();

    let snapshot = store.snapshot();
    let restored = SpanStore::default();
    restored.restore(snapshot);

    assert_eq!(restored.len(), store.len());
    assert_eq!(
        restored.get_content(&spans[0].id).unwrap(),
        "palette, typography, tone of voice"
    );
    assert_eq!(restored.spans_for_source("brand-1").len(), 1);
}
