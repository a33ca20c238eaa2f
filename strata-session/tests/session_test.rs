use std::sync::Arc;

use strata_core::config::StrataConfig;
use strata_core::models::budget::Budget;
use strata_core::models::session::{SessionOutcome, SessionStatus};
use strata_core::models::span::{SourceType, SpanMetadata};
use strata_core::StrataError;
use strata_session::{Environment, RetrieveFilters, SessionParams};

fn params(budget: Budget) -> SessionParams {
    SessionParams {
        client_id: "client-1".into(),
        agent_type: "planner".into(),
        episode_id: "ep-1".into(),
        budget: Some(budget),
    }
}

fn env() -> Environment {
    Environment::new(StrataConfig::default())
}

#[test]
fn write_then_retrieve_within_budget() {
    let env = env();
    let sid = env.start_session(params(Budget::new(1000, 60_000, 3)));

    // 1500 chars chunk into exactly 2 spans under the 1000/100 policy.
    let content = format!("campaign brief {}", "detail ".repeat(210));
    assert!(content.len() > 1400 && content.len() < 2000);
    let spans = env
        .write(
            &sid,
            SourceType::KnowledgeBase,
            "kb-1",
            &content,
            SpanMetadata::default(),
        )
        .unwrap();
    assert_eq!(spans.len(), 2);

    let result = env
        .retrieve(&sid, "campaign detail", 100, &RetrieveFilters::default())
        .unwrap();
    let sum: usize = result.spans.iter().map(|s| s.span.token_count).sum();
    assert!(sum <= 100, "retrieved spans must fit the requested ceiling");
    assert_eq!(result.tokens_used, sum);
    assert!(
        result.has_more,
        "relevant content remains beyond the 100-token ceiling"
    );

    let info = env.session(&sid).unwrap();
    assert!(info.state.tokens_used <= info.budget.max_tokens);
}

#[test]
fn retrieve_request_beyond_remaining_is_rejected_unchanged() {
    let env = env();
    let sid = env.start_session(params(Budget::new(50, 60_000, 3)));

    let err = env
        .retrieve(&sid, "anything", 100, &RetrieveFilters::default())
        .unwrap_err();
    assert!(matches!(err, StrataError::Budget(_)));
    assert_eq!(env.session(&sid).unwrap().state.tokens_used, 0);
}

#[test]
fn tokens_used_is_monotonic_and_capped() {
    let env = env();
    let sid = env.start_session(params(Budget::new(500, 60_000, 3)));
    env.write(
        &sid,
        SourceType::EpisodeLog,
        "log-1",
        "observed the palette question from the lead twice",
        SpanMetadata::default(),
    )
    .unwrap();

    let mut last = 0usize;
    for _ in 0..5 {
        if env
            .retrieve(&sid, "palette lead", 50, &RetrieveFilters::default())
            .is_err()
        {
            break;
        }
        let used = env.session(&sid).unwrap().state.tokens_used;
        assert!(used >= last);
        last = used;
    }
    let info = env.session(&sid).unwrap();
    assert!(info.state.tokens_used <= info.budget.max_tokens);
}

#[test]
fn peek_costs_nothing() {
    let env = env();
    let sid = env.start_session(params(Budget::new(1000, 60_000, 3)));
    let spans = env
        .write(
            &sid,
            SourceType::Offer,
            "offer-1",
            "spring bundle offer text",
            SpanMetadata::default(),
        )
        .unwrap();
    let used_after_write = env.session(&sid).unwrap().state.tokens_used;

    let peeked = env.peek(&sid, &spans[0].id, true).unwrap();
    assert_eq!(peeked.span.id, spans[0].id);
    assert_eq!(peeked.content.as_deref(), Some("spring bundle offer text"));
    assert_eq!(env.session(&sid).unwrap().state.tokens_used, used_after_write);
}

#[test]
fn peek_unknown_span_is_not_found() {
    let env = env();
    let sid = env.start_session(params(Budget::new(1000, 60_000, 3)));
    let err = env.peek(&sid, "missing", false).unwrap_err();
    assert!(matches!(err, StrataError::Span(_)));
}

#[test]
fn delegate_halves_remaining_and_charges_subcall() {
    let env = env();
    let sid = env.start_session(params(
        Budget::new(1000, 60_000, 3).with_subcalls(4).with_tool_calls(8),
    ));

    let child_id = env.delegate(&sid, "writer", 0.5, None).unwrap();
    let child = env.session(&child_id).unwrap();
    assert!(child.budget.max_tokens <= 500);
    assert_eq!(child.budget.max_retries, 3);
    assert_eq!(child.budget.max_subcalls, Some(2));
    assert_eq!(child.parent_session_id.as_deref(), Some(sid.as_str()));
    assert_eq!(child.client_id, "client-1");
    assert_eq!(child.agent_type, "writer");

    let parent = env.session(&sid).unwrap();
    assert_eq!(parent.state.subcalls_used, 1);
    // Delegation reserves nothing from the parent's token budget.
    assert_eq!(parent.state.tokens_used, 0);
}

#[test]
fn rejected_fraction_charges_nothing() {
    let env = env();
    let sid = env.start_session(params(Budget::new(1000, 60_000, 3).with_subcalls(4)));

    for bad in [0.0, -0.5, 1.5] {
        let err = env.delegate(&sid, "writer", bad, None).unwrap_err();
        assert!(matches!(err, StrataError::Budget(_)));
    }
    // A rejected delegation leaves every counter untouched.
    let info = env.session(&sid).unwrap();
    assert_eq!(info.state.subcalls_used, 0);
    assert_eq!(env.session_count(), 1);
}

#[test]
fn subcall_ceiling_limits_delegation() {
    let env = env();
    let sid = env.start_session(params(Budget::new(1000, 60_000, 3).with_subcalls(1)));

    env.delegate(&sid, "writer", 0.5, None).unwrap();
    let err = env.delegate(&sid, "writer", 0.5, None).unwrap_err();
    assert!(matches!(err, StrataError::Budget(_)));
}

#[test]
fn parent_end_does_not_end_children() {
    let env = env();
    let sid = env.start_session(params(Budget::new(1000, 60_000, 3)));
    let child_id = env.delegate(&sid, "writer", 0.5, None).unwrap();

    env.end(&sid, SessionOutcome::Success).unwrap();
    assert_eq!(env.session(&child_id).unwrap().status, SessionStatus::Active);
    env.end(&child_id, SessionOutcome::Success).unwrap();
}

#[test]
fn end_is_terminal_and_unrepeatable() {
    let env = env();
    let sid = env.start_session(params(Budget::new(1000, 60_000, 3)));

    let report = env.end(&sid, SessionOutcome::Success).unwrap();
    assert_eq!(report.status, SessionStatus::Completed);

    let err = env.end(&sid, SessionOutcome::Failure).unwrap_err();
    assert!(matches!(err, StrataError::Session(_)));
    let err = env
        .retrieve(&sid, "query", 10, &RetrieveFilters::default())
        .unwrap_err();
    assert!(matches!(err, StrataError::Session(_)));
}

#[test]
fn outcome_maps_to_terminal_status() {
    let env = env();
    for (outcome, status) in [
        (SessionOutcome::Success, SessionStatus::Completed),
        (SessionOutcome::Failure, SessionStatus::Failed),
        (SessionOutcome::BudgetExhausted, SessionStatus::Failed),
        (SessionOutcome::Timeout, SessionStatus::Timeout),
    ] {
        let sid = env.start_session(params(Budget::new(100, 60_000, 3)));
        assert_eq!(env.end(&sid, outcome).unwrap().status, status);
    }
}

#[test]
fn timeout_is_discovered_on_next_access() {
    let env = env();
    let sid = env.start_session(params(Budget::new(1000, 1, 3)));
    std::thread::sleep(std::time::Duration::from_millis(10));

    let err = env
        .retrieve(&sid, "query", 10, &RetrieveFilters::default())
        .unwrap_err();
    assert!(matches!(err, StrataError::Session(_)));
    assert_eq!(env.session(&sid).unwrap().status, SessionStatus::Timeout);

    // Once flipped, further operations report the terminal state.
    let err = env.peek(&sid, "any", false).unwrap_err();
    assert!(matches!(err, StrataError::Session(_)));
}

#[test]
fn retry_budget_is_callers_to_spend() {
    let env = env();
    let sid = env.start_session(params(Budget::new(1000, 60_000, 2)));
    env.record_retry(&sid).unwrap();
    env.record_retry(&sid).unwrap();
    let err = env.record_retry(&sid).unwrap_err();
    assert!(matches!(err, StrataError::Budget(_)));
    assert_eq!(env.session(&sid).unwrap().state.retries_used, 2);
}

#[test]
fn tool_calls_are_charged() {
    let env = env();
    let sid = env.start_session(params(Budget::new(1000, 60_000, 3).with_tool_calls(1)));
    env.record_tool_call(&sid).unwrap();
    assert!(env.record_tool_call(&sid).is_err());
}

#[test]
fn every_operation_is_logged_including_failures() {
    let env = env();
    let sid = env.start_session(params(Budget::new(1000, 60_000, 3)));

    env.write(
        &sid,
        SourceType::KnowledgeBase,
        "kb-1",
        "logged content",
        SpanMetadata::default(),
    )
    .unwrap();
    let _ = env.peek(&sid, "missing", false);
    env.end(&sid, SessionOutcome::Success).unwrap();

    let log = env.access_log(&sid).unwrap();
    assert_eq!(log.len(), 3);
    assert!(log[0].error.is_none());
    assert!(log[0].tokens > 0);
    assert!(log[1].error.is_some(), "failed peek is recorded with its error");
    assert!(log[2].error.is_none());
}

#[test]
fn unknown_session_is_not_found() {
    let env = env();
    let err = env
        .retrieve("missing", "q", 10, &RetrieveFilters::default())
        .unwrap_err();
    assert!(matches!(err, StrataError::Session(_)));
}

#[test]
fn concurrent_retrieves_on_one_session_never_overspend() {
    let env = Arc::new(env());
    let sid = env.start_session(params(Budget::new(400, 60_000, 3)));
    env.write(
        &sid,
        SourceType::KnowledgeBase,
        "kb-1",
        &"shared fact sheet entry. ".repeat(40),
        SpanMetadata::default(),
    )
    .unwrap();
    let baseline = env.session(&sid).unwrap().state.tokens_used;

    let mut handles = Vec::new();
    for _ in 0..2 {
        let env = Arc::clone(&env);
        let sid = sid.clone();
        handles.push(std::thread::spawn(move || {
            env.retrieve(&sid, "fact sheet", 80, &RetrieveFilters::default())
                .map(|r| r.tokens_used)
                .unwrap_or(0)
        }));
    }
    let accepted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

    let info = env.session(&sid).unwrap();
    assert_eq!(
        info.state.tokens_used,
        baseline + accepted,
        "serialized check-then-consume: no double-count, no lost update"
    );
    assert!(info.state.tokens_used <= info.budget.max_tokens);
}
