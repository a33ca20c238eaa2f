//! The environment: one explicit instance per tenant-process, holding the
//! shared stores and the session arena. No global singleton.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use strata_core::config::StrataConfig;
use strata_core::errors::{BudgetError, SessionError, SpanError, StrataResult};
use strata_core::models::budget::{Budget, BudgetCharge, BudgetState, ResourceKind};
use strata_core::models::session::{SessionOutcome, SessionStatus};
use strata_core::models::span::{SourceType, Span, SpanMetadata};
use strata_core::traits::scorer::{RelevanceScorer, TokenOverlapScorer};
use strata_registry::ReferenceRegistry;
use strata_spans::{chunk_windows, ChunkPolicy, SpanStore};
use strata_summary::SummaryStore;
use strata_tokens::TokenCounter;

use crate::access_log::{AccessEntry, SessionOperation};
use crate::budget::{check_and_consume, delegate_ceiling, validate_fraction};
use crate::session::Session;

/// Inputs for `start_session`, supplied by the episode runner.
#[derive(Debug, Clone)]
pub struct SessionParams {
    pub client_id: String,
    pub agent_type: String,
    pub episode_id: String,
    /// Explicit ceiling; `None` uses the configured default.
    pub budget: Option<Budget>,
}

/// Candidate filters for `retrieve`.
#[derive(Debug, Clone, Default)]
pub struct RetrieveFilters {
    pub source_types: Option<Vec<SourceType>>,
    /// Minimum relevance score; candidates scoring zero are always dropped.
    pub min_score: Option<f64>,
}

/// One accepted span with its verified content and relevance score.
#[derive(Debug, Clone)]
pub struct RetrievedSpan {
    pub span: Span,
    pub content: String,
    pub score: f64,
}

/// Result of `retrieve`.
#[derive(Debug, Clone)]
pub struct RetrieveResult {
    pub spans: Vec<RetrievedSpan>,
    /// Tokens charged, the sum of accepted span costs.
    pub tokens_used: usize,
    /// Relevant candidates remained beyond the token ceiling.
    pub has_more: bool,
}

/// Result of `peek`: zero-budget metadata, plus content when asked.
#[derive(Debug, Clone)]
pub struct PeekResult {
    pub span: Span,
    pub content: Option<String>,
}

/// Final accounting returned by `end`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndReport {
    pub session_id: String,
    pub status: SessionStatus,
    pub totals: BudgetState,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

/// Read-only view of a session's identity and counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub id: String,
    pub client_id: String,
    pub agent_type: String,
    pub episode_id: String,
    pub parent_session_id: Option<String>,
    pub status: SessionStatus,
    pub budget: Budget,
    pub state: BudgetState,
    pub started_at: DateTime<Utc>,
}

/// The external-memory environment for one tenant-process: span store,
/// summary store, reference registry, token counter, and the session
/// arena. Sessions are stored behind one mutex each, so all mutation of a
/// session's budget state is serialized while different sessions never
/// contend.
pub struct Environment {
    config: StrataConfig,
    counter: TokenCounter,
    spans: SpanStore,
    summaries: SummaryStore,
    registry: ReferenceRegistry,
    scorer: Box<dyn RelevanceScorer>,
    sessions: DashMap<String, Arc<Mutex<Session>>>,
}

impl Environment {
    pub fn new(config: StrataConfig) -> Self {
        let policy = ChunkPolicy::new(config.chunking.chunk_size, config.chunking.chunk_overlap);
        Self {
            config,
            counter: TokenCounter::new(),
            spans: SpanStore::new(policy),
            summaries: SummaryStore::new(),
            registry: ReferenceRegistry::new(),
            scorer: Box::new(TokenOverlapScorer),
            sessions: DashMap::new(),
        }
    }

    /// Substitute the relevance scorer (the stable `text, query → [0,1]`
    /// contract).
    pub fn with_scorer(mut self, scorer: Box<dyn RelevanceScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    // --- Shared store access ---

    pub fn config(&self) -> &StrataConfig {
        &self.config
    }

    pub fn counter(&self) -> &TokenCounter {
        &self.counter
    }

    pub fn spans(&self) -> &SpanStore {
        &self.spans
    }

    pub fn summaries(&self) -> &SummaryStore {
        &self.summaries
    }

    pub fn registry(&self) -> &ReferenceRegistry {
        &self.registry
    }

    pub fn scorer(&self) -> &dyn RelevanceScorer {
        self.scorer.as_ref()
    }

    // --- Session lifecycle ---

    /// Create a root session for one agent episode. Safe to call from any
    /// thread; each session gets independent identity and state.
    pub fn start_session(&self, params: SessionParams) -> String {
        let budget = params.budget.unwrap_or_else(|| self.default_budget());
        let session = Session::new(
            params.client_id,
            params.agent_type,
            params.episode_id,
            budget,
            None,
        );
        let id = session.id.clone();
        info!(session = %id, max_tokens = budget.max_tokens, "session started");
        self.sessions.insert(id.clone(), Arc::new(Mutex::new(session)));
        id
    }

    /// Read-only snapshot of a session.
    pub fn session(&self, session_id: &str) -> StrataResult<SessionInfo> {
        let arc = self.session_arc(session_id)?;
        let session = lock(&arc);
        Ok(SessionInfo {
            id: session.id.clone(),
            client_id: session.client_id.clone(),
            agent_type: session.agent_type.clone(),
            episode_id: session.episode_id.clone(),
            parent_session_id: session.parent_session_id.clone(),
            status: session.status,
            budget: session.budget,
            state: session.state,
            started_at: session.started_at,
        })
    }

    /// The session's access log, in operation order.
    pub fn access_log(&self, session_id: &str) -> StrataResult<Vec<AccessEntry>> {
        let arc = self.session_arc(session_id)?;
        let session = lock(&arc);
        Ok(session.access_log.clone())
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn session_ids(&self) -> Vec<String> {
        self.sessions.iter().map(|e| e.key().clone()).collect()
    }

    // --- Session operations ---

    /// Retrieve budgeted content: candidates are scored by the pluggable
    /// scorer and accepted greedily in score order until the next span
    /// would exceed `max_tokens`. Fail-fast: a request for more tokens
    /// than the session has left is rejected before any work.
    pub fn retrieve(
        &self,
        session_id: &str,
        query: &str,
        max_tokens: usize,
        filters: &RetrieveFilters,
    ) -> StrataResult<RetrieveResult> {
        let started = Instant::now();
        let arc = self.session_arc(session_id)?;
        let mut session = lock(&arc);
        let result = self.retrieve_inner(&mut session, query, max_tokens, filters);
        let tokens = result.as_ref().map(|r| r.tokens_used).unwrap_or(0);
        log_op(&mut session, SessionOperation::Retrieve, started, tokens, &result);
        result
    }

    fn retrieve_inner(
        &self,
        session: &mut Session,
        query: &str,
        max_tokens: usize,
        filters: &RetrieveFilters,
    ) -> StrataResult<RetrieveResult> {
        session.ensure_active()?;

        let remaining = session.state.tokens_remaining(&session.budget);
        if max_tokens > remaining {
            return Err(BudgetError::Exhausted {
                resource: ResourceKind::Tokens,
                requested: max_tokens as u64,
                remaining: remaining as u64,
            }
            .into());
        }

        let candidates = self.spans.current_spans(filters.source_types.as_deref());
        let min_score = filters.min_score.unwrap_or(0.0);
        let mut scored: Vec<RetrievedSpan> = Vec::new();
        for span in candidates {
            let content = self.spans.get_content(&span.id)?;
            let score = self.scorer.score(&content, query);
            if score > 0.0 && score >= min_score {
                scored.push(RetrievedSpan { span, content, score });
            }
        }
        // Deterministic order: score descending, id as the tie-break.
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.span.id.cmp(&b.span.id))
        });
        debug!(candidates = scored.len(), query, "scored retrieval candidates");

        let mut accepted = Vec::new();
        let mut tokens_used = 0usize;
        let mut has_more = false;
        for candidate in scored {
            if tokens_used + candidate.span.token_count > max_tokens {
                has_more = true;
                break;
            }
            tokens_used += candidate.span.token_count;
            accepted.push(candidate);
        }

        check_and_consume(
            &session.budget,
            &mut session.state,
            BudgetCharge::tokens(tokens_used),
        )?;

        info!(
            session = %session.id,
            spans = accepted.len(),
            tokens = tokens_used,
            has_more,
            "retrieve complete"
        );
        Ok(RetrieveResult {
            spans: accepted,
            tokens_used,
            has_more,
        })
    }

    /// Zero-budget metadata lookup, for navigation before committing to
    /// retrieval. Content (integrity-verified) comes along when asked.
    pub fn peek(
        &self,
        session_id: &str,
        span_id: &str,
        include_content: bool,
    ) -> StrataResult<PeekResult> {
        let started = Instant::now();
        let arc = self.session_arc(session_id)?;
        let mut session = lock(&arc);
        let result = self.peek_inner(&mut session, span_id, include_content);
        log_op(&mut session, SessionOperation::Peek, started, 0, &result);
        result
    }

    fn peek_inner(
        &self,
        session: &mut Session,
        span_id: &str,
        include_content: bool,
    ) -> StrataResult<PeekResult> {
        session.ensure_active()?;
        let span = self.spans.get(span_id).ok_or_else(|| SpanError::NotFound {
            span_id: span_id.to_string(),
        })?;
        let content = if include_content {
            Some(self.spans.get_content(span_id)?)
        } else {
            None
        };
        Ok(PeekResult { span, content })
    }

    /// Write content into the span store, charged at its chunked token
    /// total (overlap included), checked before anything is stored.
    pub fn write(
        &self,
        session_id: &str,
        source_type: SourceType,
        source_id: &str,
        content: &str,
        metadata: SpanMetadata,
    ) -> StrataResult<Vec<Span>> {
        let started = Instant::now();
        let arc = self.session_arc(session_id)?;
        let mut session = lock(&arc);
        let result = self.write_inner(&mut session, source_type, source_id, content, metadata);
        let tokens = result
            .as_ref()
            .map(|spans| spans.iter().map(|s| s.token_count).sum())
            .unwrap_or(0);
        log_op(&mut session, SessionOperation::Write, started, tokens, &result);
        result
    }

    fn write_inner(
        &self,
        session: &mut Session,
        source_type: SourceType,
        source_id: &str,
        content: &str,
        metadata: SpanMetadata,
    ) -> StrataResult<Vec<Span>> {
        session.ensure_active()?;

        let policy = ChunkPolicy::new(
            self.config.chunking.chunk_size,
            self.config.chunking.chunk_overlap,
        );
        let windows = chunk_windows(content, policy);
        if windows.is_empty() {
            return Err(SpanError::EmptyContent {
                source_id: source_id.to_string(),
            }
            .into());
        }
        let cost: usize = windows
            .iter()
            .map(|&(start, end)| self.counter.count_cached(&content[start..end]))
            .sum();

        check_and_consume(&session.budget, &mut session.state, BudgetCharge::tokens(cost))?;
        let spans = self
            .spans
            .write(source_type, source_id, content, metadata, &self.counter)?;
        info!(
            session = %session.id,
            source = source_id,
            spans = spans.len(),
            tokens = cost,
            "write complete"
        );
        Ok(spans)
    }

    /// Create a child session from a fraction of this session's remaining
    /// budget. Charges one sub-call. Unused child budget is not refunded.
    pub fn delegate(
        &self,
        session_id: &str,
        agent_type: &str,
        fraction: f64,
        fixed: Option<Budget>,
    ) -> StrataResult<String> {
        let started = Instant::now();
        let arc = self.session_arc(session_id)?;
        let mut session = lock(&arc);
        let result = self.delegate_inner(&mut session, agent_type, fraction, fixed);
        log_op(&mut session, SessionOperation::Delegate, started, 0, &result);
        result
    }

    fn delegate_inner(
        &self,
        session: &mut Session,
        agent_type: &str,
        fraction: f64,
        fixed: Option<Budget>,
    ) -> StrataResult<String> {
        session.ensure_active()?;
        // Reject a bad fraction before anything is charged.
        validate_fraction(fraction)?;
        check_and_consume(&session.budget, &mut session.state, BudgetCharge::subcall())?;
        let child_budget = delegate_ceiling(
            &session.budget,
            &session.state,
            fraction,
            &self.config.delegation,
            fixed,
        )?;

        let child = Session::new(
            session.client_id.clone(),
            agent_type,
            session.episode_id.clone(),
            child_budget,
            Some(session.id.clone()),
        );
        let child_id = child.id.clone();
        info!(
            parent = %session.id,
            child = %child_id,
            fraction,
            child_tokens = child_budget.max_tokens,
            "delegated sub-session"
        );
        self.sessions
            .insert(child_id.clone(), Arc::new(Mutex::new(child)));
        Ok(child_id)
    }

    /// Charge one tool call against the session.
    pub fn record_tool_call(&self, session_id: &str) -> StrataResult<()> {
        let started = Instant::now();
        let arc = self.session_arc(session_id)?;
        let mut session = lock(&arc);
        let result = charge_one(&mut session, BudgetCharge::tool_call());
        log_op(&mut session, SessionOperation::ToolCall, started, 0, &result);
        result
    }

    /// Charge one retry. Retry policy belongs to the caller; each attempt
    /// spends from the caller's own retry budget.
    pub fn record_retry(&self, session_id: &str) -> StrataResult<()> {
        let started = Instant::now();
        let arc = self.session_arc(session_id)?;
        let mut session = lock(&arc);
        let result = charge_one(&mut session, BudgetCharge::retry());
        log_op(&mut session, SessionOperation::Retry, started, 0, &result);
        result
    }

    /// The only state transition out of `Active`. Ending twice, or ending
    /// a session that already flipped to timeout, fails with a
    /// terminal-session error.
    pub fn end(&self, session_id: &str, outcome: SessionOutcome) -> StrataResult<EndReport> {
        let started = Instant::now();
        let arc = self.session_arc(session_id)?;
        let mut session = lock(&arc);
        let result = (|| {
            session.ensure_active()?;
            session.status = outcome.terminal_status();
            let report = EndReport {
                session_id: session.id.clone(),
                status: session.status,
                totals: session.state,
                started_at: session.started_at,
                ended_at: Utc::now(),
            };
            info!(
                session = %session.id,
                status = ?session.status,
                tokens = session.state.tokens_used,
                "session ended"
            );
            Ok(report)
        })();
        log_op(&mut session, SessionOperation::End, started, 0, &result);
        result
    }

    // --- Internals ---

    fn default_budget(&self) -> Budget {
        let cfg = &self.config.session_budget;
        Budget::new(cfg.max_tokens, cfg.max_time_ms, cfg.max_retries)
            .with_subcalls(cfg.max_subcalls)
            .with_tool_calls(cfg.max_tool_calls)
    }

    fn session_arc(&self, session_id: &str) -> StrataResult<Arc<Mutex<Session>>> {
        self.sessions
            .get(session_id)
            .map(|e| e.value().clone())
            .ok_or_else(|| {
                SessionError::NotFound {
                    session_id: session_id.to_string(),
                }
                .into()
            })
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new(StrataConfig::default())
    }
}

fn charge_one(session: &mut Session, charge: BudgetCharge) -> StrataResult<()> {
    session.ensure_active()?;
    check_and_consume(&session.budget, &mut session.state, charge)?;
    Ok(())
}

/// Lock a session, recovering from poisoning: budget state is only
/// mutated after its checks pass, so the inner state is still coherent.
fn lock(arc: &Arc<Mutex<Session>>) -> std::sync::MutexGuard<'_, Session> {
    arc.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Append the operation to the session log, success or failure.
fn log_op<T>(
    session: &mut Session,
    operation: SessionOperation,
    started: Instant,
    tokens: usize,
    result: &StrataResult<T>,
) {
    session.access_log.push(AccessEntry {
        operation,
        at: Utc::now(),
        duration_ms: started.elapsed().as_millis() as u64,
        tokens,
        error: result.as_ref().err().map(|e| e.to_string()),
    });
}
