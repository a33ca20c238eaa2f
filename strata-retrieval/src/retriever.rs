//! The MemoryRetriever façade: borrows the environment's shared stores
//! and orchestrates search → expand → chunk → compose.

use std::collections::HashSet;

use tracing::{debug, info};

use strata_context::{truncate_to_fit, ContextWindow, TruncationStrategy};
use strata_core::config::RetrievalConfig;
use strata_core::errors::{MemoryError, StrataError, StrataResult};
use strata_core::models::section::{ContextSection, SectionType};
use strata_core::models::span::SourceType;
use strata_core::traits::scorer::RelevanceScorer;
use strata_registry::{AccessOperation, LinkQuery, ReferenceRegistry};
use strata_session::Environment;
use strata_spans::SpanStore;
use strata_summary::SummaryStore;
use strata_tokens::TokenCounter;

use crate::search::{HopResult, ResultOrigin, SearchOptions, SearchResult, SortBy};

/// Importance assumed for items that declare none.
const DEFAULT_IMPORTANCE: f64 = 0.5;

/// Zero-cost metadata view of an id, for navigation before committing to
/// retrieval.
#[derive(Debug, Clone)]
pub struct PeekInfo {
    pub id: String,
    pub origin: ResultOrigin,
    pub source_type: SourceType,
    pub label: String,
    pub description: Option<String>,
    /// Ids linked to this one in the reference graph.
    pub related_ids: Vec<String>,
    pub token_estimate: usize,
}

/// Budget-fitted content for an id.
#[derive(Debug, Clone)]
pub struct ChunkResult {
    pub id: String,
    /// Header (when requested) plus truncated content.
    pub content: String,
    pub token_count: usize,
    /// The full content did not fit the budget.
    pub truncated: bool,
}

/// The unified retriever. Borrows the stores; construct one per call
/// site, or via [`from_env`](Self::from_env).
pub struct MemoryRetriever<'a> {
    spans: &'a SpanStore,
    summaries: &'a SummaryStore,
    registry: &'a ReferenceRegistry,
    counter: &'a TokenCounter,
    scorer: &'a dyn RelevanceScorer,
    config: RetrievalConfig,
    /// Session attributed in the registry's access log; `None` skips
    /// access recording.
    session_id: Option<String>,
}

impl<'a> MemoryRetriever<'a> {
    pub fn new(
        spans: &'a SpanStore,
        summaries: &'a SummaryStore,
        registry: &'a ReferenceRegistry,
        counter: &'a TokenCounter,
        scorer: &'a dyn RelevanceScorer,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            spans,
            summaries,
            registry,
            counter,
            scorer,
            config,
            session_id: None,
        }
    }

    /// Borrow everything from an environment.
    pub fn from_env(env: &'a Environment) -> Self {
        Self::new(
            env.spans(),
            env.summaries(),
            env.registry(),
            env.counter(),
            env.scorer(),
            env.config().retrieval.clone(),
        )
    }

    /// Attribute registry access records to a session.
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    // --- search ---

    /// Cross-source search over summaries and references. Each candidate
    /// is scored by the relevance function; the combined sort weighs
    /// relevance and importance 0.7/0.3. Results are cut by count, then
    /// greedily by token budget when one is given.
    pub fn search(&self, options: &SearchOptions) -> Vec<SearchResult> {
        let mut results = self.gather_candidates(options);

        let min_relevance = options.min_relevance.unwrap_or(0.0);
        results.retain(|r| r.relevance > 0.0 && r.relevance >= min_relevance);

        results.sort_by(|a, b| {
            b.sort_key(options.sort_by)
                .partial_cmp(&a.sort_key(options.sort_by))
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        results.truncate(options.max_results);

        if let Some(budget) = options.max_tokens {
            let mut kept = Vec::new();
            let mut spent = 0usize;
            for result in results {
                if spent + result.token_count > budget {
                    break;
                }
                spent += result.token_count;
                kept.push(result);
            }
            results = kept;
        }

        if let Some(session_id) = &self.session_id {
            for result in &results {
                if result.origin == ResultOrigin::Reference {
                    self.registry
                        .record_access(&result.id, session_id, AccessOperation::Search);
                }
            }
        }

        info!(
            query = %options.query,
            results = results.len(),
            "search complete"
        );
        results
    }

    /// Search, then expand the result set by following reference links
    /// outward, up to `max_hops` times. De-duplicates by id, records the
    /// hop distance and id path for every expansion, and stops early when
    /// a hop adds nothing new.
    pub fn search_with_hops(&self, options: &SearchOptions, max_hops: usize) -> Vec<HopResult> {
        let initial = self.search(options);
        let mut seen: HashSet<String> = initial.iter().map(|r| r.id.clone()).collect();
        let mut results: Vec<HopResult> = initial
            .into_iter()
            .map(|result| HopResult {
                path: vec![result.id.clone()],
                result,
                hop: 0,
            })
            .collect();

        let mut frontier: Vec<(String, Vec<String>)> = results
            .iter()
            .filter(|h| h.result.origin == ResultOrigin::Reference)
            .map(|h| (h.result.id.clone(), h.path.clone()))
            .collect();

        for hop in 1..=max_hops {
            let mut next_frontier = Vec::new();
            for (id, path) in &frontier {
                for neighbor in self.registry.linked(id, LinkQuery::default()) {
                    let reference = neighbor.reference;
                    if !seen.insert(reference.id.clone()) {
                        continue;
                    }
                    if let Some(session_id) = &self.session_id {
                        self.registry.record_access(
                            &reference.id,
                            session_id,
                            AccessOperation::Traverse,
                        );
                    }
                    let mut hop_path = path.clone();
                    hop_path.push(reference.id.clone());
                    let result = self.reference_result(&reference, &options.query);
                    next_frontier.push((reference.id, hop_path.clone()));
                    results.push(HopResult {
                        result,
                        hop,
                        path: hop_path,
                    });
                }
            }
            if next_frontier.is_empty() {
                debug!(hop, "hop expansion added nothing; stopping early");
                break;
            }
            frontier = next_frontier;
        }
        results
    }

    // --- peek ---

    /// Resolve an id against summaries, then references. Costs nothing.
    pub fn peek(&self, id: &str) -> StrataResult<PeekInfo> {
        if let Some(thread) = self.summaries.get_thread(id) {
            return Ok(PeekInfo {
                id: thread.id.clone(),
                origin: ResultOrigin::ThreadSummary,
                source_type: SourceType::ThreadSummary,
                label: thread.title.clone(),
                description: Some(thread.summary.clone()),
                related_ids: Vec::new(),
                token_estimate: thread.token_count,
            });
        }
        if let Some(plan) = self.summaries.get_plan(id) {
            return Ok(PeekInfo {
                id: plan.id.clone(),
                origin: ResultOrigin::PlanSummary,
                source_type: SourceType::PlanSummary,
                label: plan.objective.clone(),
                description: None,
                related_ids: Vec::new(),
                token_estimate: plan.token_count,
            });
        }
        if let Some(reference) = self.registry.get(id) {
            if let Some(session_id) = &self.session_id {
                self.registry
                    .record_access(id, session_id, AccessOperation::Peek);
            }
            let related_ids = self
                .registry
                .linked(id, LinkQuery::default())
                .into_iter()
                .map(|n| n.reference.id)
                .collect();
            let token_estimate = reference
                .span_pointer
                .as_ref()
                .map(|p| p.token_estimate)
                .unwrap_or_else(|| self.counter.count_cached(&self.reference_text(&reference)));
            return Ok(PeekInfo {
                id: reference.id.clone(),
                origin: ResultOrigin::Reference,
                source_type: reference.reference_type,
                label: reference.label.clone(),
                description: reference.description.clone(),
                related_ids,
                token_estimate,
            });
        }
        Err(MemoryError::NotFound { id: id.to_string() }.into())
    }

    // --- chunk ---

    /// Resolve the full content behind an id and truncate it to fit the
    /// budget. A requested `[type: label]` header is charged against the
    /// budget before the content is fitted.
    pub fn chunk(
        &self,
        id: &str,
        max_tokens: usize,
        strategy: TruncationStrategy,
        include_header: bool,
    ) -> StrataResult<ChunkResult> {
        let (label, source_type, full) = self.resolve_content(id)?;
        if let Some(session_id) = &self.session_id {
            if self.registry.get(id).is_some() {
                self.registry
                    .record_access(id, session_id, AccessOperation::Chunk);
            }
        }

        let header = if include_header {
            Some(format!("[{}: {}]\n", source_type.label(), label))
        } else {
            None
        };
        let header_cost = header
            .as_ref()
            .map(|h| self.counter.count_cached(h))
            .unwrap_or(0);
        let mut content_budget = max_tokens.saturating_sub(header_cost);

        let assemble = |fitted: &str| match &header {
            Some(h) => format!("{h}{fitted}"),
            None => fitted.to_string(),
        };
        let mut fitted = truncate_to_fit(&full, content_budget, strategy, self.counter);
        let mut content = assemble(&fitted);
        // Tokens can merge across the header seam; shave the content fit
        // until the assembled text measures within budget.
        while self.counter.count(&content) > max_tokens && content_budget > 0 {
            content_budget -= 1;
            fitted = truncate_to_fit(&full, content_budget, strategy, self.counter);
            content = assemble(&fitted);
        }
        let truncated = fitted != full;
        let token_count = self.counter.count_cached(&content);

        Ok(ChunkResult {
            id: id.to_string(),
            content,
            token_count,
            truncated,
        })
    }

    // --- context building ---

    /// A fresh context window sized for this retriever's output.
    pub fn create_context(
        &self,
        max_tokens: usize,
        reserved_for_response: usize,
    ) -> StrataResult<ContextWindow> {
        ContextWindow::new(max_tokens, reserved_for_response)
    }

    /// Best-effort add: resolve `id` and place its content in the window
    /// as a retrieved section. Returns `false` when it does not fit;
    /// unknown ids are still errors.
    pub fn add_to_context(
        &self,
        window: &mut ContextWindow,
        id: &str,
        priority: i32,
    ) -> StrataResult<bool> {
        let (label, source_type, full) = self.resolve_content(id)?;
        let content = format!("[{}: {}]\n{}", source_type.label(), label, full);
        let section =
            ContextSection::new(id, SectionType::Retrieved, content).with_priority(priority);
        match window.add_section(section, self.counter) {
            Ok(_) => Ok(true),
            Err(StrataError::Context(_)) => Ok(false),
            Err(other) => Err(other),
        }
    }

    /// Serialize the final composition.
    pub fn compose_context(&self, window: &ContextWindow) -> String {
        window.compose()
    }

    // --- internals ---

    fn gather_candidates(&self, options: &SearchOptions) -> Vec<SearchResult> {
        let wants = |source_type: SourceType| {
            options
                .source_types
                .as_ref()
                .map_or(true, |ts| ts.contains(&source_type))
        };

        let mut results = Vec::new();
        if wants(SourceType::ThreadSummary) {
            for thread in self.summaries.all_threads() {
                let text = thread.to_text();
                let relevance = self.scorer.score(&text, &options.query);
                results.push(self.make_result(
                    thread.id,
                    ResultOrigin::ThreadSummary,
                    SourceType::ThreadSummary,
                    thread.title,
                    text,
                    relevance,
                    DEFAULT_IMPORTANCE,
                    thread.token_count,
                ));
            }
        }
        if wants(SourceType::PlanSummary) {
            for plan in self.summaries.all_plans() {
                let text = plan.to_text();
                let relevance = self.scorer.score(&text, &options.query);
                results.push(self.make_result(
                    plan.id,
                    ResultOrigin::PlanSummary,
                    SourceType::PlanSummary,
                    plan.objective.clone(),
                    text,
                    relevance,
                    DEFAULT_IMPORTANCE,
                    plan.token_count,
                ));
            }
        }
        for reference in self.registry.all() {
            if wants(reference.reference_type) {
                results.push(self.reference_result(&reference, &options.query));
            }
        }
        results
    }

    fn reference_result(
        &self,
        reference: &strata_core::models::reference::Reference,
        query: &str,
    ) -> SearchResult {
        let text = self.reference_text(reference);
        let relevance = self.scorer.score(&text, query);
        let token_count = reference
            .span_pointer
            .as_ref()
            .map(|p| p.token_estimate)
            .unwrap_or_else(|| self.counter.count_cached(&text));
        self.make_result(
            reference.id.clone(),
            ResultOrigin::Reference,
            reference.reference_type,
            reference.label.clone(),
            text,
            relevance,
            reference.importance.unwrap_or(DEFAULT_IMPORTANCE),
            token_count,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn make_result(
        &self,
        id: String,
        origin: ResultOrigin,
        source_type: SourceType,
        label: String,
        text: String,
        relevance: f64,
        importance: f64,
        token_count: usize,
    ) -> SearchResult {
        let combined_score = self.config.relevance_weight * relevance
            + self.config.importance_weight * importance;
        SearchResult {
            id,
            origin,
            source_type,
            label,
            text,
            relevance,
            importance,
            combined_score,
            token_count,
        }
    }

    fn reference_text(&self, reference: &strata_core::models::reference::Reference) -> String {
        match &reference.description {
            Some(description) => format!("{} {}", reference.label, description),
            None => reference.label.clone(),
        }
    }

    /// Full content behind an id: summary text forms, or span-backed
    /// reference content (overlap-aware reconstruction).
    fn resolve_content(&self, id: &str) -> StrataResult<(String, SourceType, String)> {
        if let Some(thread) = self.summaries.get_thread(id) {
            return Ok((thread.title.clone(), SourceType::ThreadSummary, thread.to_text()));
        }
        if let Some(plan) = self.summaries.get_plan(id) {
            return Ok((plan.objective.clone(), SourceType::PlanSummary, plan.to_text()));
        }
        if let Some(reference) = self.registry.get(id) {
            if let Some(pointer) = &reference.span_pointer {
                let content = self.spans.get_content(&pointer.span_id)?;
                return Ok((reference.label.clone(), reference.reference_type, content));
            }
            if let Some(content) = self.reconstruct_source(&reference.target_id)? {
                return Ok((reference.label.clone(), reference.reference_type, content));
            }
            if let Some(description) = &reference.description {
                return Ok((
                    reference.label.clone(),
                    reference.reference_type,
                    description.clone(),
                ));
            }
            return Err(MemoryError::NoContent { id: id.to_string() }.into());
        }
        Err(MemoryError::NotFound { id: id.to_string() }.into())
    }

    /// Stitch a source's current spans back into contiguous text, using
    /// byte ranges to drop the overlapped prefixes. Integrity failures on
    /// any span surface to the caller.
    fn reconstruct_source(&self, source_id: &str) -> StrataResult<Option<String>> {
        let mut spans = self.spans.spans_for_source(source_id);
        if spans.is_empty() {
            return Ok(None);
        }
        spans.sort_by_key(|s| s.start_byte);

        let mut out = String::new();
        let mut covered_to = 0usize;
        for span in spans {
            if span.end_byte <= covered_to {
                continue;
            }
            let content = self.spans.get_content(&span.id)?;
            let skip = covered_to.saturating_sub(span.start_byte);
            out.push_str(&content[skip..]);
            covered_to = span.end_byte;
        }
        Ok(Some(out))
    }
}
