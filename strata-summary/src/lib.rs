//! # strata-summary
//!
//! Versioned condensed projections: thread summaries and plan summaries.
//! Token counts are recomputed from the serialized text form on every
//! mutation; versions bump on every update. Only the latest version lives
//! here; history is modeled via references.

use chrono::Utc;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use strata_core::models::span::{SourceType, Span, SpanMetadata};
use strata_core::models::summary::{PlanSummary, ThreadSummary};
use strata_core::StrataResult;
use strata_spans::SpanStore;
use strata_tokens::TokenCounter;

/// Serializable image of the store, the persistence extension point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryStoreSnapshot {
    threads: Vec<ThreadSummary>,
    plans: Vec<PlanSummary>,
}

/// In-memory store of the latest thread and plan summaries, keyed by id.
#[derive(Default)]
pub struct SummaryStore {
    threads: DashMap<String, ThreadSummary>,
    plans: DashMap<String, PlanSummary>,
}

impl SummaryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or update a thread summary. An update of an existing id
    /// bumps `version`; either way `token_count` is recomputed from
    /// `to_text()` and `updated_at` refreshed.
    pub fn upsert_thread(&self, mut summary: ThreadSummary, counter: &TokenCounter) -> ThreadSummary {
        if let Some(existing) = self.threads.get(&summary.id) {
            summary.version = existing.version + 1;
            summary.created_at = existing.created_at;
        }
        summary.token_count = counter.count_cached(&summary.to_text());
        summary.updated_at = Utc::now();
        self.threads.insert(summary.id.clone(), summary.clone());
        summary
    }

    /// Insert or update a plan summary. Same versioning and token
    /// accounting discipline as [`upsert_thread`](Self::upsert_thread).
    pub fn upsert_plan(&self, mut summary: PlanSummary, counter: &TokenCounter) -> PlanSummary {
        if let Some(existing) = self.plans.get(&summary.id) {
            summary.version = existing.version + 1;
            summary.created_at = existing.created_at;
        }
        summary.token_count = counter.count_cached(&summary.to_text());
        summary.updated_at = Utc::now();
        self.plans.insert(summary.id.clone(), summary.clone());
        summary
    }

    pub fn get_thread(&self, id: &str) -> Option<ThreadSummary> {
        self.threads.get(id).map(|s| s.clone())
    }

    pub fn get_plan(&self, id: &str) -> Option<PlanSummary> {
        self.plans.get(id).map(|s| s.clone())
    }

    /// Every latest thread summary. Retrieval candidates.
    pub fn all_threads(&self) -> Vec<ThreadSummary> {
        self.threads.iter().map(|e| e.clone()).collect()
    }

    /// Every latest plan summary. Retrieval candidates.
    pub fn all_plans(&self) -> Vec<PlanSummary> {
        self.plans.iter().map(|e| e.clone()).collect()
    }

    /// Latest thread summaries for one tenant.
    pub fn threads_for_client(&self, client_id: &str) -> Vec<ThreadSummary> {
        self.threads
            .iter()
            .filter(|e| e.client_id == client_id)
            .map(|e| e.clone())
            .collect()
    }

    /// Latest plan summaries for one tenant.
    pub fn plans_for_client(&self, client_id: &str) -> Vec<PlanSummary> {
        self.plans
            .iter()
            .filter(|e| e.client_id == client_id)
            .map(|e| e.clone())
            .collect()
    }

    pub fn remove_thread(&self, id: &str) -> Option<ThreadSummary> {
        self.threads.remove(id).map(|(_, v)| v)
    }

    pub fn remove_plan(&self, id: &str) -> Option<PlanSummary> {
        self.plans.remove(id).map(|(_, v)| v)
    }

    /// Serialize a thread summary's text form into the span store under
    /// its own id, so it becomes span-addressable retrieval content.
    pub fn thread_to_spans(
        &self,
        id: &str,
        store: &SpanStore,
        counter: &TokenCounter,
    ) -> StrataResult<Option<Vec<Span>>> {
        let Some(summary) = self.get_thread(id) else {
            return Ok(None);
        };
        let spans = store.write(
            SourceType::ThreadSummary,
            &summary.id,
            &summary.to_text(),
            SpanMetadata::default(),
            counter,
        )?;
        Ok(Some(spans))
    }

    /// Serialize a plan summary's text form into the span store.
    pub fn plan_to_spans(
        &self,
        id: &str,
        store: &SpanStore,
        counter: &TokenCounter,
    ) -> StrataResult<Option<Vec<Span>>> {
        let Some(summary) = self.get_plan(id) else {
            return Ok(None);
        };
        let spans = store.write(
            SourceType::PlanSummary,
            &summary.id,
            &summary.to_text(),
            SpanMetadata::default(),
            counter,
        )?;
        Ok(Some(spans))
    }

    pub fn snapshot(&self) -> SummaryStoreSnapshot {
        SummaryStoreSnapshot {
            threads: self.threads.iter().map(|e| e.clone()).collect(),
            plans: self.plans.iter().map(|e| e.clone()).collect(),
        }
    }

    pub fn restore(&self, snapshot: SummaryStoreSnapshot) {
        self.threads.clear();
        self.plans.clear();
        for t in snapshot.threads {
            self.threads.insert(t.id.clone(), t);
        }
        for p in snapshot.plans {
            self.plans.insert(p.id.clone(), p);
        }
    }
}
