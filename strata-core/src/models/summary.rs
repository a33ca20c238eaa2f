use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Versioned condensed projection of a conversation thread.
///
/// `token_count` is recomputed from the serialized text form on every
/// mutation; `version` increments on every update. No historical snapshot
/// is retained here; history is modeled via references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadSummary {
    pub id: String,
    pub client_id: String,
    pub thread_id: String,
    pub title: String,
    pub summary: String,
    pub key_points: Vec<String>,
    pub token_count: usize,
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ThreadSummary {
    pub fn new(
        client_id: impl Into<String>,
        thread_id: impl Into<String>,
        title: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            client_id: client_id.into(),
            thread_id: thread_id.into(),
            title: title.into(),
            summary: summary.into(),
            key_points: Vec::new(),
            token_count: 0,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Serialized text form, the basis for token accounting and span
    /// serialization.
    pub fn to_text(&self) -> String {
        let mut text = format!("{}\n{}", self.title, self.summary);
        for point in &self.key_points {
            text.push_str("\n- ");
            text.push_str(point);
        }
        text
    }
}

/// Versioned condensed projection of an execution plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub id: String,
    pub client_id: String,
    pub plan_id: String,
    pub objective: String,
    pub steps: Vec<String>,
    pub token_count: usize,
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PlanSummary {
    pub fn new(
        client_id: impl Into<String>,
        plan_id: impl Into<String>,
        objective: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            client_id: client_id.into(),
            plan_id: plan_id.into(),
            objective: objective.into(),
            steps: Vec::new(),
            token_count: 0,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Serialized text form, the basis for token accounting and span
    /// serialization.
    pub fn to_text(&self) -> String {
        let mut text = self.objective.clone();
        for (i, step) in self.steps.iter().enumerate() {
            text.push_str(&format!("\n{}. {}", i + 1, step));
        }
        text
    }
}
