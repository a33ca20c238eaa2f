use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The closed set of link kinds between references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkType {
    ParentOf,
    ChildOf,
    Supersedes,
    DerivedFrom,
    RelatedTo,
    Mentions,
}

impl LinkType {
    /// Total number of link types.
    pub const COUNT: usize = 6;

    /// All variants for iteration.
    pub const ALL: [LinkType; 6] = [
        Self::ParentOf,
        Self::ChildOf,
        Self::Supersedes,
        Self::DerivedFrom,
        Self::RelatedTo,
        Self::Mentions,
    ];

    /// Semantic inverse used when a bidirectional link is created.
    /// Hierarchical and supersession pairs invert; the rest are symmetric.
    pub fn inverse(&self) -> LinkType {
        match self {
            Self::ParentOf => Self::ChildOf,
            Self::ChildOf => Self::ParentOf,
            Self::Supersedes => Self::DerivedFrom,
            Self::DerivedFrom => Self::Supersedes,
            Self::RelatedTo => Self::RelatedTo,
            Self::Mentions => Self::Mentions,
        }
    }
}

/// A directed edge between two references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceLink {
    pub source_id: String,
    pub target_id: String,
    pub link_type: LinkType,
    /// Free-form edge annotations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Pointer from a reference into stored span content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanPointer {
    pub span_id: String,
    pub start_byte: usize,
    pub end_byte: usize,
    pub token_estimate: usize,
}

/// A lightweight pointer-plus-metadata record for a content item,
/// distinct from the content itself. Versioned: updates append new
/// references chained through `previous_version_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reference {
    /// UUID v4 identifier.
    pub id: String,
    /// Tenant that owns this reference.
    pub client_id: String,
    /// Kind of content this reference points at.
    pub reference_type: super::span::SourceType,
    /// Identifier of the pointed-at content item.
    pub target_id: String,
    /// Short human-readable label.
    pub label: String,
    /// Longer description, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Importance weight in [0, 1].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<f64>,
    /// Pointer into stored span content, if the content is span-backed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span_pointer: Option<SpanPointer>,
    /// Position in the version chain, starting at 1.
    pub version: u32,
    /// Previous version in the chain, `None` at the chain root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_version_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reference {
    pub fn new(
        client_id: impl Into<String>,
        reference_type: super::span::SourceType,
        target_id: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            client_id: client_id.into(),
            reference_type,
            target_id: target_id.into(),
            label: label.into(),
            description: None,
            importance: None,
            span_pointer: None,
            version: 1,
            previous_version_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Identity equality: two references are equal if they have the same ID.
impl PartialEq for Reference {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Reference {}
