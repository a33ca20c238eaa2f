use serde::{Deserialize, Serialize};

/// The closed set of section kinds a context window holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    System,
    Retrieved,
    Instruction,
    ToolResult,
    Conversation,
}

impl SectionType {
    /// Header label used by `compose` when headers are enabled.
    pub fn label(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Retrieved => "retrieved",
            Self::Instruction => "instruction",
            Self::ToolResult => "tool_result",
            Self::Conversation => "conversation",
        }
    }
}

/// One prioritized block of content inside a context window.
///
/// A section lives inside exactly one window; re-adding the same id
/// replaces the previous section and adjusts token accounting by the delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSection {
    pub id: String,
    pub section_type: SectionType,
    pub content: String,
    /// Higher priority composes earlier and survives eviction longer.
    pub priority: i32,
    /// Token cost. Zero means "let the window count it".
    pub token_count: usize,
    /// When set, adding this section may evict strictly-lower-priority
    /// sections to make room.
    pub evict_lower_priority: bool,
}

impl ContextSection {
    pub fn new(id: impl Into<String>, section_type: SectionType, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            section_type,
            content: content.into(),
            priority: 0,
            token_count: 0,
            evict_lower_priority: false,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_token_count(mut self, token_count: usize) -> Self {
        self.token_count = token_count;
        self
    }

    pub fn with_eviction(mut self) -> Self {
        self.evict_lower_priority = true;
        self
    }
}
