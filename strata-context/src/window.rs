//! The context window: a token-bounded assembly of prioritized sections.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use strata_core::errors::{ContextError, StrataResult};
use strata_core::models::section::ContextSection;
use strata_tokens::TokenCounter;

/// Categories a window budget can be split across.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetCategory {
    System,
    Conversation,
    Retrieved,
    ToolResult,
    Instruction,
    Response,
}

/// Result of a successful `add_section`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddReport {
    /// Token cost charged for the section.
    pub token_count: usize,
    /// Ids evicted to make room, lowest priority first.
    pub evicted: Vec<String>,
    /// Whether the add replaced an existing section with the same id.
    pub replaced: bool,
}

/// Options for `compose_with_metadata`.
#[derive(Debug, Clone, Default)]
pub struct ComposeOptions {
    /// Prefix each section with a `[type]` header line.
    pub include_headers: bool,
    /// Explicit section id order. Unknown ids are skipped; omitted ids
    /// are excluded. `None` means descending priority.
    pub order: Option<Vec<String>>,
}

/// Per-section accounting in a composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionTokens {
    pub id: String,
    pub token_count: usize,
}

/// A composed prompt plus its accounting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composition {
    pub text: String,
    pub included: Vec<SectionTokens>,
    pub total_tokens: usize,
}

/// Serializable image of a window, the persistence extension point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextWindowSnapshot {
    pub max_tokens: usize,
    pub reserved_for_response: usize,
    pub sections: Vec<ContextSection>,
    pub allocations: HashMap<BudgetCategory, usize>,
}

/// A token-bounded window of prioritized sections. Sections keep
/// insertion order internally; composition orders by descending priority
/// with insertion order as the tie-break.
#[derive(Debug, Clone)]
pub struct ContextWindow {
    max_tokens: usize,
    reserved_for_response: usize,
    sections: Vec<ContextSection>,
    allocations: HashMap<BudgetCategory, usize>,
}

impl ContextWindow {
    pub fn new(max_tokens: usize, reserved_for_response: usize) -> StrataResult<Self> {
        if reserved_for_response > max_tokens {
            return Err(ContextError::ReservationTooLarge {
                reserved: reserved_for_response,
                max_tokens,
            }
            .into());
        }
        Ok(Self {
            max_tokens,
            reserved_for_response,
            sections: Vec::new(),
            allocations: HashMap::new(),
        })
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    /// Tokens currently held by sections.
    pub fn used_tokens(&self) -> usize {
        self.sections.iter().map(|s| s.token_count).sum()
    }

    /// Tokens still available for sections.
    pub fn available_tokens(&self) -> usize {
        self.max_tokens
            .saturating_sub(self.reserved_for_response)
            .saturating_sub(self.used_tokens())
    }

    pub fn section_ids(&self) -> Vec<String> {
        self.sections.iter().map(|s| s.id.clone()).collect()
    }

    pub fn get_section(&self, id: &str) -> Option<&ContextSection> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn remove_section(&mut self, id: &str) -> Option<ContextSection> {
        let idx = self.sections.iter().position(|s| s.id == id)?;
        Some(self.sections.remove(idx))
    }

    /// Add a section, or replace the section with the same id (token
    /// accounting adjusted by the delta).
    ///
    /// If the add does not fit and the section asks for eviction, the
    /// minimal set of strictly-lower-priority sections (lowest first) is
    /// evicted to cover the shortfall. Eviction is all-or-nothing: when no
    /// combination of lower-priority sections frees enough space, the
    /// window is left unchanged and the add fails.
    pub fn add_section(
        &mut self,
        mut section: ContextSection,
        counter: &TokenCounter,
    ) -> StrataResult<AddReport> {
        if section.token_count == 0 {
            section.token_count = counter.count_cached(&section.content);
        }

        let existing_idx = self.sections.iter().position(|s| s.id == section.id);
        let freed_by_replace = existing_idx
            .map(|i| self.sections[i].token_count)
            .unwrap_or(0);
        let available = self
            .max_tokens
            .saturating_sub(self.reserved_for_response)
            .saturating_sub(self.used_tokens() - freed_by_replace);

        let mut evicted_ids = Vec::new();
        if section.token_count > available {
            let shortfall = section.token_count - available;
            if !section.evict_lower_priority {
                return Err(ContextError::SectionTooLarge {
                    section_id: section.id,
                    needed: section.token_count,
                    available,
                }
                .into());
            }

            // Candidates: strictly lower priority, lowest first; insertion
            // order breaks ties. The replaced section is never a candidate.
            let mut candidates: Vec<(usize, i32, usize)> = self
                .sections
                .iter()
                .enumerate()
                .filter(|(i, s)| Some(*i) != existing_idx && s.priority < section.priority)
                .map(|(i, s)| (i, s.priority, s.token_count))
                .collect();
            candidates.sort_by_key(|&(i, priority, _)| (priority, i));

            let mut freed = 0usize;
            let mut chosen = Vec::new();
            for (idx, _, tokens) in candidates {
                if freed >= shortfall {
                    break;
                }
                freed += tokens;
                chosen.push(idx);
            }
            if freed < shortfall {
                return Err(ContextError::SectionTooLarge {
                    section_id: section.id,
                    needed: section.token_count,
                    available,
                }
                .into());
            }

            // Commit the eviction, highest index first so positions hold.
            chosen.sort_unstable_by(|a, b| b.cmp(a));
            for idx in chosen {
                let removed = self.sections.remove(idx);
                debug!(
                    section = %removed.id,
                    priority = removed.priority,
                    tokens = removed.token_count,
                    "evicted lower-priority section"
                );
                evicted_ids.push(removed.id);
            }
            evicted_ids.reverse();
        }

        // Replacement index may have shifted after eviction.
        let replaced = if let Some(idx) = self.sections.iter().position(|s| s.id == section.id) {
            self.sections[idx] = section.clone();
            true
        } else {
            self.sections.push(section.clone());
            false
        };

        Ok(AddReport {
            token_count: section.token_count,
            evicted: evicted_ids,
            replaced,
        })
    }

    /// Split `max_tokens` across named categories. Ratios summing above
    /// 1.01 are an error; allocations are floored token counts.
    pub fn allocate_budget(
        &mut self,
        ratios: &[(BudgetCategory, f64)],
    ) -> StrataResult<HashMap<BudgetCategory, usize>> {
        let total: f64 = ratios.iter().map(|(_, r)| r).sum();
        if total > 1.01 {
            return Err(ContextError::InvalidRatios { total }.into());
        }
        let mut allocations = HashMap::new();
        for &(category, ratio) in ratios {
            allocations.insert(category, (self.max_tokens as f64 * ratio).floor() as usize);
        }
        self.allocations = allocations.clone();
        Ok(allocations)
    }

    pub fn allocation(&self, category: BudgetCategory) -> Option<usize> {
        self.allocations.get(&category).copied()
    }

    /// Concatenate sections by descending priority.
    pub fn compose(&self) -> String {
        self.compose_with_metadata(&ComposeOptions::default()).text
    }

    /// Compose with per-section accounting, optional headers, and an
    /// optional explicit order.
    pub fn compose_with_metadata(&self, options: &ComposeOptions) -> Composition {
        let ordered: Vec<&ContextSection> = match &options.order {
            Some(ids) => ids
                .iter()
                .filter_map(|id| self.sections.iter().find(|s| s.id == *id))
                .collect(),
            None => {
                let mut sections: Vec<&ContextSection> = self.sections.iter().collect();
                // Stable sort: insertion order breaks priority ties.
                sections.sort_by_key(|s| std::cmp::Reverse(s.priority));
                sections
            }
        };

        let mut parts = Vec::with_capacity(ordered.len());
        let mut included = Vec::with_capacity(ordered.len());
        let mut total_tokens = 0;
        for section in ordered {
            let text = if options.include_headers {
                format!("[{}]\n{}", section.section_type.label(), section.content)
            } else {
                section.content.clone()
            };
            parts.push(text);
            total_tokens += section.token_count;
            included.push(SectionTokens {
                id: section.id.clone(),
                token_count: section.token_count,
            });
        }

        Composition {
            text: parts.join("\n\n"),
            included,
            total_tokens,
        }
    }

    pub fn snapshot(&self) -> ContextWindowSnapshot {
        ContextWindowSnapshot {
            max_tokens: self.max_tokens,
            reserved_for_response: self.reserved_for_response,
            sections: self.sections.clone(),
            allocations: self.allocations.clone(),
        }
    }

    pub fn restore(snapshot: ContextWindowSnapshot) -> Self {
        Self {
            max_tokens: snapshot.max_tokens,
            reserved_for_response: snapshot.reserved_for_response,
            sections: snapshot.sections,
            allocations: snapshot.allocations,
        }
    }
}
