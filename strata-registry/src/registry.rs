//! The reference registry: CRUD, links with derived inverses, version
//! chains, access stats. All structures are append-mostly DashMaps, so
//! cross-session reads need no extra locking.

use chrono::Utc;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use strata_core::errors::{MemoryError, StrataResult};
use strata_core::models::reference::{LinkType, Reference, ReferenceLink, SpanPointer};

use crate::access::{AccessOperation, AccessRecord, AccessStats};

/// Direction filter for link queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkDirection {
    Outgoing,
    Incoming,
    Both,
}

/// Options for `link`. Bidirectional by default: the inverse edge is
/// derived from the link type's semantic inverse.
#[derive(Debug, Clone)]
pub struct LinkOptions {
    pub bidirectional: bool,
    pub metadata: Option<serde_json::Value>,
}

impl Default for LinkOptions {
    fn default() -> Self {
        Self {
            bidirectional: true,
            metadata: None,
        }
    }
}

/// Filter for `linked`. With a `link_type` and no explicit direction the
/// query is outgoing-only; with neither, both directions are returned.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkQuery {
    pub direction: Option<LinkDirection>,
    pub link_type: Option<LinkType>,
}

/// One neighbor of a reference: the connecting edge plus the reference at
/// the other end.
#[derive(Debug, Clone)]
pub struct LinkedReference {
    pub link: ReferenceLink,
    pub reference: Reference,
}

/// Field updates applied by `update` and `create_version`. `None` leaves
/// the field as it was.
#[derive(Debug, Clone, Default)]
pub struct ReferenceChanges {
    pub label: Option<String>,
    pub description: Option<String>,
    pub importance: Option<f64>,
    pub span_pointer: Option<SpanPointer>,
    pub target_id: Option<String>,
}

impl ReferenceChanges {
    fn apply(&self, reference: &mut Reference) {
        if let Some(label) = &self.label {
            reference.label = label.clone();
        }
        if let Some(description) = &self.description {
            reference.description = Some(description.clone());
        }
        if let Some(importance) = self.importance {
            reference.importance = Some(importance);
        }
        if let Some(pointer) = &self.span_pointer {
            reference.span_pointer = Some(pointer.clone());
        }
        if let Some(target_id) = &self.target_id {
            reference.target_id = target_id.clone();
        }
    }
}

/// Serializable image of the registry, the persistence extension point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    references: Vec<Reference>,
    outgoing: Vec<(String, Vec<ReferenceLink>)>,
    incoming: Vec<(String, Vec<ReferenceLink>)>,
    successors: Vec<(String, String)>,
    access_log: Vec<(String, Vec<AccessRecord>)>,
}

/// Reference registry for one environment. Writes append; versioning
/// never rewrites an existing reference.
#[derive(Default)]
pub struct ReferenceRegistry {
    references: DashMap<String, Reference>,
    /// source_id → outgoing edges.
    outgoing: DashMap<String, Vec<ReferenceLink>>,
    /// target_id → incoming edges.
    incoming: DashMap<String, Vec<ReferenceLink>>,
    /// version id → id of the version that superseded it.
    successors: DashMap<String, String>,
    /// reference id → dereference records, in append order.
    access_log: DashMap<String, Vec<AccessRecord>>,
}

impl ReferenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // --- CRUD ---

    pub fn create(&self, reference: Reference) -> Reference {
        self.references
            .insert(reference.id.clone(), reference.clone());
        reference
    }

    pub fn get(&self, id: &str) -> Option<Reference> {
        self.references.get(id).map(|r| r.clone())
    }

    /// Apply field changes in place. Bumps `updated_at`, not `version`;
    /// versioned evolution goes through [`create_version`](Self::create_version).
    pub fn update(&self, id: &str, changes: &ReferenceChanges) -> StrataResult<Reference> {
        let mut entry = self
            .references
            .get_mut(id)
            .ok_or_else(|| MemoryError::NotFound { id: id.to_string() })?;
        changes.apply(&mut entry);
        entry.updated_at = Utc::now();
        Ok(entry.clone())
    }

    /// Remove a reference together with its incident links and access log.
    pub fn delete(&self, id: &str) -> Option<Reference> {
        let removed = self.references.remove(id).map(|(_, v)| v)?;
        self.access_log.remove(id);
        // Drop edges from both adjacency directions.
        if let Some((_, edges)) = self.outgoing.remove(id) {
            for edge in edges {
                if let Some(mut rev) = self.incoming.get_mut(&edge.target_id) {
                    rev.retain(|e| e.source_id != id);
                }
            }
        }
        if let Some((_, edges)) = self.incoming.remove(id) {
            for edge in edges {
                if let Some(mut fwd) = self.outgoing.get_mut(&edge.source_id) {
                    fwd.retain(|e| e.target_id != id);
                }
            }
        }
        Some(removed)
    }

    /// Every reference in the registry. Retrieval candidates.
    pub fn all(&self) -> Vec<Reference> {
        self.references.iter().map(|r| r.clone()).collect()
    }

    pub fn list_by_client(&self, client_id: &str) -> Vec<Reference> {
        self.references
            .iter()
            .filter(|r| r.client_id == client_id)
            .map(|r| r.clone())
            .collect()
    }

    pub fn list_by_type(
        &self,
        reference_type: strata_core::models::span::SourceType,
    ) -> Vec<Reference> {
        self.references
            .iter()
            .filter(|r| r.reference_type == reference_type)
            .map(|r| r.clone())
            .collect()
    }

    // --- Links ---

    /// Create a directed edge from `source_id` to `target_id`. Unless
    /// disabled, the semantic inverse edge is created as well.
    pub fn link(
        &self,
        source_id: &str,
        target_id: &str,
        link_type: LinkType,
        options: LinkOptions,
    ) -> StrataResult<()> {
        self.require(source_id)?;
        self.require(target_id)?;

        self.insert_edge(ReferenceLink {
            source_id: source_id.to_string(),
            target_id: target_id.to_string(),
            link_type,
            metadata: options.metadata.clone(),
        });

        if options.bidirectional {
            self.insert_edge(ReferenceLink {
                source_id: target_id.to_string(),
                target_id: source_id.to_string(),
                link_type: link_type.inverse(),
                metadata: options.metadata,
            });
        }
        Ok(())
    }

    /// Remove every edge between `a` and `b`, both directions.
    pub fn unlink(&self, a: &str, b: &str) {
        for (from, to) in [(a, b), (b, a)] {
            if let Some(mut edges) = self.outgoing.get_mut(from) {
                edges.retain(|e| e.target_id != to);
            }
            if let Some(mut edges) = self.incoming.get_mut(to) {
                edges.retain(|e| e.source_id != from);
            }
        }
    }

    /// Neighbors of `id`. A `link_type` filter without an explicit
    /// direction restricts the query to outgoing edges.
    pub fn linked(&self, id: &str, query: LinkQuery) -> Vec<LinkedReference> {
        let direction = query.direction.unwrap_or(if query.link_type.is_some() {
            LinkDirection::Outgoing
        } else {
            LinkDirection::Both
        });

        // A bidirectional link stores a forward edge and its derived
        // inverse; a Both query must report that neighbor once, so the
        // incoming pass skips edges whose outgoing twin was already
        // emitted.
        let mut emitted: std::collections::HashSet<(String, LinkType)> =
            std::collections::HashSet::new();
        let mut out = Vec::new();
        if matches!(direction, LinkDirection::Outgoing | LinkDirection::Both) {
            if let Some(edges) = self.outgoing.get(id) {
                for edge in edges.iter() {
                    if query.link_type.map_or(true, |t| t == edge.link_type) {
                        if let Some(reference) = self.get(&edge.target_id) {
                            emitted.insert((edge.target_id.clone(), edge.link_type));
                            out.push(LinkedReference {
                                link: edge.clone(),
                                reference,
                            });
                        }
                    }
                }
            }
        }
        if matches!(direction, LinkDirection::Incoming | LinkDirection::Both) {
            if let Some(edges) = self.incoming.get(id) {
                for edge in edges.iter() {
                    if query.link_type.map_or(true, |t| t == edge.link_type)
                        && !emitted.contains(&(edge.source_id.clone(), edge.link_type.inverse()))
                    {
                        if let Some(reference) = self.get(&edge.source_id) {
                            out.push(LinkedReference {
                                link: edge.clone(),
                                reference,
                            });
                        }
                    }
                }
            }
        }
        out
    }

    fn insert_edge(&self, edge: ReferenceLink) {
        // One edge per (source, target, type); re-linking refreshes metadata.
        let mut fwd = self.outgoing.entry(edge.source_id.clone()).or_default();
        fwd.retain(|e| !(e.target_id == edge.target_id && e.link_type == edge.link_type));
        fwd.push(edge.clone());
        drop(fwd);

        let mut rev = self.incoming.entry(edge.target_id.clone()).or_default();
        rev.retain(|e| !(e.source_id == edge.source_id && e.link_type == edge.link_type));
        rev.push(edge);
    }

    // --- Versioning ---

    /// Append a new version at the head of `id`'s chain. The given id may
    /// be any version in the chain; the new reference gets
    /// `version = head.version + 1` and a back-link to the prior head.
    pub fn create_version(&self, id: &str, changes: &ReferenceChanges) -> StrataResult<Reference> {
        self.require(id)?;
        let head_id = self.chain_head(id);
        let head = self
            .get(&head_id)
            .ok_or_else(|| MemoryError::NotFound { id: head_id.clone() })?;

        let mut next = head.clone();
        next.id = Uuid::new_v4().to_string();
        next.version = head.version + 1;
        next.previous_version_id = Some(head.id.clone());
        let now = Utc::now();
        next.created_at = now;
        next.updated_at = now;
        changes.apply(&mut next);

        self.references.insert(next.id.clone(), next.clone());
        self.successors.insert(head.id.clone(), next.id.clone());
        Ok(next)
    }

    /// The full version chain containing `id`, root first, in creation
    /// order with strictly increasing version numbers.
    pub fn version_history(&self, id: &str) -> StrataResult<Vec<Reference>> {
        self.require(id)?;
        let root_id = self.chain_root(id);
        let mut chain = Vec::new();
        let mut cursor = Some(root_id);
        while let Some(current) = cursor {
            match self.get(&current) {
                Some(reference) => {
                    cursor = self.successors.get(&current).map(|s| s.clone());
                    chain.push(reference);
                }
                None => break,
            }
        }
        Ok(chain)
    }

    fn chain_root(&self, id: &str) -> String {
        let mut current = id.to_string();
        while let Some(prev) = self
            .get(&current)
            .and_then(|r| r.previous_version_id.clone())
        {
            if !self.references.contains_key(&prev) {
                break;
            }
            current = prev;
        }
        current
    }

    fn chain_head(&self, id: &str) -> String {
        let mut current = id.to_string();
        while let Some(next) = self.successors.get(&current).map(|s| s.clone()) {
            current = next;
        }
        current
    }

    // --- Access tracking ---

    /// Record one dereference of `id`. Appends are ordered per session by
    /// the caller's own serialization; the registry just appends.
    pub fn record_access(&self, id: &str, session_id: &str, operation: AccessOperation) {
        self.access_log
            .entry(id.to_string())
            .or_default()
            .push(AccessRecord {
                session_id: session_id.to_string(),
                operation,
                at: Utc::now(),
            });
    }

    /// Aggregate access statistics for `id`. Zeroed stats for ids that
    /// were never dereferenced.
    pub fn access_stats(&self, id: &str) -> AccessStats {
        self.access_log
            .get(id)
            .map(|records| AccessStats::from_records(&records))
            .unwrap_or_else(|| AccessStats::from_records(&[]))
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    fn require(&self, id: &str) -> StrataResult<()> {
        if self.references.contains_key(id) {
            Ok(())
        } else {
            Err(MemoryError::NotFound { id: id.to_string() }.into())
        }
    }

    // --- Persistence hooks ---

    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            references: self.references.iter().map(|r| r.clone()).collect(),
            outgoing: self
                .outgoing
                .iter()
                .map(|e| (e.key().clone(), e.value().clone()))
                .collect(),
            incoming: self
                .incoming
                .iter()
                .map(|e| (e.key().clone(), e.value().clone()))
                .collect(),
            successors: self
                .successors
                .iter()
                .map(|e| (e.key().clone(), e.value().clone()))
                .collect(),
            access_log: self
                .access_log
                .iter()
                .map(|e| (e.key().clone(), e.value().clone()))
                .collect(),
        }
    }

    pub fn restore(&self, snapshot: RegistrySnapshot) {
        self.references.clear();
        self.outgoing.clear();
        self.incoming.clear();
        self.successors.clear();
        self.access_log.clear();
        for r in snapshot.references {
            self.references.insert(r.id.clone(), r);
        }
        for (k, v) in snapshot.outgoing {
            self.outgoing.insert(k, v);
        }
        for (k, v) in snapshot.incoming {
            self.incoming.insert(k, v);
        }
        for (k, v) in snapshot.successors {
            self.successors.insert(k, v);
        }
        for (k, v) in snapshot.access_log {
            self.access_log.insert(k, v);
        }
    }
}
