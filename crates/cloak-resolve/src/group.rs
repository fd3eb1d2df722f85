//! Logical entity groups — one group per real-world entity.

use std::collections::HashMap;

use cloak_detect::{EntityKind, Span};
use serde::Serialize;

/// A cluster of spans representing one real-world entity. All members
/// share one replacement value.
#[derive(Debug, Clone, Serialize)]
pub struct EntityGroup {
    /// Surface form of the first occurrence.
    pub canonical_text: String,
    pub kind: EntityKind,
    /// Non-overlapping member spans, ordered by start offset.
    pub members: Vec<Span>,
}

impl EntityGroup {
    /// Insert a member keeping start order, ignoring exact duplicates.
    pub fn add_member(&mut self, span: Span) {
        if self
            .members
            .iter()
            .any(|m| m.start == span.start && m.end == span.end)
        {
            return;
        }
        let at = self
            .members
            .binary_search_by(|m| m.start.cmp(&span.start))
            .unwrap_or_else(|e| e);
        self.members.insert(at, span);
    }

    /// Whether any member overlaps the given offset range.
    pub fn covers(&self, start: usize, end: usize) -> bool {
        self.members.iter().any(|m| start < m.end && m.start < end)
    }
}

/// Fold resolved spans into groups keyed by kind and case-insensitive
/// surface text, preserving first-occurrence order.
pub fn group_entities(spans: Vec<Span>) -> Vec<EntityGroup> {
    let mut groups: Vec<EntityGroup> = Vec::new();
    let mut index: HashMap<(EntityKind, String), usize> = HashMap::new();

    for span in spans {
        let key = (span.kind, span.text.to_lowercase());
        match index.get(&key) {
            Some(&at) => groups[at].add_member(span),
            None => {
                index.insert(key, groups.len());
                groups.push(EntityGroup {
                    canonical_text: span.text.clone(),
                    kind: span.kind,
                    members: vec![span],
                });
            }
        }
    }

    groups
}
