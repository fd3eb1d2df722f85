//! Per-request audit report — safe-to-log summary, never raw text.

use std::collections::HashMap;

use cloak_resolve::EntityGroup;
use serde::Serialize;

/// Summary of one anonymization run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AuditReport {
    /// Member-span counts per entity kind label.
    #[serde(rename = "spansByKind")]
    pub spans_by_kind: HashMap<String, usize>,
    #[serde(rename = "groupCount")]
    pub group_count: usize,
    #[serde(rename = "replacementCount")]
    pub replacement_count: usize,
    #[serde(rename = "durationMs")]
    pub duration_ms: u64,
}

impl AuditReport {
    pub fn from_groups(groups: &[EntityGroup], replacement_count: usize, duration_ms: u64) -> Self {
        let mut spans_by_kind: HashMap<String, usize> = HashMap::new();
        for group in groups {
            *spans_by_kind
                .entry(group.kind.label().to_string())
                .or_insert(0) += group.members.len();
        }
        Self {
            spans_by_kind,
            group_count: groups.len(),
            replacement_count,
            duration_ms,
        }
    }
}
