//! Anonymizer — offset-safe substitution of group replacements.

use std::collections::HashMap;

use cloak_core::{Error, Result};
use cloak_resolve::EntityGroup;
use serde::Serialize;
use tracing::debug;

/// Anonymized output: rewritten text plus the original→replacement map.
#[derive(Debug, Clone, Serialize)]
pub struct AnonymizedDocument {
    #[serde(rename = "anonymizedText")]
    pub text: String,
    pub mapping: HashMap<String, String>,
}

/// Substitute every member span of every group with its group's
/// replacement, in descending offset order so earlier substitutions never
/// invalidate later offsets.
///
/// All-or-nothing: a group without a mapping entry fails the whole
/// request rather than emit a partially anonymized document. Re-running
/// with the same groups and mapping is byte-identical.
pub fn anonymize(
    document: &str,
    groups: &[EntityGroup],
    mapping: &HashMap<String, String>,
) -> Result<AnonymizedDocument> {
    let mut substitutions: Vec<(usize, usize, &str)> = Vec::new();
    for group in groups {
        let replacement = mapping.get(&group.canonical_text).ok_or_else(|| {
            Error::Internal(format!(
                "no replacement assigned for group {:?}",
                group.canonical_text
            ))
        })?;
        for member in &group.members {
            substitutions.push((member.start, member.end, replacement));
        }
    }

    // Groups hold non-overlapping members, but be deterministic about
    // accidental duplicates across groups: keep the first claim.
    substitutions.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
    substitutions.dedup_by_key(|s| (s.0, s.1));

    let mut text = document.to_string();
    for (start, end, replacement) in substitutions.iter().rev() {
        text.replace_range(*start..*end, replacement);
    }

    debug!(
        "anonymized {} spans across {} groups",
        substitutions.len(),
        groups.len()
    );

    Ok(AnonymizedDocument {
        text,
        mapping: mapping.clone(),
    })
}
