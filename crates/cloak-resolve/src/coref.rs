//! Coreference expansion — attach coreferent mentions to entity groups.
//!
//! The resolver itself is an external collaborator behind
//! [`CoreferenceResolver`]; [`PronounCoref`] is the built-in rule-based
//! reference implementation (nearest preceding antecedent).

use std::ops::Range;

use cloak_core::Result;
use cloak_detect::{EntityKind, Span};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::group::EntityGroup;

/// A set of mention offset ranges judged to refer to the same entity.
#[derive(Debug, Clone, Serialize)]
pub struct CorefCluster {
    pub mentions: Vec<Range<usize>>,
}

/// Narrow interface to the coreference collaborator.
pub trait CoreferenceResolver: Send + Sync {
    fn resolve(&self, text: &str) -> Result<Vec<CorefCluster>>;
}

static MENTION_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z][a-z]+(?:\s+[A-Z][a-z]+)+\b").unwrap());
static PRONOUN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:he|she|they|him|her|his|hers|them|their|it|its)\b").unwrap()
});

/// Rule-based resolver: every pronoun corefers with the nearest preceding
/// multi-word capitalized mention; repeated surface forms share a cluster.
pub struct PronounCoref;

impl PronounCoref {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PronounCoref {
    fn default() -> Self {
        Self::new()
    }
}

impl CoreferenceResolver for PronounCoref {
    fn resolve(&self, text: &str) -> Result<Vec<CorefCluster>> {
        let names: Vec<(Range<usize>, String)> = MENTION_NAME_RE
            .find_iter(text)
            .map(|m| (m.start()..m.end(), m.as_str().to_lowercase()))
            .collect();

        // One cluster per distinct surface form, seeded with every
        // occurrence of it.
        let mut order: Vec<String> = Vec::new();
        let mut clusters: Vec<Vec<Range<usize>>> = Vec::new();
        for (range, key) in &names {
            match order.iter().position(|k| k == key) {
                Some(at) => clusters[at].push(range.clone()),
                None => {
                    order.push(key.clone());
                    clusters.push(vec![range.clone()]);
                }
            }
        }

        for m in PRONOUN_RE.find_iter(text) {
            // Nearest antecedent that ends before the pronoun.
            let antecedent = names
                .iter()
                .filter(|(range, _)| range.end <= m.start())
                .max_by_key(|(range, _)| range.end);
            if let Some((_, key)) = antecedent {
                if let Some(at) = order.iter().position(|k| k == key) {
                    clusters[at].push(m.start()..m.end());
                }
            }
        }

        Ok(clusters
            .into_iter()
            .map(|mut mentions| {
                mentions.sort_by_key(|r| r.start);
                CorefCluster { mentions }
            })
            .filter(|c| c.mentions.len() > 1)
            .collect())
    }
}

/// Expand clusters onto resolved groups: a cluster anchored by a person
/// or org group donates its remaining mentions to that group. Mentions
/// already covered by any group keep their merge-engine assignment;
/// clusters with no anchor are ignored.
pub fn expand_coreferences(
    document: &str,
    groups: &mut [EntityGroup],
    clusters: &[CorefCluster],
) {
    let mut attached = 0usize;
    for cluster in clusters {
        let anchor = cluster.mentions.iter().find_map(|mention| {
            groups.iter().position(|g| {
                matches!(g.kind, EntityKind::PersonName | EntityKind::Org)
                    && g.covers(mention.start, mention.end)
            })
        });
        let Some(group_idx) = anchor else {
            continue;
        };

        for mention in &cluster.mentions {
            if mention.start >= mention.end
                || mention.end > document.len()
                || !document.is_char_boundary(mention.start)
                || !document.is_char_boundary(mention.end)
            {
                warn!("skipping invalid coref mention {}..{}", mention.start, mention.end);
                continue;
            }
            if groups.iter().any(|g| g.covers(mention.start, mention.end)) {
                continue;
            }
            let template = groups[group_idx].members[0].clone();
            let group = &mut groups[group_idx];
            group.add_member(Span::new(
                mention.start,
                mention.end,
                &document[mention.start..mention.end],
                group.kind,
                template.confidence,
                template.detector,
            ));
            attached += 1;
        }
    }
    if attached > 0 {
        debug!("coreference expansion attached {} mentions", attached);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::group_entities;
    use cloak_detect::DetectorId;

    fn span_at(document: &str, text: &str, kind: EntityKind) -> Span {
        let start = document.find(text).unwrap();
        Span::new(start, start + text.len(), text, kind, 0.8, DetectorId::Ner)
    }

    #[test]
    fn test_pronoun_links_to_nearest_name() {
        let text = "John Doe joined. He signed the form.";
        let clusters = PronounCoref::new().resolve(text).unwrap();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].mentions.len(), 2);
        assert_eq!(&text[clusters[0].mentions[0].clone()], "John Doe");
        assert_eq!(&text[clusters[0].mentions[1].clone()], "He");
    }

    #[test]
    fn test_repeated_name_shares_cluster() {
        let text = "Jane Roe called. Then again Jane Roe wrote.";
        let clusters = PronounCoref::new().resolve(text).unwrap();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].mentions.len(), 2);
    }

    #[test]
    fn test_no_antecedent_no_cluster() {
        let text = "He arrived early.";
        let clusters = PronounCoref::new().resolve(text).unwrap();
        assert!(clusters.is_empty());
    }

    #[test]
    fn test_expansion_attaches_pronoun() {
        let doc = "John Doe joined. He signed the form.";
        let mut groups =
            group_entities(vec![span_at(doc, "John Doe", EntityKind::PersonName)]);
        let clusters = PronounCoref::new().resolve(doc).unwrap();
        expand_coreferences(doc, &mut groups, &clusters);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].members.len(), 2);
        assert_eq!(groups[0].members[1].text, "He");
        assert_eq!(groups[0].members[1].kind, EntityKind::PersonName);
    }

    #[test]
    fn test_cluster_without_matching_group_ignored() {
        let doc = "Big Bend is far. It is hot.";
        // Location groups do not anchor coreference expansion.
        let mut groups = group_entities(vec![span_at(doc, "Big Bend", EntityKind::Location)]);
        let clusters = PronounCoref::new().resolve(doc).unwrap();
        expand_coreferences(doc, &mut groups, &clusters);
        assert_eq!(groups[0].members.len(), 1);
    }

    #[test]
    fn test_mention_covered_elsewhere_not_stolen() {
        let doc = "Acme Corp grew. It hired Jane Roe.";
        let mut groups = group_entities(vec![
            span_at(doc, "Acme Corp", EntityKind::Org),
            span_at(doc, "Jane Roe", EntityKind::PersonName),
        ]);
        let clusters = PronounCoref::new().resolve(doc).unwrap();
        expand_coreferences(doc, &mut groups, &clusters);

        // "It" goes to the org; "Jane Roe" stays its own group.
        assert_eq!(groups[0].members.len(), 2);
        assert_eq!(groups[1].members.len(), 1);
    }
}
