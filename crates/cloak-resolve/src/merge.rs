//! Merge engine — priority-based interval resolution over detector output.

use cloak_detect::Span;
use cloak_core::Result;
use tracing::debug;

/// Policy knobs for the merge engine.
#[derive(Debug, Clone)]
pub struct MergePolicy {
    /// Join two adjacent name spans of identical kind separated by exactly
    /// one space ("John" + "Doe"). Off by default: adjoining spans are
    /// never concatenated otherwise.
    pub merge_adjacent_names: bool,
    /// Truncated fragments shorter than this are dropped instead of
    /// re-queued.
    pub min_fragment_len: usize,
}

impl Default for MergePolicy {
    fn default() -> Self {
        Self {
            merge_adjacent_names: false,
            min_fragment_len: 2,
        }
    }
}

/// Resolves the unioned, possibly-overlapping spans from all detectors
/// into a single non-overlapping, start-ordered sequence.
pub struct MergeEngine {
    policy: MergePolicy,
}

impl MergeEngine {
    pub fn new(policy: MergePolicy) -> Self {
        Self { policy }
    }

    /// Merge `spans` detected over `document`.
    ///
    /// Overlaps resolve by: specificity rank, then confidence, then span
    /// length, then detector precedence. A loser fully contained in the
    /// winner is discarded; a partial overlap is truncated to its
    /// remainder and re-queued.
    pub fn merge(&self, document: &str, spans: Vec<Span>) -> Result<Vec<Span>> {
        for span in &spans {
            span.validate(document)?;
        }

        let input_len = spans.len();
        let mut pending = spans;
        pending.sort_by(compare_pending);

        let mut resolved: Vec<Span> = Vec::new();
        while !pending.is_empty() {
            let candidate = pending.remove(0);
            let mut discarded = false;

            while let Some(idx) = resolved.iter().position(|r| r.overlaps(&candidate)) {
                if beats(&candidate, &resolved[idx]) {
                    let incumbent = resolved.remove(idx);
                    self.requeue_remainders(&mut pending, document, &incumbent, &candidate);
                } else {
                    let winner = resolved[idx].clone();
                    self.requeue_remainders(&mut pending, document, &candidate, &winner);
                    discarded = true;
                    break;
                }
            }

            if !discarded {
                let at = resolved
                    .binary_search_by(|r| r.start.cmp(&candidate.start))
                    .unwrap_or_else(|e| e);
                resolved.insert(at, candidate);
            }
        }

        if self.policy.merge_adjacent_names {
            resolved = join_adjacent_names(document, resolved);
        }

        debug!("merged {} raw spans into {}", input_len, resolved.len());
        Ok(resolved)
    }

    /// Queue the non-overlapping remainders of `loser` relative to
    /// `winner` for re-comparison. Remainders below the minimum viable
    /// length are dropped.
    fn requeue_remainders(
        &self,
        pending: &mut Vec<Span>,
        document: &str,
        loser: &Span,
        winner: &Span,
    ) {
        let mut remainders = Vec::new();
        if loser.start < winner.start {
            remainders.push((loser.start, winner.start));
        }
        if loser.end > winner.end {
            remainders.push((winner.end, loser.end));
        }

        for (start, end) in remainders {
            // Shrink the remainder past any whitespace the cut exposed.
            let slice = &document[start..end];
            let start = start + (slice.len() - slice.trim_start().len());
            let end = end - (slice.len() - slice.trim_end().len());
            if end <= start || end - start < self.policy.min_fragment_len {
                continue;
            }
            let mut fragment = loser.clone();
            fragment.start = start;
            fragment.end = end;
            fragment.text = document[start..end].to_string();
            let at = pending
                .binary_search_by(|p| compare_pending(p, &fragment))
                .unwrap_or_else(|e| e);
            pending.insert(at, fragment);
        }
    }
}

/// Processing order: by start, longer first, then deterministic tail.
fn compare_pending(a: &Span, b: &Span) -> std::cmp::Ordering {
    a.start
        .cmp(&b.start)
        .then(b.len().cmp(&a.len()))
        .then(b.detector.precedence().cmp(&a.detector.precedence()))
}

/// Whether `candidate` wins an overlap against `incumbent`.
fn beats(candidate: &Span, incumbent: &Span) -> bool {
    let by_rank = candidate
        .kind
        .specificity()
        .cmp(&incumbent.kind.specificity());
    let by_confidence = candidate
        .confidence
        .partial_cmp(&incumbent.confidence)
        .unwrap_or(std::cmp::Ordering::Equal);
    let by_len = candidate.len().cmp(&incumbent.len());
    let by_detector = candidate
        .detector
        .precedence()
        .cmp(&incumbent.detector.precedence());

    by_rank
        .then(by_confidence)
        .then(by_len)
        .then(by_detector)
        .is_gt()
}

/// Join runs of same-kind rank-1 name spans separated by a single space.
fn join_adjacent_names(document: &str, spans: Vec<Span>) -> Vec<Span> {
    let mut joined: Vec<Span> = Vec::new();
    for span in spans {
        if let Some(last) = joined.last_mut() {
            let joinable = last.kind == span.kind
                && last.kind.specificity() == 1
                && span.start == last.end + 1
                && &document[last.end..span.start] == " ";
            if joinable {
                last.end = span.end;
                last.text = document[last.start..last.end].to_string();
                last.confidence = last.confidence.max(span.confidence);
                if span.detector.precedence() > last.detector.precedence() {
                    last.detector = span.detector;
                }
                continue;
            }
        }
        joined.push(span);
    }
    joined
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloak_detect::{DetectorId, EntityKind, Span};

    fn merge(document: &str, spans: Vec<Span>) -> Vec<Span> {
        MergeEngine::new(MergePolicy::default())
            .merge(document, spans)
            .unwrap()
    }

    fn span_at(
        document: &str,
        text: &str,
        kind: EntityKind,
        confidence: f64,
        detector: DetectorId,
    ) -> Span {
        let start = document.find(text).unwrap();
        Span::new(start, start + text.len(), text, kind, confidence, detector)
    }

    fn assert_non_overlapping_sorted(spans: &[Span]) {
        for pair in spans.windows(2) {
            assert!(pair[0].start <= pair[1].start);
            assert!(!pair[0].overlaps(&pair[1]));
        }
    }

    #[test]
    fn test_zero_length_span_rejected() {
        let doc = "hello";
        let bad = Span::new(2, 2, "", EntityKind::Email, 1.0, DetectorId::Pattern);
        let result = MergeEngine::new(MergePolicy::default()).merge(doc, vec![bad]);
        assert!(result.is_err());
    }

    #[test]
    fn test_card_detection_beats_id_heuristic() {
        let doc = "card 4111 1111 1111 1111 ok";
        let card = span_at(doc, "4111 1111 1111 1111", EntityKind::CreditCard, 1.0, DetectorId::SpecializedPii);
        let id = span_at(doc, "4111 1111 1111 1111", EntityKind::IdNumber, 0.5, DetectorId::Ner);
        // IdNumber and CreditCard share rank 2 — confidence decides here.
        let merged = merge(doc, vec![id, card]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].kind, EntityKind::CreditCard);
        assert_non_overlapping_sorted(&merged);
    }

    #[test]
    fn test_structured_outranks_named() {
        let doc = "mail john@example.com now";
        let email = span_at(doc, "john@example.com", EntityKind::Email, 0.7, DetectorId::Pattern);
        let person = span_at(doc, "john@example.com", EntityKind::PersonName, 0.95, DetectorId::Ner);
        let merged = merge(doc, vec![person, email]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].kind, EntityKind::Email);
    }

    #[test]
    fn test_contained_loser_discarded() {
        let doc = "visit New York City today";
        let city = span_at(doc, "New York City", EntityKind::Location, 0.8, DetectorId::Ner);
        let partial = span_at(doc, "New York", EntityKind::Location, 0.8, DetectorId::Ner);
        let merged = merge(doc, vec![partial, city]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].text, "New York City");
    }

    #[test]
    fn test_contained_digit_run_discarded() {
        let doc = "ab 12345 Main Street xy";
        // The digit run is contained in the winning address span.
        let address = span_at(doc, "12345 Main Street", EntityKind::Address, 0.6, DetectorId::Pattern);
        let run = span_at(doc, "12345", EntityKind::IdNumber, 0.5, DetectorId::SpecializedPii);
        let merged = merge(doc, vec![run, address]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].kind, EntityKind::Address);
    }

    #[test]
    fn test_truncated_remainder_survives() {
        let doc = "id 775500 99 end";
        let long_id = span_at(doc, "775500 99", EntityKind::IdNumber, 0.5, DetectorId::Ner);
        let phone_ish = span_at(doc, "775500", EntityKind::Phone, 0.8, DetectorId::Pattern);
        let merged = merge(doc, vec![long_id, phone_ish]);
        // Phone wins its range; the id span is truncated to "99".
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].kind, EntityKind::Phone);
        assert_eq!(merged[1].text, "99");
        assert_eq!(merged[1].kind, EntityKind::IdNumber);
        assert_non_overlapping_sorted(&merged);
    }

    #[test]
    fn test_equal_everything_prefers_specialized_detector() {
        let doc = "num 1234-5678 end";
        let a = span_at(doc, "1234-5678", EntityKind::IdNumber, 0.5, DetectorId::Ner);
        let b = span_at(doc, "1234-5678", EntityKind::IdNumber, 0.5, DetectorId::SpecializedPii);
        let merged = merge(doc, vec![a, b]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].detector, DetectorId::SpecializedPii);
    }

    #[test]
    fn test_adjacent_spans_not_joined_by_default() {
        let doc = "John Doe";
        let first = span_at(doc, "John", EntityKind::PersonName, 0.7, DetectorId::Ner);
        let last = span_at(doc, "Doe", EntityKind::PersonName, 0.7, DetectorId::Ner);
        let merged = merge(doc, vec![first, last]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_adjacent_names_joined_when_enabled() {
        let doc = "John Doe";
        let first = span_at(doc, "John", EntityKind::PersonName, 0.7, DetectorId::Ner);
        let last = span_at(doc, "Doe", EntityKind::PersonName, 0.7, DetectorId::Ner);
        let policy = MergePolicy {
            merge_adjacent_names: true,
            ..MergePolicy::default()
        };
        let merged = MergeEngine::new(policy).merge(doc, vec![first, last]).unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].text, "John Doe");
    }

    #[test]
    fn test_join_requires_same_kind_and_single_space() {
        let doc = "Acme John  Doe";
        let org = span_at(doc, "Acme", EntityKind::Org, 0.8, DetectorId::Ner);
        let first = span_at(doc, "John", EntityKind::PersonName, 0.7, DetectorId::Ner);
        let last = span_at(doc, "Doe", EntityKind::PersonName, 0.7, DetectorId::Ner);
        let policy = MergePolicy {
            merge_adjacent_names: true,
            ..MergePolicy::default()
        };
        // Org/person differ in kind; the two-space gap blocks the names.
        let merged = MergeEngine::new(policy).merge(doc, vec![org, first, last]).unwrap();
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn test_output_sorted_non_overlapping() {
        let doc = "a@b.co 555-123-4567 John Doe at Acme Corp 2024-01-15";
        let spans = vec![
            span_at(doc, "a@b.co", EntityKind::Email, 1.0, DetectorId::Pattern),
            span_at(doc, "555-123-4567", EntityKind::Phone, 0.8, DetectorId::Pattern),
            span_at(doc, "John Doe", EntityKind::PersonName, 0.7, DetectorId::Ner),
            span_at(doc, "Acme Corp", EntityKind::Org, 0.8, DetectorId::Ner),
            span_at(doc, "2024-01-15", EntityKind::Date, 0.7, DetectorId::Pattern),
            span_at(doc, "123-4567", EntityKind::IdNumber, 0.5, DetectorId::SpecializedPii),
        ];
        let merged = merge(doc, spans);
        assert_non_overlapping_sorted(&merged);
    }
}
