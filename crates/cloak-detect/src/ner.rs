//! Heuristic NER — capitalization and context rules for named entities.
//!
//! Stands in for a model NER backend behind the same [`Detector`] trait:
//! a model-backed implementation can replace it without touching the
//! merge engine. Confidence reflects rule strength, not model scores.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use cloak_core::Result;

use crate::detector::Detector;
use crate::span::{DetectorId, EntityKind, Span};

static ORG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Z][a-z]+(?:\s+[A-Z][a-z]+)*\s+(?:Inc|Corp|Corporation|LLC|Ltd|Co|Company|Holdings|Labs)\b")
        .unwrap()
});
static HONORIFIC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:Mr|Mrs|Ms|Dr|Prof)\.?\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)?)\b").unwrap()
});
static LOCATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:in|at|from|near)\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+){0,2})\b").unwrap()
});
static NAME_PAIR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z][a-z]+\s+[A-Z][a-z]+\b").unwrap());
static WRITTEN_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{1,2}(?:,\s*\d{4})?\b")
        .unwrap()
});
static TIME_AMPM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{1,2}\s*(?:AM|PM|am|pm)\b").unwrap());

// Capitalized sentence openers that a bare two-word match must not treat
// as a first name.
const NON_NAME_OPENERS: &[&str] = &[
    "The", "This", "That", "These", "Those", "There", "Then", "They", "When", "Where", "What",
    "Why", "How", "Who", "While", "After", "Before", "Please", "Dear", "Hello",
];

/// Heuristic named-entity detector (person, org, location, date, time).
pub struct HeuristicNerDetector;

impl HeuristicNerDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HeuristicNerDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for HeuristicNerDetector {
    fn id(&self) -> DetectorId {
        DetectorId::Ner
    }

    fn detect(&self, text: &str) -> Result<Vec<Span>> {
        let mut spans: Vec<Span> = Vec::new();

        // Rules ordered strongest-first; later rules skip claimed offsets.
        for m in ORG_RE.find_iter(text) {
            push_span(&mut spans, m.start(), m.end(), m.as_str(), EntityKind::Org, 0.8);
        }

        for caps in HONORIFIC_RE.captures_iter(text) {
            let Some(name) = caps.get(1) else { continue };
            push_span(
                &mut spans,
                name.start(),
                name.end(),
                name.as_str(),
                EntityKind::PersonName,
                0.9,
            );
        }

        for caps in LOCATION_RE.captures_iter(text) {
            let Some(place) = caps.get(1) else { continue };
            push_span(
                &mut spans,
                place.start(),
                place.end(),
                place.as_str(),
                EntityKind::Location,
                0.6,
            );
        }

        for m in NAME_PAIR_RE.find_iter(text) {
            let first_word = m.as_str().split_whitespace().next().unwrap_or("");
            if NON_NAME_OPENERS.contains(&first_word) {
                continue;
            }
            push_span(
                &mut spans,
                m.start(),
                m.end(),
                m.as_str(),
                EntityKind::PersonName,
                0.7,
            );
        }

        for m in WRITTEN_DATE_RE.find_iter(text) {
            push_span(&mut spans, m.start(), m.end(), m.as_str(), EntityKind::Date, 0.7);
        }

        for m in TIME_AMPM_RE.find_iter(text) {
            push_span(&mut spans, m.start(), m.end(), m.as_str(), EntityKind::Time, 0.7);
        }

        spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));
        debug!("heuristic ner found {} spans", spans.len());
        Ok(spans)
    }
}

fn push_span(
    spans: &mut Vec<Span>,
    start: usize,
    end: usize,
    text: &str,
    kind: EntityKind,
    confidence: f64,
) {
    if spans.iter().any(|s| start < s.end && s.start < end) {
        return;
    }
    spans.push(Span::new(start, end, text, kind, confidence, DetectorId::Ner));
}
