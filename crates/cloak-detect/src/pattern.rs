//! Pattern detector — compiled regexes for structured PII formats.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use cloak_core::Result;

use crate::detector::Detector;
use crate::span::{DetectorId, EntityKind, Span};

// Compiled once, reused across requests.
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").unwrap());
static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\+?1[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}").unwrap()
});
static IP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:(?:25[0-5]|2[0-4]\d|[01]?\d\d?)\.){3}(?:25[0-5]|2[0-4]\d|[01]?\d\d?)\b")
        .unwrap()
});
static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"https?://[^\s<>"']+"#).unwrap());
static SSN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap());
static ADDRESS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b\d{1,5}\s+\w+(?:\s+\w+){0,4}\s(?:Street|St|Road|Rd|Avenue|Ave|Blvd|Lane|Ln|Way)\b")
        .unwrap()
});
static DATE_ISO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{4}-\d{2}-\d{2}\b").unwrap());
static DATE_US_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{1,2}/\d{1,2}/\d{2,4}\b").unwrap());
static TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{1,2}:\d{2}(?:\s*(?:AM|PM|am|pm))?\b").unwrap());

/// Regex detector for structured formats.
///
/// Validated formats (email, range-checked IPs) emit confidence 1.0;
/// format-only matches emit less; the street-suffix address heuristic is
/// the loosest at 0.6.
pub struct PatternDetector {
    patterns: Vec<(EntityKind, f64, &'static Regex)>,
}

impl PatternDetector {
    pub fn new() -> Self {
        Self {
            // Within-detector priority: earlier patterns claim their
            // offsets first.
            patterns: vec![
                (EntityKind::Email, 1.0, &EMAIL_RE),
                (EntityKind::Url, 0.9, &URL_RE),
                (EntityKind::Ip, 1.0, &IP_RE),
                (EntityKind::Ssn, 0.9, &SSN_RE),
                (EntityKind::Phone, 0.8, &PHONE_RE),
                (EntityKind::Address, 0.6, &ADDRESS_RE),
                (EntityKind::Date, 0.7, &DATE_ISO_RE),
                (EntityKind::Date, 0.7, &DATE_US_RE),
                (EntityKind::Time, 0.7, &TIME_RE),
            ],
        }
    }
}

impl Default for PatternDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for PatternDetector {
    fn id(&self) -> DetectorId {
        DetectorId::Pattern
    }

    fn detect(&self, text: &str) -> Result<Vec<Span>> {
        let mut spans: Vec<Span> = Vec::new();

        for (kind, confidence, regex) in &self.patterns {
            for m in regex.find_iter(text) {
                if claimed(&spans, m.start(), m.end()) {
                    continue;
                }
                spans.push(Span::new(
                    m.start(),
                    m.end(),
                    m.as_str(),
                    *kind,
                    *confidence,
                    DetectorId::Pattern,
                ));
            }
        }

        spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));
        debug!("pattern detector found {} spans", spans.len());
        Ok(spans)
    }
}

/// Whether an offset range overlaps a span this detector already emitted.
fn claimed(spans: &[Span], start: usize, end: usize) -> bool {
    spans.iter().any(|s| start < s.end && s.start < end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(text: &str) -> Vec<Span> {
        PatternDetector::new().detect(text).unwrap()
    }

    fn kinds(spans: &[Span]) -> Vec<EntityKind> {
        spans.iter().map(|s| s.kind).collect()
    }

    #[test]
    fn test_detect_email() {
        let spans = detect("Contact me at user@example.com for details.");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].kind, EntityKind::Email);
        assert_eq!(spans[0].text, "user@example.com");
        assert_eq!(spans[0].confidence, 1.0);
    }

    #[test]
    fn test_detect_phone() {
        let spans = detect("Call me at (555) 123-4567 today.");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].kind, EntityKind::Phone);
    }

    #[test]
    fn test_detect_ssn() {
        let spans = detect("My SSN is 123-45-6789.");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].kind, EntityKind::Ssn);
        assert_eq!(spans[0].text, "123-45-6789");
    }

    #[test]
    fn test_detect_ip() {
        let spans = detect("Server at 192.168.1.100 is down.");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].kind, EntityKind::Ip);
        assert_eq!(spans[0].confidence, 1.0);
    }

    #[test]
    fn test_invalid_ip_octet_rejected() {
        let spans = detect("Version 999.999.999.999 is not an address.");
        assert!(!kinds(&spans).contains(&EntityKind::Ip));
    }

    #[test]
    fn test_detect_url() {
        let spans = detect("See https://docs.example.com/guide for more.");
        assert_eq!(spans[0].kind, EntityKind::Url);
        assert_eq!(spans[0].text, "https://docs.example.com/guide");
    }

    #[test]
    fn test_detect_address() {
        let spans = detect("Ship to 742 Evergreen Terrace Lane please.");
        assert!(kinds(&spans).contains(&EntityKind::Address));
    }

    #[test]
    fn test_detect_dates_and_times() {
        let spans = detect("Due 2024-01-15 or 3/4/2024 at 14:30.");
        let k = kinds(&spans);
        assert_eq!(k.iter().filter(|k| **k == EntityKind::Date).count(), 2);
        assert!(k.contains(&EntityKind::Time));
    }

    #[test]
    fn test_spans_valid_against_text() {
        let text = "Email user@example.com, call 555-123-4567, visit https://example.com";
        for span in detect(text) {
            span.validate(text).unwrap();
        }
    }

    #[test]
    fn test_no_overlapping_output() {
        let text = "Reach 555-123-4567 or admin@host.example.org at 10.0.0.1";
        let spans = detect(text);
        for i in 0..spans.len() {
            for j in (i + 1)..spans.len() {
                assert!(!spans[i].overlaps(&spans[j]));
            }
        }
    }
}
