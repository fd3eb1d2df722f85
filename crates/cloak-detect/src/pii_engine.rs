//! Specialized PII engine — checksum-validated high-precision detection.
//!
//! Covers the instrument-shaped formats a plain regex pass cannot
//! validate: card numbers (Luhn), SSNs (area/group/serial ranges), IBANs
//! (mod-97). Validated matches emit confidence 1.0; digit runs that fail
//! validation degrade to heuristic `IdNumber` matches at 0.5.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use cloak_core::Result;

use crate::detector::Detector;
use crate::span::{DetectorId, EntityKind, Span};

static CARD_CANDIDATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d(?:[ -]?\d){12,18}\b").unwrap());
static SSN_CANDIDATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{3})-(\d{2})-(\d{4})\b").unwrap());
static IBAN_CANDIDATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z]{2}\d{2}[A-Z0-9]{11,30}\b").unwrap());
static DIGIT_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{8,12}\b").unwrap());

/// High-precision PII detector with checksum validation.
pub struct PiiEngineDetector;

impl PiiEngineDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PiiEngineDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for PiiEngineDetector {
    fn id(&self) -> DetectorId {
        DetectorId::SpecializedPii
    }

    fn detect(&self, text: &str) -> Result<Vec<Span>> {
        let mut spans: Vec<Span> = Vec::new();

        // Card-length digit groups: Luhn-valid → CreditCard, else a
        // heuristic numeric-id match.
        for m in CARD_CANDIDATE_RE.find_iter(text) {
            let digits: Vec<u8> = m
                .as_str()
                .bytes()
                .filter(u8::is_ascii_digit)
                .map(|b| b - b'0')
                .collect();
            let (kind, confidence) = if (13..=19).contains(&digits.len()) && luhn_valid(&digits) {
                (EntityKind::CreditCard, 1.0)
            } else {
                (EntityKind::IdNumber, 0.5)
            };
            spans.push(Span::new(
                m.start(),
                m.end(),
                m.as_str(),
                kind,
                confidence,
                DetectorId::SpecializedPii,
            ));
        }

        for caps in SSN_CANDIDATE_RE.captures_iter(text) {
            let Some(m) = caps.get(0) else { continue };
            if claimed(&spans, m.start(), m.end()) {
                continue;
            }
            let area: u32 = caps[1].parse().unwrap_or(0);
            let group: u32 = caps[2].parse().unwrap_or(0);
            let serial: u32 = caps[3].parse().unwrap_or(0);
            if ssn_valid(area, group, serial) {
                spans.push(Span::new(
                    m.start(),
                    m.end(),
                    m.as_str(),
                    EntityKind::Ssn,
                    1.0,
                    DetectorId::SpecializedPii,
                ));
            }
        }

        for m in IBAN_CANDIDATE_RE.find_iter(text) {
            if claimed(&spans, m.start(), m.end()) {
                continue;
            }
            if iban_valid(m.as_str()) {
                spans.push(Span::new(
                    m.start(),
                    m.end(),
                    m.as_str(),
                    EntityKind::Financial,
                    1.0,
                    DetectorId::SpecializedPii,
                ));
            }
        }

        // Bare digit runs below card length: account/identifier heuristic.
        for m in DIGIT_RUN_RE.find_iter(text) {
            if claimed(&spans, m.start(), m.end()) {
                continue;
            }
            spans.push(Span::new(
                m.start(),
                m.end(),
                m.as_str(),
                EntityKind::IdNumber,
                0.5,
                DetectorId::SpecializedPii,
            ));
        }

        spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));
        debug!("pii engine found {} spans", spans.len());
        Ok(spans)
    }
}

fn claimed(spans: &[Span], start: usize, end: usize) -> bool {
    spans.iter().any(|s| start < s.end && s.start < end)
}

/// Luhn checksum over digits in reading order.
pub fn luhn_valid(digits: &[u8]) -> bool {
    if digits.is_empty() {
        return false;
    }
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            let d = u32::from(d);
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

/// SSA issuance rules: area 000/666/900+ never issued, group 00 and
/// serial 0000 invalid.
fn ssn_valid(area: u32, group: u32, serial: u32) -> bool {
    area != 0 && area != 666 && area < 900 && group != 0 && serial != 0
}

/// IBAN mod-97 check (ISO 13616).
pub fn iban_valid(candidate: &str) -> bool {
    if candidate.len() < 15 || candidate.len() > 34 {
        return false;
    }
    let rearranged: String = candidate
        .chars()
        .skip(4)
        .chain(candidate.chars().take(4))
        .collect();
    let mut remainder: u32 = 0;
    for c in rearranged.chars() {
        let value = match c {
            '0'..='9' => c as u32 - '0' as u32,
            'A'..='Z' => c as u32 - 'A' as u32 + 10,
            _ => return false,
        };
        remainder = if value < 10 {
            (remainder * 10 + value) % 97
        } else {
            (remainder * 100 + value) % 97
        };
    }
    remainder == 1
}
