//! Entity spans, kinds, and detector identities.

use cloak_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Kinds of sensitive entity that can be detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    PersonName,
    Org,
    Email,
    Phone,
    Address,
    Location,
    CreditCard,
    Financial,
    Ssn,
    IdNumber,
    Ip,
    Url,
    Date,
    Time,
}

impl EntityKind {
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::PersonName => "PERSON_NAME",
            EntityKind::Org => "ORG",
            EntityKind::Email => "EMAIL",
            EntityKind::Phone => "PHONE",
            EntityKind::Address => "ADDRESS",
            EntityKind::Location => "LOCATION",
            EntityKind::CreditCard => "CREDIT_CARD",
            EntityKind::Financial => "FINANCIAL",
            EntityKind::Ssn => "SSN",
            EntityKind::IdNumber => "ID_NUMBER",
            EntityKind::Ip => "IP",
            EntityKind::Url => "URL",
            EntityKind::Date => "DATE",
            EntityKind::Time => "TIME",
        }
    }

    /// Merge-priority rank. Higher rank wins an overlap regardless of
    /// confidence. Every new kind must be added to this table.
    ///
    /// - 2: structured/validated formats
    /// - 1: named entities from model or heuristic backends
    /// - 0: temporal expressions
    pub fn specificity(&self) -> u8 {
        match self {
            EntityKind::IdNumber
            | EntityKind::CreditCard
            | EntityKind::Ssn
            | EntityKind::Email
            | EntityKind::Phone
            | EntityKind::Address
            | EntityKind::Financial
            | EntityKind::Ip
            | EntityKind::Url => 2,
            EntityKind::PersonName | EntityKind::Org | EntityKind::Location => 1,
            EntityKind::Date | EntityKind::Time => 0,
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Identity of a detection source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorId {
    SpecializedPii,
    Pattern,
    Ner,
}

impl DetectorId {
    pub fn label(&self) -> &'static str {
        match self {
            DetectorId::SpecializedPii => "specialized_pii",
            DetectorId::Pattern => "pattern",
            DetectorId::Ner => "ner",
        }
    }

    /// Fixed precedence order used as the final merge tie-break.
    pub fn precedence(&self) -> u8 {
        match self {
            DetectorId::SpecializedPii => 2,
            DetectorId::Pattern => 1,
            DetectorId::Ner => 0,
        }
    }
}

impl std::fmt::Display for DetectorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A single detected entity occurrence.
///
/// Offsets are byte offsets into the document, half-open, and must lie on
/// `char` boundaries with `text == document[start..end]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub kind: EntityKind,
    pub confidence: f64,
    pub detector: DetectorId,
}

impl Span {
    pub fn new(
        start: usize,
        end: usize,
        text: impl Into<String>,
        kind: EntityKind,
        confidence: f64,
        detector: DetectorId,
    ) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            kind,
            confidence: confidence.clamp(0.0, 1.0),
            detector,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Check whether this span overlaps another (half-open intervals).
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Validate the span against its source document.
    pub fn validate(&self, document: &str) -> Result<()> {
        if self.start >= self.end {
            return Err(Error::Validation(format!(
                "zero-length or inverted span at {}..{}",
                self.start, self.end
            )));
        }
        if self.end > document.len() {
            return Err(Error::Validation(format!(
                "span {}..{} exceeds document length {}",
                self.start,
                self.end,
                document.len()
            )));
        }
        if !document.is_char_boundary(self.start) || !document.is_char_boundary(self.end) {
            return Err(Error::Validation(format!(
                "span {}..{} not on char boundaries",
                self.start, self.end
            )));
        }
        if document[self.start..self.end] != self.text {
            return Err(Error::Validation(format!(
                "span text {:?} does not match document at {}..{}",
                self.text, self.start, self.end
            )));
        }
        Ok(())
    }
}
