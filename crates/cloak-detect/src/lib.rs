//! Cloak Detect — entity span model and the detector suite.
//!
//! Three independent detectors produce [`Span`]s over the same text:
//! - [`PatternDetector`]: regex matching for structured formats
//! - [`PiiEngineDetector`]: checksum-validated high-precision PII
//! - [`HeuristicNerDetector`]: capitalization/context heuristics for
//!   named entities, standing in for a model NER backend
//!
//! Detectors never see each other's output; overlap resolution lives in
//! `cloak-resolve`.

pub mod detector;
pub mod ner;
pub mod pattern;
pub mod pii_engine;
pub mod span;

pub use detector::Detector;
pub use ner::HeuristicNerDetector;
pub use pattern::PatternDetector;
pub use pii_engine::PiiEngineDetector;
pub use span::{DetectorId, EntityKind, Span};
