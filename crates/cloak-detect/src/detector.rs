//! Detector trait — the seam between detection methods and the pipeline.

use cloak_core::Result;

use crate::span::{DetectorId, Span};

/// A detection method producing entity spans from raw text.
///
/// Implementations are read-only over their input and shareable across
/// requests; the pipeline runs them concurrently. An `Err` from `detect`
/// marks the detector unavailable for this request — the pipeline logs it
/// and continues with the remaining detectors.
pub trait Detector: Send + Sync {
    fn id(&self) -> DetectorId;

    /// Detect entity spans in `text`. Spans may overlap spans from other
    /// detectors; they must be valid against `text` (see [`Span::validate`]).
    fn detect(&self, text: &str) -> Result<Vec<Span>>;
}
