//! Error types for Cloak.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Malformed input — empty document, invalid span offsets. Fatal to
    /// the request and surfaced to the caller.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A detector errored or timed out. Non-fatal: the pipeline continues
    /// with the remaining detectors.
    #[error("Detector unavailable: {0}")]
    DetectorUnavailable(String),

    /// An intent voter errored or timed out. Non-fatal: excluded from the
    /// ensemble tally.
    #[error("Voter unavailable: {0}")]
    VoterUnavailable(String),

    /// Replacement generation kept colliding past the retry budget.
    /// Non-fatal: the caller falls back to a counter-suffixed value.
    #[error("Replacement collision retries exceeded for: {0}")]
    ReplacementCollisionExceeded(String),

    /// Every voter in the ensemble failed. Non-fatal: the default intent
    /// is used and the result is flagged low-confidence.
    #[error("All intent voters failed")]
    AllVotersFailed,

    /// External LLM call failed (transport, auth, or malformed reply).
    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Coreference error: {0}")]
    Coreference(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
