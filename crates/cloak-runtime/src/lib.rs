//! Cloak Runtime — the anonymization pipeline and intent entry points.

pub mod pipeline;

pub use pipeline::{Pipeline, PipelineBuilder};

pub use cloak_anonymize::{AnonymizedDocument, AuditReport};
pub use cloak_core::{Error, PipelineConfig, Result};
pub use cloak_intent::{Intent, IntentDecision};
