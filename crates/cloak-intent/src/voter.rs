//! Voter trait — the seam between classification methods and the ensemble.

use async_trait::async_trait;
use cloak_core::Result;

use crate::types::{Intent, VoterId};

/// A classification method producing an intent for a query.
///
/// Voters are read-only over their input and shareable across requests;
/// the ensemble runs them concurrently under a bounded timeout. An `Err`
/// (or timeout) records a failed ballot — it never fails the ensemble.
#[async_trait]
pub trait IntentVoter: Send + Sync {
    fn id(&self) -> VoterId;

    async fn classify(&self, query: &str) -> Result<Intent>;
}
