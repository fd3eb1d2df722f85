//! Intent classification types.

use serde::{Deserialize, Serialize};

/// Query intent category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    /// Information retrieval: find, list, look up.
    Search,
    /// Explanation or analysis: why, how, compare.
    Reasoning,
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Intent::Search => write!(f, "search"),
            Intent::Reasoning => write!(f, "reasoning"),
        }
    }
}

/// Voter identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoterId {
    Llm,
    Embedding,
    Keyword,
}

impl VoterId {
    pub fn label(&self) -> &'static str {
        match self {
            VoterId::Llm => "llm",
            VoterId::Embedding => "embedding",
            VoterId::Keyword => "keyword",
        }
    }

    /// Fixed tie-break order: the highest-priority participating voter
    /// decides a tied ballot.
    pub fn priority(&self) -> u8 {
        match self {
            VoterId::Llm => 2,
            VoterId::Embedding => 1,
            VoterId::Keyword => 0,
        }
    }
}

impl std::fmt::Display for VoterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One voter's ballot; `intent` is `None` when the voter failed or
/// timed out.
#[derive(Debug, Clone, Serialize)]
pub struct IntentVote {
    pub voter: VoterId,
    pub intent: Option<Intent>,
}

impl IntentVote {
    pub fn succeeded(&self) -> bool {
        self.intent.is_some()
    }
}

/// Final ensemble decision.
#[derive(Debug, Clone, Serialize)]
pub struct IntentDecision {
    pub intent: Intent,
    /// Set when every voter failed and the default intent was used.
    #[serde(rename = "lowConfidence")]
    pub low_confidence: bool,
    pub votes: Vec<IntentVote>,
}
