//! Keyword voter — rule-based keyword and length heuristics.

use async_trait::async_trait;
use cloak_core::Result;
use tracing::debug;

use crate::types::{Intent, VoterId};
use crate::voter::IntentVoter;

const SEARCH_KEYWORDS: &[&str] = &[
    "find", "lookup", "list", "search", "show", "retrieve", "query",
];
const REASONING_KEYWORDS: &[&str] = &[
    "why", "how", "explain", "compare", "analyse", "analysis", "reason", "evaluate", "calculate",
];

/// Ambiguous queries shorter than this default to search.
const LENGTH_THRESHOLD: usize = 140;

/// Infallible rule-based voter; the ensemble's always-available baseline.
pub struct KeywordVoter;

impl KeywordVoter {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous classification used by the voter impl.
    pub fn classify_keywords(query: &str) -> Intent {
        let lower = query.to_lowercase();
        let search_hit = SEARCH_KEYWORDS.iter().any(|k| lower.contains(k));
        let reasoning_hit = REASONING_KEYWORDS.iter().any(|k| lower.contains(k));

        let intent = match (search_hit, reasoning_hit) {
            (true, false) => Intent::Search,
            (false, true) => Intent::Reasoning,
            // Ambiguous either way: short queries tend to be lookups.
            _ => {
                if lower.len() < LENGTH_THRESHOLD {
                    Intent::Search
                } else {
                    Intent::Reasoning
                }
            }
        };
        debug!("keyword voter classified as {}", intent);
        intent
    }
}

impl Default for KeywordVoter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IntentVoter for KeywordVoter {
    fn id(&self) -> VoterId {
        VoterId::Keyword
    }

    async fn classify(&self, query: &str) -> Result<Intent> {
        Ok(Self::classify_keywords(query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_keywords() {
        assert_eq!(
            KeywordVoter::classify_keywords("Find all emails from John"),
            Intent::Search
        );
        assert_eq!(
            KeywordVoter::classify_keywords("Show me customer records"),
            Intent::Search
        );
        assert_eq!(
            KeywordVoter::classify_keywords("Query the database for user info"),
            Intent::Search
        );
    }

    #[test]
    fn test_reasoning_keywords() {
        assert_eq!(
            KeywordVoter::classify_keywords("Why did the transaction fail?"),
            Intent::Reasoning
        );
        assert_eq!(
            KeywordVoter::classify_keywords("Explain the difference between reports"),
            Intent::Reasoning
        );
        assert_eq!(
            KeywordVoter::classify_keywords("How does this algorithm work?"),
            Intent::Reasoning
        );
    }

    #[test]
    fn test_short_ambiguous_defaults_to_search() {
        // Contains both keyword families; length decides.
        assert_eq!(KeywordVoter::classify_keywords("Show analysis"), Intent::Search);
    }

    #[test]
    fn test_long_ambiguous_defaults_to_reasoning() {
        let long = "Find the reasons why we should evaluate the search functionality \
                    of our query system and explain how it compares to other search engines";
        assert_eq!(KeywordVoter::classify_keywords(long), Intent::Reasoning);
    }

    #[tokio::test]
    async fn test_voter_impl_is_infallible() {
        let voter = KeywordVoter::new();
        assert_eq!(voter.id(), VoterId::Keyword);
        assert!(voter.classify("anything at all").await.is_ok());
    }
}
