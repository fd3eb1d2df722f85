//! Intent ensemble — majority vote with priority tie-break.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::embed::Embedder;
use crate::embedding_voter::EmbeddingVoter;
use crate::keyword::KeywordVoter;
use crate::llm::{ChatCompleter, LlmVoter};
use crate::types::{Intent, IntentDecision, IntentVote};
use crate::voter::IntentVoter;

/// Intent used when every voter fails.
const DEFAULT_INTENT: Intent = Intent::Search;

/// Runs all voters concurrently and combines their ballots.
///
/// The intent with strictly more votes than any other wins. Ties resolve
/// to the ballot of the highest-priority participating voter (LLM >
/// embedding > keyword). If every voter fails, the default intent is
/// returned flagged low-confidence.
pub struct IntentEnsemble {
    voters: Vec<Arc<dyn IntentVoter>>,
    voter_timeout: Duration,
}

impl IntentEnsemble {
    pub fn new(voters: Vec<Arc<dyn IntentVoter>>, voter_timeout: Duration) -> Self {
        Self {
            voters,
            voter_timeout,
        }
    }

    /// The standard three-voter configuration.
    pub fn standard(
        completer: Arc<dyn ChatCompleter>,
        embedder: Arc<dyn Embedder>,
        voter_timeout: Duration,
    ) -> Self {
        Self::new(
            vec![
                Arc::new(LlmVoter::new(completer)) as Arc<dyn IntentVoter>,
                Arc::new(EmbeddingVoter::new(embedder)),
                Arc::new(KeywordVoter::new()),
            ],
            voter_timeout,
        )
    }

    /// Classify a query. Never fails: voter errors and timeouts are
    /// recorded as failed ballots.
    pub async fn classify(&self, query: &str) -> IntentDecision {
        let ballots = self.voters.iter().map(|voter| {
            let id = voter.id();
            async move {
                match timeout(self.voter_timeout, voter.classify(query)).await {
                    Ok(Ok(intent)) => {
                        debug!("voter {} voted {}", id, intent);
                        IntentVote {
                            voter: id,
                            intent: Some(intent),
                        }
                    }
                    Ok(Err(e)) => {
                        warn!("voter {} failed: {}", id, e);
                        IntentVote {
                            voter: id,
                            intent: None,
                        }
                    }
                    Err(_) => {
                        warn!("voter {} timed out", id);
                        IntentVote {
                            voter: id,
                            intent: None,
                        }
                    }
                }
            }
        });

        let votes = join_all(ballots).await;
        decide(votes)
    }
}

/// Deterministic combination of ballots.
fn decide(votes: Vec<IntentVote>) -> IntentDecision {
    let mut tally: HashMap<Intent, usize> = HashMap::new();
    for vote in votes.iter().filter(|v| v.succeeded()) {
        if let Some(intent) = vote.intent {
            *tally.entry(intent).or_insert(0) += 1;
        }
    }

    if tally.is_empty() {
        warn!(
            "{}; defaulting to {}",
            cloak_core::Error::AllVotersFailed,
            DEFAULT_INTENT
        );
        return IntentDecision {
            intent: DEFAULT_INTENT,
            low_confidence: true,
            votes,
        };
    }

    let top = tally.values().copied().max().unwrap_or(0);
    let leaders: Vec<Intent> = tally
        .iter()
        .filter(|(_, &count)| count == top)
        .map(|(&intent, _)| intent)
        .collect();

    let intent = if leaders.len() == 1 {
        leaders[0]
    } else {
        // Tied ballot: the highest-priority participating voter decides.
        votes
            .iter()
            .filter(|v| v.succeeded())
            .max_by_key(|v| v.voter.priority())
            .and_then(|v| v.intent)
            .unwrap_or(DEFAULT_INTENT)
    };

    info!(
        "intent ensemble: {} ({} of {} voters)",
        intent,
        tally.get(&intent).copied().unwrap_or(0),
        votes.len()
    );

    IntentDecision {
        intent,
        low_confidence: false,
        votes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VoterId;
    use async_trait::async_trait;
    use cloak_core::{Error, Result};

    /// Scripted voter with a fixed outcome.
    struct ScriptedVoter {
        id: VoterId,
        outcome: Option<Intent>,
    }

    #[async_trait]
    impl IntentVoter for ScriptedVoter {
        fn id(&self) -> VoterId {
            self.id
        }

        async fn classify(&self, _query: &str) -> Result<Intent> {
            self.outcome
                .ok_or_else(|| Error::VoterUnavailable(self.id.label().into()))
        }
    }

    /// Voter that sleeps past any reasonable timeout.
    struct SlowVoter;

    #[async_trait]
    impl IntentVoter for SlowVoter {
        fn id(&self) -> VoterId {
            VoterId::Llm
        }

        async fn classify(&self, _query: &str) -> Result<Intent> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Intent::Reasoning)
        }
    }

    fn ensemble(outcomes: [(VoterId, Option<Intent>); 3]) -> IntentEnsemble {
        let voters: Vec<Arc<dyn IntentVoter>> = outcomes
            .into_iter()
            .map(|(id, outcome)| Arc::new(ScriptedVoter { id, outcome }) as Arc<dyn IntentVoter>)
            .collect();
        IntentEnsemble::new(voters, Duration::from_millis(200))
    }

    #[tokio::test]
    async fn test_unanimous() {
        let decision = ensemble([
            (VoterId::Llm, Some(Intent::Search)),
            (VoterId::Embedding, Some(Intent::Search)),
            (VoterId::Keyword, Some(Intent::Search)),
        ])
        .classify("q")
        .await;
        assert_eq!(decision.intent, Intent::Search);
        assert!(!decision.low_confidence);
    }

    #[tokio::test]
    async fn test_majority_beats_llm() {
        // LLM says reasoning, the other two say search.
        let decision = ensemble([
            (VoterId::Llm, Some(Intent::Reasoning)),
            (VoterId::Embedding, Some(Intent::Search)),
            (VoterId::Keyword, Some(Intent::Search)),
        ])
        .classify("q")
        .await;
        assert_eq!(decision.intent, Intent::Search);
    }

    #[tokio::test]
    async fn test_tie_resolved_by_priority() {
        // LLM failed; embedding outranks keyword on the 1-1 tie.
        let decision = ensemble([
            (VoterId::Llm, None),
            (VoterId::Embedding, Some(Intent::Reasoning)),
            (VoterId::Keyword, Some(Intent::Search)),
        ])
        .classify("q")
        .await;
        assert_eq!(decision.intent, Intent::Reasoning);
        assert!(!decision.low_confidence);
    }

    #[tokio::test]
    async fn test_single_survivor_wins() {
        let decision = ensemble([
            (VoterId::Llm, None),
            (VoterId::Embedding, None),
            (VoterId::Keyword, Some(Intent::Reasoning)),
        ])
        .classify("q")
        .await;
        assert_eq!(decision.intent, Intent::Reasoning);
        assert!(!decision.low_confidence);
    }

    #[tokio::test]
    async fn test_all_failed_falls_back_low_confidence() {
        let decision = ensemble([
            (VoterId::Llm, None),
            (VoterId::Embedding, None),
            (VoterId::Keyword, None),
        ])
        .classify("q")
        .await;
        assert_eq!(decision.intent, Intent::Search);
        assert!(decision.low_confidence);
        assert_eq!(decision.votes.len(), 3);
    }

    #[tokio::test]
    async fn test_timeout_counts_as_failure() {
        let voters: Vec<Arc<dyn IntentVoter>> = vec![
            Arc::new(SlowVoter),
            Arc::new(ScriptedVoter {
                id: VoterId::Keyword,
                outcome: Some(Intent::Search),
            }),
        ];
        let ensemble = IntentEnsemble::new(voters, Duration::from_millis(50));
        let decision = ensemble.classify("q").await;
        assert_eq!(decision.intent, Intent::Search);
        assert!(!decision.votes[0].succeeded());
    }

    #[tokio::test]
    async fn test_deterministic_across_runs() {
        for _ in 0..10 {
            let decision = ensemble([
                (VoterId::Llm, None),
                (VoterId::Embedding, Some(Intent::Reasoning)),
                (VoterId::Keyword, Some(Intent::Search)),
            ])
            .classify("q")
            .await;
            assert_eq!(decision.intent, Intent::Reasoning);
        }
    }
}
