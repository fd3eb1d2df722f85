//! Embedding voter — nearest labeled exemplar set by cosine similarity.

use std::sync::Arc;

use async_trait::async_trait;
use cloak_core::Result;
use ndarray::Array1;
use tracing::debug;

use crate::embed::{cosine_similarity, Embedder};
use crate::types::{Intent, VoterId};
use crate::voter::IntentVoter;

const SEARCH_EXEMPLARS: &[&str] = &[
    "Find all emails from John",
    "Show me customer records from last month",
    "Search for documents containing financial data",
    "List all transactions over $1000",
    "Query the database for user information",
    "Retrieve the latest sales figures",
    "Look up contact information for Jane Doe",
];
const REASONING_EXEMPLARS: &[&str] = &[
    "Why did the transaction fail?",
    "How does this algorithm work?",
    "Explain the difference between these two reports",
    "Analyze the trends in this dataset",
    "Compare the performance of these two models",
    "What are the reasons for the decline in sales?",
    "Evaluate the effectiveness of our marketing strategy",
];

const QUESTION_WORDS: &[&str] = &["why", "how", "what", "when", "where", "which"];
const SEARCH_VERBS: &[&str] = &["find", "search", "query", "retrieve", "list", "show", "get"];
const REASONING_VERBS: &[&str] = &[
    "explain", "analyze", "compare", "evaluate", "calculate", "determine",
];

/// Weight added to the side favored by the verb-pattern heuristic.
const VERB_PATTERN_BONUS: f32 = 0.3;

/// Semantic-distance voter over two labeled exemplar sets.
///
/// Exemplar vectors are computed once at construction; the shared
/// embedder handle is read-only across requests.
pub struct EmbeddingVoter {
    embedder: Arc<dyn Embedder>,
    search_vectors: Vec<Array1<f32>>,
    reasoning_vectors: Vec<Array1<f32>>,
}

impl EmbeddingVoter {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        let search_vectors = SEARCH_EXEMPLARS.iter().map(|t| embedder.embed(t)).collect();
        let reasoning_vectors = REASONING_EXEMPLARS.iter().map(|t| embedder.embed(t)).collect();
        Self {
            embedder,
            search_vectors,
            reasoning_vectors,
        }
    }

    fn mean_similarity(&self, query: &Array1<f32>, exemplars: &[Array1<f32>]) -> f32 {
        if exemplars.is_empty() {
            return 0.0;
        }
        let total: f32 = exemplars
            .iter()
            .map(|v| cosine_similarity(query, v))
            .sum();
        total / exemplars.len() as f32
    }
}

/// Verb-usage heuristic backing up the similarity scores.
fn verb_pattern_intent(query: &str) -> Option<Intent> {
    let lower = query.to_lowercase();
    let tokens: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();

    // Leading question words strongly indicate reasoning.
    if tokens
        .iter()
        .take(3)
        .any(|t| QUESTION_WORDS.contains(t))
    {
        return Some(Intent::Reasoning);
    }
    if tokens.iter().any(|t| SEARCH_VERBS.contains(t)) {
        return Some(Intent::Search);
    }
    if tokens.iter().any(|t| REASONING_VERBS.contains(t)) {
        return Some(Intent::Reasoning);
    }
    None
}

#[async_trait]
impl IntentVoter for EmbeddingVoter {
    fn id(&self) -> VoterId {
        VoterId::Embedding
    }

    async fn classify(&self, query: &str) -> Result<Intent> {
        let vector = self.embedder.embed(query);
        let mut search_score = self.mean_similarity(&vector, &self.search_vectors);
        let mut reasoning_score = self.mean_similarity(&vector, &self.reasoning_vectors);

        match verb_pattern_intent(query) {
            Some(Intent::Search) => search_score += VERB_PATTERN_BONUS,
            Some(Intent::Reasoning) => reasoning_score += VERB_PATTERN_BONUS,
            None => {}
        }

        debug!(
            "embedding voter scores: search={:.3} reasoning={:.3}",
            search_score, reasoning_score
        );
        Ok(if search_score > reasoning_score {
            Intent::Search
        } else {
            Intent::Reasoning
        })
    }
}
