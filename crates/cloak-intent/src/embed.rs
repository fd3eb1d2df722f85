//! Embedding backend trait and the built-in lexical vectorizer.
//!
//! The embedding model is a black box behind [`Embedder`]; the default
//! [`HashedBowEmbedder`] hashes tokens into a fixed-width bag-of-words
//! vector, which is deterministic and dependency-free. A model-backed
//! embedder plugs in without touching the voter.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use ndarray::Array1;

/// Trait for embedding backends used by the embedding voter.
pub trait Embedder: Send + Sync {
    /// Embed a text into a fixed-dimension vector.
    fn embed(&self, text: &str) -> Array1<f32>;

    fn dimension(&self) -> usize;
}

/// Deterministic hashed bag-of-tokens vectorizer.
pub struct HashedBowEmbedder {
    dim: usize,
}

impl HashedBowEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl Default for HashedBowEmbedder {
    fn default() -> Self {
        Self::new(256)
    }
}

impl Embedder for HashedBowEmbedder {
    fn embed(&self, text: &str) -> Array1<f32> {
        let mut vector = Array1::zeros(self.dim);
        for token in tokenize(text) {
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            let bucket = (hasher.finish() as usize) % self.dim;
            vector[bucket] += 1.0;
        }
        vector
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}

/// Lowercased alphanumeric tokens.
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Cosine similarity; zero vectors compare as 0.
pub fn cosine_similarity(a: &Array1<f32>, b: &Array1<f32>) -> f32 {
    let dot = a.dot(b);
    let norms = a.dot(a).sqrt() * b.dot(b).sqrt();
    if norms < 1e-9 {
        0.0
    } else {
        dot / norms
    }
}
