//! Trigram embedding provider for offline runs and tests.

use crate::embeddings::pooling::{l2_normalize, mean_pool};
use crate::embeddings::provider::{EmbeddingError, EmbeddingProvider};
use std::collections::HashSet;

const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them",
];

/// Hashing embedder: each word becomes a sparse token vector from its
/// character trigrams, and the query vector is their mean, normalized.
///
/// Deterministic and dependency-free, but not semantic. Useful without
/// network access to the model hub.
#[derive(Debug)]
pub struct TrigramProvider {
    dimensions: usize,
    stop_words: HashSet<&'static str>,
}

impl TrigramProvider {
    /// Create a new trigram provider with specified dimensions.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            stop_words: STOP_WORDS.iter().copied().collect(),
        }
    }

    /// Split text into lowercase content words.
    fn tokenize(&self, text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() > 2 && !self.stop_words.contains(w))
            .map(str::to_string)
            .collect()
    }

    /// Sparse vector for one token: its trigrams plus the whole word.
    fn token_vector(&self, token: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.dimensions];
        let chars: Vec<char> = token.chars().collect();

        for window in chars.windows(3) {
            let idx = bucket(window.iter().collect::<String>().as_bytes(), 37, self.dimensions);
            vector[idx] += 1.0;
        }

        let idx = bucket(token.as_bytes(), 31, self.dimensions);
        vector[idx] += 2.0;

        vector
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let tokens: Vec<Vec<f32>> = self
            .tokenize(text)
            .iter()
            .map(|t| self.token_vector(t))
            .collect();

        let mut pooled = mean_pool(&tokens, self.dimensions);
        l2_normalize(&mut pooled);
        pooled
    }
}

fn bucket(bytes: &[u8], multiplier: u64, dimensions: usize) -> usize {
    let hash = bytes
        .iter()
        .fold(0u64, |acc, b| acc.wrapping_mul(multiplier).wrapping_add(*b as u64));
    (hash % dimensions as u64) as usize
}

#[async_trait::async_trait]
impl EmbeddingProvider for TrigramProvider {
    fn provider_name(&self) -> &str {
        "trigram"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}
