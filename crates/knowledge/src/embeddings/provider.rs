//! Embedding provider trait and factory.

use crate::embeddings::providers::{LocalModelProvider, TrigramProvider};
use crate::types::QueryVector;
use sage_core::config::EmbeddingSettings;
use sage_core::AppError;
use std::sync::Arc;
use thiserror::Error;

/// Failure to produce an embedding. Fatal for the request; there is no
/// fallback vector.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("failed to load embedding model '{model}': {reason}")]
    ModelLoad { model: String, reason: String },

    #[error("embedding inference failed: {0}")]
    Inference(String),

    #[error("embedding has {actual} dimensions, expected {expected}")]
    Dimensions { expected: usize, actual: usize },

    #[error("unknown embedding model: '{0}'")]
    UnknownModel(String),

    #[error("embedding dimensions must be at least 1")]
    ZeroDimensions,
}

impl From<EmbeddingError> for AppError {
    fn from(err: EmbeddingError) -> Self {
        AppError::Knowledge(err.to_string())
    }
}

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "local", "trigram")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate unit-length embeddings for multiple texts.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Generate the embedding of a single query, checking its length.
    async fn embed(&self, text: &str) -> Result<QueryVector, EmbeddingError> {
        let vector = self
            .embed_batch(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| EmbeddingError::Inference("No embedding returned".to_string()))?;

        if vector.len() != self.dimensions() {
            return Err(EmbeddingError::Dimensions {
                expected: self.dimensions(),
                actual: vector.len(),
            });
        }

        Ok(vector)
    }
}

/// Create an embedding provider from settings.
///
/// `trigram` selects the offline provider; anything else names a local
/// ONNX model. The local model is not loaded until the first embed.
pub fn create_provider(settings: &EmbeddingSettings) -> Result<Arc<dyn EmbeddingProvider>, EmbeddingError> {
    if settings.dimensions == 0 {
        return Err(EmbeddingError::ZeroDimensions);
    }

    match settings.model.to_lowercase().as_str() {
        "trigram" | "trigram-v1" => Ok(Arc::new(TrigramProvider::new(settings.dimensions))),
        _ => Ok(Arc::new(LocalModelProvider::new(settings)?)),
    }
}
