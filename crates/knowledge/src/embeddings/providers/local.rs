//! Local ONNX embedding provider.
//!
//! Runs a sentence-embedding model (bge-small-en-v1.5 by default, 384
//! dimensions) in-process through fastembed. The model is loaded on the
//! first embed and shared by every later request for the life of the
//! provider; the server builds exactly one provider per process.
//!
//! Query vectors are the attention-masked mean of the token embeddings,
//! L2-normalized, matching how the knowledge base was indexed. fastembed's
//! own default for the BGE family is CLS pooling, so `TextEmbedding::embed`
//! is not used.

use crate::embeddings::lazy::LazyModel;
use crate::embeddings::pooling::l2_normalize;
use crate::embeddings::provider::{EmbeddingError, EmbeddingProvider};
use fastembed::{EmbeddingModel, InitOptions, OutputKey, Pooling, TextEmbedding};
use sage_core::config::EmbeddingSettings;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Pooling applied to token embeddings for every local model.
pub const QUERY_POOLING: Pooling = Pooling::Mean;

/// Session outputs to pool, in order of preference.
const OUTPUT_PRECEDENCE: &[OutputKey] = &[
    OutputKey::OnlyOne,
    OutputKey::ByName("last_hidden_state"),
    OutputKey::ByName("sentence_embedding"),
];

/// Map a configured model name onto a fastembed model.
fn resolve_model(name: &str) -> Option<EmbeddingModel> {
    let short = name.rsplit('/').next().unwrap_or(name).to_lowercase();
    match short.as_str() {
        "bge-small-en-v1.5" => Some(EmbeddingModel::BGESmallENV15),
        "bge-base-en-v1.5" => Some(EmbeddingModel::BGEBaseENV15),
        "all-minilm-l6-v2" => Some(EmbeddingModel::AllMiniLML6V2),
        _ => None,
    }
}

/// Embedding provider backed by a local ONNX model.
pub struct LocalModelProvider {
    model_name: String,
    model: EmbeddingModel,
    dimensions: usize,
    cache_dir: Option<PathBuf>,
    shared: Arc<LazyModel<TextEmbedding>>,
}

impl LocalModelProvider {
    /// Create a provider. Nothing is downloaded or loaded here.
    pub fn new(settings: &EmbeddingSettings) -> Result<Self, EmbeddingError> {
        let model = resolve_model(&settings.model)
            .ok_or_else(|| EmbeddingError::UnknownModel(settings.model.clone()))?;

        Ok(Self {
            model_name: settings.model.clone(),
            model,
            dimensions: settings.dimensions,
            cache_dir: settings.cache_dir.clone(),
            shared: Arc::new(LazyModel::new()),
        })
    }

    /// Whether the model has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.shared.is_loaded()
    }

    /// Pooling used to turn token embeddings into a query vector.
    pub fn pooling(&self) -> Pooling {
        QUERY_POOLING
    }

    async fn model(&self) -> Result<Arc<TextEmbedding>, EmbeddingError> {
        self.shared
            .get_or_load(|| async {
                let mut options = InitOptions::new(self.model.clone())
                    .with_show_download_progress(false);
                if let Some(dir) = &self.cache_dir {
                    options = options.with_cache_dir(dir.clone());
                }

                tracing::info!("Loading embedding model '{}'", self.model_name);
                let model_name = self.model_name.clone();

                let loaded = tokio::task::spawn_blocking(move || TextEmbedding::try_new(options))
                    .await
                    .map_err(|e| EmbeddingError::ModelLoad {
                        model: model_name.clone(),
                        reason: format!("load task panicked: {}", e),
                    })?
                    .map_err(|e| EmbeddingError::ModelLoad {
                        model: model_name.clone(),
                        reason: e.to_string(),
                    })?;

                tracing::info!("Embedding model '{}' ready", model_name);
                Ok(loaded)
            })
            .await
    }
}

impl fmt::Debug for LocalModelProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalModelProvider")
            .field("model_name", &self.model_name)
            .field("dimensions", &self.dimensions)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for LocalModelProvider {
    fn provider_name(&self) -> &str {
        "local"
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = self.model().await?;
        let batch = texts.to_vec();
        let pooling = self.pooling();

        let embeddings = tokio::task::spawn_blocking(move || embed_pooled(&model, batch, pooling))
            .await
            .map_err(|e| EmbeddingError::Inference(format!("embedding task panicked: {}", e)))??;

        tracing::debug!(
            "Embedded {} texts with '{}' ({} dims)",
            embeddings.len(),
            self.model_name,
            embeddings.first().map(Vec::len).unwrap_or(0)
        );

        Ok(embeddings)
    }
}

/// Run the model and pool each text's token embeddings, then normalize.
fn embed_pooled(
    model: &TextEmbedding,
    texts: Vec<String>,
    pooling: Pooling,
) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    let output = model
        .transform(texts, None)
        .map_err(|e| EmbeddingError::Inference(e.to_string()))?;

    let mut embeddings = Vec::new();
    for batch in output.into_raw() {
        let pooled = batch
            .select_and_pool_output(&OUTPUT_PRECEDENCE, Some(pooling.clone()))
            .map_err(|e| EmbeddingError::Inference(e.to_string()))?;

        for row in pooled.rows() {
            let mut embedding = row.to_vec();
            l2_normalize(&mut embedding);
            embeddings.push(embedding);
        }
    }

    Ok(embeddings)
}
