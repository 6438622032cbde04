//! RAG orchestration.
//!
//! embed the last user message → search the vector store → stop early on
//! failure or zero hits → label sources → assemble the grounded prompt →
//! complete under a deadline → package answer and sources.
//!
//! There is no degraded path: a failed search never turns into an
//! ungrounded completion, and nothing is retried.

use crate::answer::package;
use crate::embeddings::{EmbeddingError, EmbeddingProvider};
use crate::retriever::{RetrievalError, Retriever};
use crate::sources::extract_sources;
use crate::types::{RetrievedDocument, SearchParams};
use sage_core::{AppConfig, AppError};
use sage_llm::{complete_with_deadline, ChatCompletionClient, CompletionError, CompletionRequest};
use sage_prompt::{HistoryMessage, PromptAssembler};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tracing::Instrument;

/// Shown to the user when the vector store cannot be searched.
pub const KNOWLEDGE_UNAVAILABLE_MESSAGE: &str = "Knowledge base unavailable. I can only answer questions based on spiritual wisdom teachings from my knowledge base. Please try again in a moment.";

/// Returned instead of an answer when retrieval finds nothing relevant.
pub const NO_CONTEXT_APOLOGY: &str = "I apologize, but I couldn't find any relevant teachings in my knowledge base to answer your question. My responses are based solely on the spiritual wisdom teachings I have access to. Please try rephrasing your question or ask about topics related to meditation, self-inquiry, consciousness, or spiritual practice.";

/// Pipeline knobs, fixed per process.
#[derive(Debug, Clone, PartialEq)]
pub struct RagSettings {
    pub top_k: usize,
    pub threshold: f32,
    pub namespace: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl RagSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            top_k: config.vector.top_k,
            threshold: config.vector.similarity_threshold,
            namespace: config.vector.namespace.clone(),
            model: config.completion.model.clone(),
            max_tokens: config.completion.max_tokens,
            timeout: Duration::from_millis(config.completion.timeout_ms),
        }
    }
}

fn default_use_rag() -> bool {
    true
}

/// One chat request as the client sends it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurn {
    #[serde(default)]
    pub messages: Vec<HistoryMessage>,

    #[serde(default = "default_use_rag")]
    pub use_rag: bool,

    /// Per-request model override
    #[serde(default, rename = "llm")]
    pub model: Option<String>,

    #[serde(default)]
    pub similarity_metric: Option<String>,
}

impl ChatTurn {
    pub fn new(messages: Vec<HistoryMessage>) -> Self {
        Self {
            messages,
            use_rag: true,
            model: None,
            similarity_metric: None,
        }
    }

    /// Content of the last message, the text that gets embedded.
    pub fn query(&self) -> Option<&str> {
        self.messages
            .last()
            .map(|msg| msg.content.trim())
            .filter(|content| !content.is_empty())
    }
}

/// Successful end of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RagOutcome {
    /// Completion text, with the sources trailer when sources exist
    Answered(String),

    /// Retrieval found nothing; carries the fixed apology
    NoRelevantContext(String),
}

impl RagOutcome {
    /// Body sent to the client.
    pub fn into_body(self) -> String {
        match self {
            RagOutcome::Answered(body) | RagOutcome::NoRelevantContext(body) => body,
        }
    }
}

/// Hard failure of a pipeline run.
#[derive(Debug, Error)]
pub enum RagError {
    #[error("no user message to answer")]
    EmptyQuery,

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    RetrievalUnavailable(#[from] RetrievalError),

    #[error("failed to assemble prompt: {0}")]
    Prompt(String),

    #[error(transparent)]
    Completion(#[from] CompletionError),
}

impl From<RagError> for AppError {
    fn from(err: RagError) -> Self {
        match err {
            RagError::Completion(e) => e.into(),
            RagError::Prompt(msg) => AppError::Prompt(msg),
            other => AppError::Knowledge(other.to_string()),
        }
    }
}

/// The retrieval-augmented answering pipeline.
pub struct RagPipeline {
    embedder: Arc<dyn EmbeddingProvider>,
    retriever: Retriever,
    assembler: Arc<PromptAssembler>,
    completion: Arc<dyn ChatCompletionClient>,
    settings: RagSettings,
}

impl RagPipeline {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        retriever: Retriever,
        assembler: Arc<PromptAssembler>,
        completion: Arc<dyn ChatCompletionClient>,
        settings: RagSettings,
    ) -> Self {
        Self {
            embedder,
            retriever,
            assembler,
            completion,
            settings,
        }
    }

    pub fn settings(&self) -> &RagSettings {
        &self.settings
    }

    /// Answer one chat turn.
    ///
    /// `cancel` aborts the completion call when it flips to `true`, e.g.
    /// when the client disconnects.
    pub async fn run(
        &self,
        turn: &ChatTurn,
        cancel: Option<watch::Receiver<bool>>,
    ) -> Result<RagOutcome, RagError> {
        let query = turn.query().ok_or(RagError::EmptyQuery)?;
        let span = tracing::info_span!(
            "rag",
            use_rag = turn.use_rag,
            messages = turn.messages.len()
        );

        async move {
            let (passages, sources) = if turn.use_rag {
                let docs = self
                    .retrieve(query, turn.similarity_metric.as_deref())
                    .await?;

                if docs.is_empty() {
                    tracing::info!("No relevant documents, skipping completion");
                    return Ok(RagOutcome::NoRelevantContext(NO_CONTEXT_APOLOGY.to_string()));
                }

                let sources = extract_sources(&docs);
                let passages: Vec<String> = docs.into_iter().map(|doc| doc.text).collect();
                (passages, sources)
            } else {
                (Vec::new(), Vec::new())
            };

            let messages = self
                .assembler
                .assemble(&passages, &turn.messages)
                .map_err(|e| RagError::Prompt(e.to_string()))?;

            let model = turn
                .model
                .as_deref()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(self.settings.model.as_str());
            let request = CompletionRequest::new(model, messages, self.settings.max_tokens);

            let answer = complete_with_deadline(
                self.completion.as_ref(),
                &request,
                self.settings.timeout,
                cancel,
            )
            .await?;

            tracing::info!(
                "Answered with {} chars and {} sources",
                answer.len(),
                sources.len()
            );
            Ok(RagOutcome::Answered(package(&answer, &sources)))
        }
        .instrument(span)
        .await
    }

    /// Embed `query` and search the knowledge base.
    pub async fn retrieve(
        &self,
        query: &str,
        similarity_metric: Option<&str>,
    ) -> Result<Vec<RetrievedDocument>, RagError> {
        let vector = self.embedder.embed(query).await?;
        tracing::debug!(
            "Embedded query with '{}' ({} dims)",
            self.embedder.model_name(),
            vector.len()
        );

        let params = SearchParams::new(
            self.settings.top_k,
            self.settings.threshold,
            self.settings.namespace.clone(),
        )
        .with_similarity_metric(similarity_metric);

        Ok(self.retriever.search(vector, &params).await?)
    }
}
