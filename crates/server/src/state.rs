//! Shared server state and its construction from configuration.

use sage_core::{AppConfig, AppError, AppResult};
use sage_knowledge::{
    create_provider, EmbeddingProvider, HttpVectorStore, RagPipeline, RagSettings, Retriever,
};
use sage_llm::create_client;
use sage_memory::{ConversationStore, HttpMemoryStore};
use sage_prompt::{load_prompt_or_default, PromptAssembler, GROUNDED_PROMPT_ID};
use std::sync::Arc;
use std::time::Duration;

/// State shared by every request handler.
pub struct AppState {
    pub pipeline: RagPipeline,
    pub conversations: ConversationStore,
}

impl AppState {
    pub fn new(pipeline: RagPipeline, conversations: ConversationStore) -> Self {
        Self {
            pipeline,
            conversations,
        }
    }

    /// Build the pipeline and conversation store from a validated config.
    ///
    /// The embedding model is not loaded here; it loads on the first chat
    /// request and stays loaded for the life of the process.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        config.validate()?;

        Ok(Self::new(build_pipeline(config)?, build_conversations(config)?))
    }
}

fn required<'a>(value: Option<&'a str>, name: &str) -> AppResult<&'a str> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Config(format!("Missing required setting: {}", name)))
}

/// Embedding provider for the configured model.
pub fn build_embedder(config: &AppConfig) -> AppResult<Arc<dyn EmbeddingProvider>> {
    let embedder = create_provider(&config.embedding)?;
    tracing::debug!(
        "Embedding provider '{}' with model '{}'",
        embedder.provider_name(),
        embedder.model_name()
    );
    Ok(embedder)
}

/// Retriever backed by the configured vector store.
pub fn build_retriever(config: &AppConfig) -> AppResult<Retriever> {
    let store = HttpVectorStore::new(
        required(config.vector.base_url.as_deref(), "vector.baseUrl")?,
        required(config.vector.project_id.as_deref(), "vector.projectId")?,
        required(config.vector.api_key.as_deref(), "vector.apiKey")?,
        Duration::from_secs(config.vector.request_timeout_secs),
    )?;

    Ok(Retriever::new(Arc::new(store)))
}

/// The full answering pipeline.
pub fn build_pipeline(config: &AppConfig) -> AppResult<RagPipeline> {
    let completion = create_client(
        "openai-compatible",
        config.completion.base_url.as_deref(),
        config.completion.api_key.as_deref(),
    )
    .map_err(AppError::Config)?;

    let definition = load_prompt_or_default(&config.workspace, GROUNDED_PROMPT_ID)?;
    let assembler = PromptAssembler::new(&definition)?;

    Ok(RagPipeline::new(
        build_embedder(config)?,
        build_retriever(config)?,
        Arc::new(assembler),
        completion,
        RagSettings::from_config(config),
    ))
}

/// Conversation store, reusing the vector store's endpoint and credentials
/// where the memory section leaves them unset.
pub fn build_conversations(config: &AppConfig) -> AppResult<ConversationStore> {
    let store = HttpMemoryStore::new(
        required(config.memory_base_url(), "memory.baseUrl")?,
        required(config.memory_project_id(), "memory.projectId")?,
        required(config.memory_api_key(), "memory.apiKey")?,
        Duration::from_secs(config.memory.request_timeout_secs),
    )?;

    Ok(ConversationStore::new(
        Arc::new(store),
        config.memory.agent_id.clone(),
    ))
}
