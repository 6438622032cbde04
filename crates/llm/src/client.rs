//! Chat-completion client abstraction and request/error types.
//!
//! This module defines the seam between the RAG pipeline and whatever hosts
//! the language model. Implementations perform exactly one call per
//! `complete`; retries are deliberately absent.

use crate::types::ChatMessage;
use sage_core::AppError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Chat-completion request, serialized as the OpenAI-style request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Model identifier
    pub model: String,

    /// Full prompt, system message first
    pub messages: Vec<ChatMessage>,

    /// Response length cap
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Create a new completion request.
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            messages,
            max_tokens,
        }
    }
}

/// Failure of a single completion call.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// The deadline elapsed and the in-flight call was dropped.
    #[error("completion timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    /// The caller aborted the request before a response arrived.
    #[error("completion cancelled by caller")]
    Cancelled,

    /// The endpoint answered with a non-success status.
    #[error("completion API error ({status}): {body}")]
    Status { status: u16, body: String },

    /// The request never produced an HTTP response.
    #[error("failed to reach completion API: {0}")]
    Transport(String),

    /// The response body was not the expected shape.
    #[error("invalid completion response: {0}")]
    InvalidResponse(String),
}

impl CompletionError {
    /// Whether this failure was caused by the deadline rather than the remote side.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl From<CompletionError> for AppError {
    fn from(err: CompletionError) -> Self {
        AppError::Llm(err.to_string())
    }
}

/// Trait for chat-completion providers.
#[async_trait::async_trait]
pub trait ChatCompletionClient: Send + Sync {
    /// Get the provider name (e.g., "openai-compatible").
    fn provider_name(&self) -> &str;

    /// Perform a single non-streaming completion and return the answer text.
    ///
    /// Dropping the returned future must abandon the underlying request.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}
