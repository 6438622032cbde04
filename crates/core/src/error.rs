//! Error types for Sage.
//!
//! This module defines a unified error enum that covers all error categories
//! in the application. Pipeline stages keep their own narrower error types
//! and convert into `AppError` at crate boundaries.

use thiserror::Error;

/// Unified error type for Sage.
///
/// We never panic outside tests; errors are represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Chat-completion errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Embedding, retrieval and RAG errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Conversation store errors
    #[error("Memory error: {0}")]
    Memory(String),

    /// Prompt assembly errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
