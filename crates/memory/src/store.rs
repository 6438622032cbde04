//! Memory store abstraction.

use crate::types::{MemoryEntry, MemoryQuery, MemoryRecord};
use sage_core::AppError;
use thiserror::Error;

/// Failure talking to the memory store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("memory store returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("memory store unreachable: {0}")]
    Transport(String),

    #[error("invalid memory store response: {0}")]
    InvalidResponse(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Memory(err.to_string())
    }
}

/// Remote store of conversation messages.
#[async_trait::async_trait]
pub trait MemoryStore: Send + Sync {
    /// Persist one message.
    async fn put(&self, record: &MemoryRecord) -> Result<(), StoreError>;

    /// List memories matching `query`, in no particular order.
    async fn list(&self, query: &MemoryQuery) -> Result<Vec<MemoryEntry>, StoreError>;
}
