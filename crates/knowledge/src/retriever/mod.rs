//! Similarity search against the remote vector store.
//!
//! A failed search is a hard error: the pipeline never falls back to an
//! ungrounded answer. A successful search with zero hits is not an error.

pub mod http;

pub use http::HttpVectorStore;

use crate::types::{QueryVector, RetrievedDocument, SearchParams, VectorHit};
use sage_core::AppError;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;

/// Failure talking to the vector store.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("vector search failed with status {status}: {body}")]
    Unavailable { status: u16, body: String },

    #[error("vector store unreachable: {0}")]
    Transport(String),

    #[error("invalid vector search response: {0}")]
    InvalidResponse(String),
}

impl From<RetrievalError> for AppError {
    fn from(err: RetrievalError) -> Self {
        AppError::Knowledge(err.to_string())
    }
}

/// Wire body of a vector search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRequest {
    pub query_vector: QueryVector,
    pub limit: usize,
    pub threshold: f32,
    pub namespace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_metadata: Option<Map<String, Value>>,
}

impl SearchRequest {
    pub fn new(vector: QueryVector, params: &SearchParams) -> Self {
        Self {
            query_vector: vector,
            limit: params.top_k,
            threshold: params.threshold,
            namespace: params.namespace.clone(),
            filter_metadata: params.metadata_filter.clone(),
        }
    }
}

/// A vector store that answers similarity searches.
#[async_trait::async_trait]
pub trait VectorStore: Send + Sync {
    /// Store name for logs.
    fn store_name(&self) -> &str;

    /// Run one search and return the raw hits in ranked order.
    async fn search(&self, request: &SearchRequest) -> Result<Vec<VectorHit>, RetrievalError>;
}

/// Runs searches and normalizes the hits into documents.
#[derive(Clone)]
pub struct Retriever {
    store: Arc<dyn VectorStore>,
}

impl Retriever {
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self { store }
    }

    /// Search for passages similar to `vector`.
    ///
    /// The store's ranking is kept. Hits with no text, or with a reported
    /// score under the threshold, are dropped and the list is capped at
    /// `top_k`.
    pub async fn search(
        &self,
        vector: QueryVector,
        params: &SearchParams,
    ) -> Result<Vec<RetrievedDocument>, RetrievalError> {
        tracing::info!(
            "Searching '{}' (namespace: {}, top_k: {}, threshold: {:.2})",
            self.store.store_name(),
            params.namespace,
            params.top_k,
            params.threshold
        );

        let request = SearchRequest::new(vector, params);
        let hits = self.store.search(&request).await.map_err(|e| {
            tracing::error!("Vector search failed: {}", e);
            e
        })?;
        let raw_count = hits.len();

        let documents: Vec<RetrievedDocument> = hits
            .into_iter()
            .map(VectorHit::into_document)
            .filter(|doc| !doc.text.trim().is_empty())
            .filter(|doc| doc.score.map_or(true, |s| s >= params.threshold))
            .take(params.top_k)
            .collect();

        tracing::info!(
            "Found {} relevant documents ({} raw hits)",
            documents.len(),
            raw_count
        );
        if let Some(first) = documents.first() {
            tracing::debug!("Top document: {:?}", first);
        }

        Ok(documents)
    }
}
