//! HTTP vector store client.
//!
//! `POST {base}/v1/public/{project}/database/vectors/search`, authenticated
//! with an `X-API-Key` header; the response carries hits under `vectors`.

use crate::retriever::{RetrievalError, SearchRequest, VectorStore};
use crate::types::VectorHit;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    vectors: Vec<VectorHit>,
}

/// Vector store reached over HTTP.
pub struct HttpVectorStore {
    base_url: String,
    project_id: String,
    api_key: String,
    client: reqwest::Client,
}

impl HttpVectorStore {
    pub fn new(
        base_url: impl Into<String>,
        project_id: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RetrievalError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RetrievalError::Transport(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            project_id: project_id.into(),
            api_key: api_key.into(),
            client,
        })
    }

    fn search_url(&self) -> String {
        format!(
            "{}/v1/public/{}/database/vectors/search",
            self.base_url, self.project_id
        )
    }
}

#[async_trait::async_trait]
impl VectorStore for HttpVectorStore {
    fn store_name(&self) -> &str {
        "http"
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<VectorHit>, RetrievalError> {
        tracing::debug!(
            "POST {} ({} dims)",
            self.search_url(),
            request.query_vector.len()
        );

        let response = self
            .client
            .post(self.search_url())
            .header("X-API-Key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| RetrievalError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Unavailable { status, body });
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::InvalidResponse(e.to_string()))?;

        Ok(parsed.vectors)
    }
}
