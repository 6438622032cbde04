//! HTTP memory store client: `{base}/v1/public/{project}/database/memory`.

use crate::store::{MemoryStore, StoreError};
use crate::types::{MemoryEntry, MemoryQuery, MemoryRecord};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    data: Vec<MemoryEntry>,
}

/// Memory store reached over HTTP with an `X-API-Key` header.
pub struct HttpMemoryStore {
    base_url: String,
    project_id: String,
    api_key: String,
    client: reqwest::Client,
}

impl HttpMemoryStore {
    pub fn new(
        base_url: impl Into<String>,
        project_id: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            project_id: project_id.into(),
            api_key: api_key.into(),
            client,
        })
    }

    fn memory_url(&self) -> String {
        format!(
            "{}/v1/public/{}/database/memory",
            self.base_url, self.project_id
        )
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Status { status, body })
    }
}

#[async_trait::async_trait]
impl MemoryStore for HttpMemoryStore {
    async fn put(&self, record: &MemoryRecord) -> Result<(), StoreError> {
        let response = self
            .client
            .post(self.memory_url())
            .header("X-API-Key", &self.api_key)
            .json(record)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        Self::check(response).await?;
        Ok(())
    }

    async fn list(&self, query: &MemoryQuery) -> Result<Vec<MemoryEntry>, StoreError> {
        let response = self
            .client
            .get(self.memory_url())
            .header("X-API-Key", &self.api_key)
            .query(query)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let parsed: ListResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;

        tracing::debug!("Memory store returned {} entries", parsed.data.len());
        Ok(parsed.data)
    }
}
