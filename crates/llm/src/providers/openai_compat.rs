//! OpenAI-compatible chat-completion provider.
//!
//! Talks to any endpoint implementing `POST {base}/chat/completions` with
//! bearer authentication, such as hosted Llama deployments.

use crate::client::{ChatCompletionClient, CompletionError, CompletionRequest};
use serde::Deserialize;

/// OpenAI-style response body; only the fields we read.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// OpenAI-compatible completion client.
pub struct OpenAiCompatClient {
    /// Base URL, e.g. "https://api.example.com/v1"
    base_url: String,

    /// Bearer token
    api_key: String,

    /// HTTP client
    client: reqwest::Client,
}

impl OpenAiCompatClient {
    /// Create a new client for the given endpoint and token.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

/// Extract the first choice's text; a missing choice yields an empty answer.
fn first_choice_content(response: ChatCompletionResponse) -> String {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .unwrap_or_default()
}

#[async_trait::async_trait]
impl ChatCompletionClient for OpenAiCompatClient {
    fn provider_name(&self) -> &str {
        "openai-compatible"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        tracing::info!(
            "Sending completion request (model: {}, messages: {})",
            request.model,
            request.messages.len()
        );
        tracing::debug!("Request: {:?}", request);

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!("Completion API error ({}): {}", status, body);
            return Err(CompletionError::Status { status, body });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::InvalidResponse(e.to_string()))?;

        let content = first_choice_content(parsed);
        tracing::info!("Received completion ({} chars)", content.len());

        Ok(content)
    }
}
