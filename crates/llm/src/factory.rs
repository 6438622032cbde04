//! Completion client factory.
//!
//! Resolves a provider name plus endpoint and credentials into a shared
//! client handle.

use crate::client::ChatCompletionClient;
use crate::providers::OpenAiCompatClient;
use std::sync::Arc;

/// Create a completion client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("openai-compatible", "openai", "meta")
/// * `endpoint` - Base URL of the completion API
/// * `api_key` - Bearer token
///
/// # Errors
/// Returns error if the provider is unknown or endpoint/key are missing.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
) -> Result<Arc<dyn ChatCompletionClient>, String> {
    match provider.to_lowercase().as_str() {
        "openai-compatible" | "openai" | "meta" => {
            let endpoint = endpoint
                .filter(|e| !e.trim().is_empty())
                .ok_or_else(|| "Completion provider requires an endpoint".to_string())?;
            let api_key = api_key
                .filter(|k| !k.trim().is_empty())
                .ok_or_else(|| "Completion provider requires API key".to_string())?;
            Ok(Arc::new(OpenAiCompatClient::new(endpoint, api_key)))
        }
        _ => Err(format!("Unknown provider: {}", provider)),
    }
}
