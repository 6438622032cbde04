//! Deadline and cancellation guard for completion calls.
//!
//! The guard races the provider call against a timer and an optional
//! caller-owned cancel signal. Whichever loses is dropped, which for the
//! HTTP client aborts the in-flight request.

use crate::client::{ChatCompletionClient, CompletionError, CompletionRequest};
use std::time::Duration;
use tokio::sync::watch;

/// Run one completion with a hard deadline.
///
/// # Arguments
/// * `client` - Provider to call
/// * `request` - Prompt and limits
/// * `timeout` - Deadline for the whole call
/// * `cancel` - Optional signal; flipping it to `true` aborts the call
///
/// # Errors
/// * `CompletionError::Timeout` when the deadline elapses first
/// * `CompletionError::Cancelled` when the caller aborts first
/// * whatever the provider returned otherwise
pub async fn complete_with_deadline(
    client: &dyn ChatCompletionClient,
    request: &CompletionRequest,
    timeout: Duration,
    cancel: Option<watch::Receiver<bool>>,
) -> Result<String, CompletionError> {
    let timeout_ms = timeout.as_millis() as u64;

    tokio::select! {
        result = tokio::time::timeout(timeout, client.complete(request)) => match result {
            Ok(answer) => answer,
            Err(_) => {
                tracing::warn!(
                    "Completion via '{}' exceeded {} ms, request cancelled",
                    client.provider_name(),
                    timeout_ms
                );
                Err(CompletionError::Timeout { timeout_ms })
            }
        },
        _ = cancelled(cancel) => {
            tracing::info!("Completion cancelled by caller");
            Err(CompletionError::Cancelled)
        }
    }
}

/// Resolve once the signal reads `true`; never resolve without a signal.
async fn cancelled(signal: Option<watch::Receiver<bool>>) {
    let Some(mut rx) = signal else {
        return std::future::pending().await;
    };

    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            // Sender gone without cancelling
            return std::future::pending().await;
        }
    }
}
