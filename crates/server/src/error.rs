//! HTTP error responses.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use sage_knowledge::{RagError, KNOWLEDGE_UNAVAILABLE_MESSAGE};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("knowledge base unavailable")]
    KnowledgeUnavailable,

    #[error("upstream timeout: {0}")]
    GatewayTimeout(String),

    #[error("upstream error: {0}")]
    BadGateway(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::KnowledgeUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::GatewayTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RagError> for ApiError {
    fn from(err: RagError) -> Self {
        match err {
            RagError::EmptyQuery => ApiError::BadRequest("No message to answer".to_string()),
            RagError::RetrievalUnavailable(_) => ApiError::KnowledgeUnavailable,
            RagError::Completion(e) if e.is_timeout() => ApiError::GatewayTimeout(e.to_string()),
            RagError::Completion(e) => ApiError::BadGateway(e.to_string()),
            RagError::Embedding(e) => ApiError::Internal(e.to_string()),
            RagError::Prompt(msg) => ApiError::Internal(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let message = match self {
            ApiError::KnowledgeUnavailable => KNOWLEDGE_UNAVAILABLE_MESSAGE.to_string(),
            ApiError::BadRequest(msg)
            | ApiError::GatewayTimeout(msg)
            | ApiError::BadGateway(msg)
            | ApiError::Internal(msg) => msg,
        };

        if status.is_server_error() {
            tracing::error!("Request failed ({}): {}", status.as_u16(), message);
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}
