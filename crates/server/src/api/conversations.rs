use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use sage_memory::ConversationMessage;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreConversationRequest {
    pub action: Option<String>,
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub messages: Vec<ConversationMessage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationQuery {
    pub conversation_id: Option<String>,
}

fn non_empty(id: Option<String>) -> Option<String> {
    id.filter(|id| !id.trim().is_empty())
}

/// `POST {action: "store", conversationId, messages}`.
pub async fn store_conversation(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<StoreConversationRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    if request.action.as_deref() != Some("store") {
        return Err(ApiError::BadRequest("Invalid action".to_string()));
    }
    let conversation_id = non_empty(request.conversation_id)
        .ok_or_else(|| ApiError::BadRequest("Missing conversationId".to_string()))?;

    let ack = state
        .conversations
        .store(&conversation_id, &request.messages)
        .await;

    Ok(Json(ack))
}

/// `GET ?conversationId=<id>`.
///
/// Store failures still answer 200 with an empty list so history loading
/// never breaks the chat.
pub async fn fetch_conversation(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConversationQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let conversation_id = non_empty(query.conversation_id)
        .ok_or_else(|| ApiError::BadRequest("Missing conversationId".to_string()))?;

    let body = match state.conversations.fetch(&conversation_id).await {
        Ok(messages) => json!({ "messages": messages }),
        Err(e) => {
            tracing::warn!("Failed to fetch conversation '{}': {}", conversation_id, e);
            json!({
                "messages": [],
                "error": "Failed to fetch conversation",
                "details": e.to_string(),
            })
        }
    };

    Ok(Json(body))
}
