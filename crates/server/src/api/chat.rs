use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use sage_knowledge::{ChatTurn, RagOutcome};
use std::sync::Arc;

/// Answer one chat turn.
///
/// Success is always `text/plain`: the answer with its sources trailer, or
/// the fixed apology when nothing relevant was found. If the client goes
/// away the handler future is dropped, which drops the in-flight
/// completion call with it.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatTurn>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(turn) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let outcome = state.pipeline.run(&turn, None).await?;
    if let RagOutcome::NoRelevantContext(_) = &outcome {
        tracing::info!("Chat answered with apology (no relevant context)");
    }

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        outcome.into_body(),
    ))
}
