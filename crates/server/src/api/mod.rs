//! HTTP API.

pub mod chat;
pub mod conversations;
pub mod health;

use crate::state::AppState;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Build the application router.
///
/// - `GET /health`
/// - `POST /api/chat` answers one chat turn as plain text
/// - `GET|POST /api/conversations` loads or stores conversation history
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/chat", post(chat::chat))
        .route(
            "/api/conversations",
            get(conversations::fetch_conversation).post(conversations::store_conversation),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
