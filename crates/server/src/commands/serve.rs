//! Serve command: run the HTTP API.

use crate::api;
use crate::state::AppState;
use clap::Args;
use sage_core::{config::AppConfig, AppResult};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Run the chat and conversation API
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Address to listen on (default: 127.0.0.1:3000)
    #[arg(short, long)]
    pub bind: Option<String>,
}

impl ServeCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let state = Arc::new(AppState::from_config(config)?);
        let app = api::router(state);

        let listener = TcpListener::bind(&config.server.bind).await?;
        tracing::info!("Listening on http://{}", listener.local_addr()?);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
