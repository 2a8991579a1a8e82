//! Serve command handler.
//!
//! Runs the HTTP API until Ctrl-C.

use clap::Args;
use ragbot_core::{config::AppConfig, AppResult};
use ragbot_knowledge::RagService;
use ragbot_server::{router, AppState};
use std::sync::Arc;

/// Run the HTTP API
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Address to bind (overrides config)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,
}

impl ServeCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing serve command");

        config.ensure_upload_dir()?;
        let service = Arc::new(RagService::new(config).await?);
        tracing::info!(
            "Serving collection '{}' (embeddings: {}, chat model: {})",
            service.collection_name(),
            service.embedding_model(),
            service.chat_model().unwrap_or("not configured")
        );
        let state = Arc::new(AppState::new(
            service,
            config.upload_dir.clone(),
            config.max_upload_bytes,
        ));

        let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
        tracing::info!("Listening on http://{}", listener.local_addr()?);

        axum::serve(listener, router(state))
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => tracing::error!("Failed to listen for shutdown signal: {}", e),
    }
}
