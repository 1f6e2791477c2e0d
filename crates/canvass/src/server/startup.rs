//! REST server startup and configuration

use anyhow::{Context, Result};
use axum::serve;
use bentley::daemon_logs::DaemonLogs;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::CanvassConfig;
use crate::server::routing::create_router;
use crate::server::services::embeddings::GeminiEmbeddingClient;
use crate::server::services::feedback_store::JsonlFeedbackStore;
use crate::server::services::generation::GeminiGenerationClient;
use crate::server::services::vector_index::PineconeIndex;
use crate::server::state::AppState;

const COMPONENT: &str = "canvass-server";

/// Construct every collaborator once; connecting to the index may create it
pub async fn build_state(config: &CanvassConfig) -> Result<AppState> {
  let logs = Arc::new(
    DaemonLogs::new(config.server_logs_path()).context("Failed to open the server log file")?,
  );

  let store = Arc::new(JsonlFeedbackStore::new(config.feedback_dir()));
  let embedder = Arc::new(GeminiEmbeddingClient::new(&config.embedding)?);
  let generator = Arc::new(GeminiGenerationClient::new(&config.generation)?);
  let index = Arc::new(
    PineconeIndex::connect(&config.index)
      .await
      .with_context(|| format!("Failed to connect to vector index '{}'", config.index.name))?,
  );

  Ok(AppState::new(config, store, embedder, index, generator, logs))
}

/// Start the REST server
pub async fn start_server(config: CanvassConfig) -> Result<()> {
  let addr = config.server.bind;
  let state = build_state(&config).await?;
  let daemon_logs = state.logs.clone();

  daemon_logs.info(&format!("Starting canvass REST server on {addr}"), COMPONENT).await;

  let app = create_router(state).layer(
    ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()),
  );

  let listener = TcpListener::bind(addr).await?;
  daemon_logs.info(&format!("Server listening on {addr}"), COMPONENT).await;

  match serve(listener, app).await {
    Ok(_) => {
      daemon_logs.info("Server shutdown gracefully", COMPONENT).await;
      Ok(())
    }
    Err(e) => {
      daemon_logs.error(&format!("Server error: {e}"), COMPONENT).await;
      Err(anyhow::anyhow!("Server error: {e}"))
    }
  }
}
