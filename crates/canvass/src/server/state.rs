//! Shared application state injected into every handler

use bentley::daemon_logs::DaemonLogs;
use std::sync::Arc;
use std::time::Duration;

use crate::config::CanvassConfig;
use crate::server::services::embeddings::EmbeddingClient;
use crate::server::services::feedback_store::FeedbackStore;
use crate::server::services::generation::GenerativeModel;
use crate::server::services::ingest::FeedbackIngestor;
use crate::server::services::orchestrator::QueryOrchestrator;
use crate::server::services::vector_index::VectorIndex;

/// Static facts about the running service, reported by /status
#[derive(Debug, Clone)]
pub struct ServiceInfo {
  pub data_dir: String,
  pub index_name: String,
  pub dimension: usize,
  pub embedding_model: String,
  pub generation_model: String,
}

impl ServiceInfo {
  pub fn from_config(config: &CanvassConfig) -> Self {
    Self {
      data_dir: config.data_dir.to_string_lossy().to_string(),
      index_name: config.index.name.clone(),
      dimension: config.index.dimension,
      embedding_model: config.embedding.model.clone(),
      generation_model: config.generation.model.clone(),
    }
  }
}

/// Collaborators are constructed once at startup and shared by all requests
#[derive(Clone)]
pub struct AppState {
  pub orchestrator: Arc<QueryOrchestrator>,
  pub ingestor: Arc<FeedbackIngestor>,
  pub store: Arc<dyn FeedbackStore>,
  pub store_timeout: Duration,
  pub logs: Arc<DaemonLogs>,
  pub info: Arc<ServiceInfo>,
}

impl AppState {
  pub fn new(
    config: &CanvassConfig,
    store: Arc<dyn FeedbackStore>,
    embedder: Arc<dyn EmbeddingClient>,
    index: Arc<dyn VectorIndex>,
    generator: Arc<dyn GenerativeModel>,
    logs: Arc<DaemonLogs>,
  ) -> Self {
    let orchestrator = QueryOrchestrator::from_config(
      config,
      store.clone(),
      embedder.clone(),
      index.clone(),
      generator,
    );
    let ingestor = FeedbackIngestor::from_config(config, store.clone(), embedder, index);

    Self {
      orchestrator: Arc::new(orchestrator),
      ingestor: Arc::new(ingestor),
      store,
      store_timeout: Duration::from_secs(config.store.timeout_secs),
      logs,
      info: Arc::new(ServiceInfo::from_config(config)),
    }
  }
}
