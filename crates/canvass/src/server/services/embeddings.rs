//! Text embeddings from an external model
//!
//! The production client calls the Gemini `embedContent` API. Retries are
//! applied by callers through the retry policy; this client makes one
//! attempt bounded by its configured timeout.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::EmbeddingConfig;
use crate::error::{Dependency, PipelineError, Result};
use crate::server::services::retry::with_timeout;

/// Turns free text into a fixed-length vector
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
  async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

#[derive(Debug, Serialize)]
struct EmbedContentRequest<'a> {
  model: String,
  content: Content<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
  parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
  text: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
  embedding: EmbeddingValues,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
  values: Vec<f32>,
}

/// Gemini embedding API client
pub struct GeminiEmbeddingClient {
  client: reqwest::Client,
  endpoint: String,
  model: String,
  api_key: String,
  timeout: Duration,
}

impl GeminiEmbeddingClient {
  pub fn new(config: &EmbeddingConfig) -> anyhow::Result<Self> {
    let api_key = config
      .api_key
      .clone()
      .ok_or_else(|| anyhow::anyhow!("No embedding API key configured (set GEMINI_API_KEY)"))?;

    let timeout = Duration::from_secs(config.timeout_secs);
    let client = reqwest::Client::builder().timeout(timeout).build()?;

    Ok(Self {
      client,
      endpoint: config.endpoint.trim_end_matches('/').to_string(),
      model: config.model.clone(),
      api_key,
      timeout,
    })
  }

  async fn request_embedding(&self, text: &str) -> Result<Vec<f32>> {
    let url = format!("{}/models/{}:embedContent", self.endpoint, self.model);
    let request = EmbedContentRequest {
      model: format!("models/{}", self.model),
      content: Content { parts: vec![Part { text }] },
    };

    let response = self
      .client
      .post(&url)
      .header("x-goog-api-key", &self.api_key)
      .json(&request)
      .send()
      .await
      .map_err(|e| self.transport_error(e))?;

    if !response.status().is_success() {
      let status = response.status();
      let body = response.text().await.unwrap_or_default();
      return Err(PipelineError::from_status(Dependency::Embedding, status, &body));
    }

    let result: EmbedContentResponse = response
      .json()
      .await
      .map_err(|e| PipelineError::EmbeddingService(format!("Invalid response: {e}")))?;

    if result.embedding.values.is_empty() {
      return Err(PipelineError::EmbeddingService("Service returned an empty vector".to_string()));
    }

    tracing::trace!(dimension = result.embedding.values.len(), "received embedding");
    Ok(result.embedding.values)
  }

  fn transport_error(&self, error: reqwest::Error) -> PipelineError {
    if error.is_timeout() {
      PipelineError::DependencyTimeout { dependency: Dependency::Embedding, after: self.timeout }
    } else {
      PipelineError::EmbeddingService(error.to_string())
    }
  }
}

#[async_trait]
impl EmbeddingClient for GeminiEmbeddingClient {
  async fn embed(&self, text: &str) -> Result<Vec<f32>> {
    if text.trim().is_empty() {
      return Err(PipelineError::Validation("Cannot embed empty text".to_string()));
    }

    with_timeout(Dependency::Embedding, self.timeout, self.request_embedding(text)).await
  }
}
