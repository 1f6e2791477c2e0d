//! Generative model client (prompt in, text out)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::GenerationConfig;
use crate::error::{Dependency, PipelineError, Result};
use crate::server::services::retry::with_timeout;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerativeModel: Send + Sync {
  async fn generate(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
  contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
  parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
  text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
  #[serde(default)]
  candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
  #[serde(default)]
  content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
  #[serde(default)]
  parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
  #[serde(default)]
  text: Option<String>,
}

impl GenerateContentResponse {
  /// Concatenated text parts of the first candidate
  fn into_text(self) -> Option<String> {
    let content = self.candidates.into_iter().next()?.content?;
    let text: String = content.parts.into_iter().filter_map(|part| part.text).collect();
    if text.trim().is_empty() {
      None
    } else {
      Some(text)
    }
  }
}

/// Gemini `generateContent` client, non-streaming
pub struct GeminiGenerationClient {
  client: reqwest::Client,
  endpoint: String,
  model: String,
  api_key: String,
  timeout: Duration,
}

impl GeminiGenerationClient {
  pub fn new(config: &GenerationConfig) -> anyhow::Result<Self> {
    let api_key = config
      .api_key
      .clone()
      .ok_or_else(|| anyhow::anyhow!("No generation API key configured (set GEMINI_API_KEY)"))?;

    let timeout = Duration::from_secs(config.timeout_secs);

    Ok(Self {
      client: reqwest::Client::builder().timeout(timeout).build()?,
      endpoint: config.endpoint.trim_end_matches('/').to_string(),
      model: config.model.clone(),
      api_key,
      timeout,
    })
  }

  async fn request_generation(&self, prompt: &str) -> Result<String> {
    let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);
    let request = GenerateContentRequest {
      contents: vec![RequestContent { parts: vec![RequestPart { text: prompt }] }],
    };

    let response = self
      .client
      .post(&url)
      .header("x-goog-api-key", &self.api_key)
      .json(&request)
      .send()
      .await
      .map_err(|e| {
        if e.is_timeout() {
          PipelineError::DependencyTimeout {
            dependency: Dependency::Generation,
            after: self.timeout,
          }
        } else {
          PipelineError::GenerationService(e.to_string())
        }
      })?;

    if !response.status().is_success() {
      let status = response.status();
      let body = response.text().await.unwrap_or_default();
      return Err(PipelineError::from_status(Dependency::Generation, status, &body));
    }

    let result: GenerateContentResponse = response
      .json()
      .await
      .map_err(|e| PipelineError::GenerationService(format!("Invalid response: {e}")))?;

    result
      .into_text()
      .ok_or_else(|| PipelineError::GenerationService("Model returned no text".to_string()))
  }
}

#[async_trait]
impl GenerativeModel for GeminiGenerationClient {
  async fn generate(&self, prompt: &str) -> Result<String> {
    tracing::debug!(model = %self.model, prompt_chars = prompt.len(), "requesting generation");
    with_timeout(Dependency::Generation, self.timeout, self.request_generation(prompt)).await
  }
}
