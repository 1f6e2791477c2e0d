//! Vector index gateway
//!
//! Stores one vector per feedback record, keyed by the record's id, and
//! answers nearest-neighbour queries. The production implementation talks to
//! a Pinecone serverless index over HTTP.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::json;
use std::time::Duration;

use crate::config::IndexConfig;
use crate::error::{Dependency, PipelineError, Result};
use crate::server::services::retry::with_timeout;

/// Metadata stored next to each vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorMetadata {
  pub customer_name: String,
  pub feedback: String,
  #[serde(deserialize_with = "rating_from_number")]
  pub rating: u8,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub created_at: Option<DateTime<Utc>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub form_id: Option<String>,
}

/// One nearest-neighbour hit
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatch {
  pub id: String,
  /// Higher is more similar
  pub score: f32,
  /// None when metadata was not requested or could not be read
  pub metadata: Option<VectorMetadata>,
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
  /// Length every stored and queried vector must have
  fn dimension(&self) -> usize;

  /// Insert or replace the vector stored under `id`
  async fn upsert(&self, id: &str, vector: &[f32], metadata: &VectorMetadata) -> Result<()>;

  /// Up to `top_k` matches ordered by descending score
  async fn query(
    &self,
    vector: &[f32],
    top_k: usize,
    include_metadata: bool,
    form_id: Option<&str>,
  ) -> Result<Vec<SimilarityMatch>>;
}

/// Reject vectors whose length differs from the index dimension
pub fn ensure_dimension(vector: &[f32], expected: usize) -> Result<()> {
  if vector.len() == expected {
    Ok(())
  } else {
    Err(PipelineError::DimensionMismatch { expected, actual: vector.len() })
  }
}

// Pinecone wire types
// ===================

#[derive(Debug, Deserialize)]
struct IndexDescription {
  dimension: usize,
  #[serde(default)]
  host: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
  #[serde(default)]
  matches: Vec<RawMatch>,
}

#[derive(Debug, Deserialize)]
struct RawMatch {
  id: String,
  #[serde(default)]
  score: f32,
  #[serde(default)]
  metadata: Option<serde_json::Value>,
}

impl From<RawMatch> for SimilarityMatch {
  fn from(raw: RawMatch) -> Self {
    // Vectors written by other tools may carry partial metadata
    let metadata = raw.metadata.and_then(|value| serde_json::from_value(value).ok());
    SimilarityMatch { id: raw.id, score: raw.score, metadata }
  }
}

fn rating_from_number<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
  D: Deserializer<'de>,
{
  // Pinecone returns every numeric metadata value as a float
  let value = f64::deserialize(deserializer)?;
  if !(0.0..=255.0).contains(&value) {
    return Err(serde::de::Error::custom(format!("rating out of range: {value}")));
  }
  Ok(value.round() as u8)
}

/// Pinecone serverless index client
pub struct PineconeIndex {
  client: reqwest::Client,
  host: String,
  api_key: String,
  api_version: String,
  dimension: usize,
  timeout: Duration,
}

impl PineconeIndex {
  /// Resolve the data-plane host for the configured index, creating the
  /// index when it does not exist yet. An explicitly configured host is used
  /// as-is without contacting the control plane.
  pub async fn connect(config: &IndexConfig) -> Result<Self> {
    let api_key = config.api_key.clone().ok_or_else(|| {
      PipelineError::IndexUnavailable("No index API key configured (set PINECONE_API_KEY)".into())
    })?;

    let timeout = Duration::from_secs(config.timeout_secs);
    let client = reqwest::Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| PipelineError::IndexUnavailable(e.to_string()))?;

    let mut index = Self {
      client,
      host: String::new(),
      api_key,
      api_version: config.api_version.clone(),
      dimension: config.dimension,
      timeout,
    };

    index.host = match &config.host {
      Some(host) => normalize_host(host),
      None => index.resolve_host(config).await?,
    };

    tracing::debug!(index = %config.name, host = %index.host, "vector index ready");
    Ok(index)
  }

  async fn resolve_host(&self, config: &IndexConfig) -> Result<String> {
    let control_plane = config.control_plane.trim_end_matches('/');

    let description = match self.describe(control_plane, &config.name).await? {
      Some(description) => description,
      None => {
        bentley::info!("Creating vector index '{}' ({} dimensions)", config.name, config.dimension);
        self.create(control_plane, config).await?
      }
    };

    if description.dimension != config.dimension {
      return Err(PipelineError::DimensionMismatch {
        expected: config.dimension,
        actual: description.dimension,
      });
    }

    description
      .host
      .filter(|host| !host.is_empty())
      .map(|host| normalize_host(&host))
      .ok_or_else(|| {
        PipelineError::IndexUnavailable(format!("Index '{}' has no host yet", config.name))
      })
  }

  async fn describe(&self, control_plane: &str, name: &str) -> Result<Option<IndexDescription>> {
    let url = format!("{control_plane}/indexes/{name}");
    let response = with_timeout(Dependency::VectorIndex, self.timeout, async {
      self.request(self.client.get(&url)).send().await.map_err(|e| self.transport_error(e))
    })
    .await?;

    if response.status() == reqwest::StatusCode::NOT_FOUND {
      return Ok(None);
    }

    let response = check_status(response).await?;
    let description = response
      .json::<IndexDescription>()
      .await
      .map_err(|e| PipelineError::IndexUnavailable(format!("Invalid index description: {e}")))?;
    Ok(Some(description))
  }

  async fn create(&self, control_plane: &str, config: &IndexConfig) -> Result<IndexDescription> {
    let url = format!("{control_plane}/indexes");
    let body = json!({
      "name": config.name,
      "dimension": config.dimension,
      "metric": config.metric,
      "spec": { "serverless": { "cloud": config.cloud, "region": config.region } },
    });

    let response = with_timeout(Dependency::VectorIndex, self.timeout, async {
      self
        .request(self.client.post(&url))
        .json(&body)
        .send()
        .await
        .map_err(|e| self.transport_error(e))
    })
    .await?;

    // Another instance created it between our describe and create
    if response.status() == reqwest::StatusCode::CONFLICT {
      return self.describe(control_plane, &config.name).await?.ok_or_else(|| {
        PipelineError::IndexUnavailable(format!("Index '{}' vanished after creation", config.name))
      });
    }

    let response = check_status(response).await?;
    response
      .json::<IndexDescription>()
      .await
      .map_err(|e| PipelineError::IndexUnavailable(format!("Invalid index description: {e}")))
  }

  fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    builder.header("Api-Key", &self.api_key).header("X-Pinecone-API-Version", &self.api_version)
  }

  fn transport_error(&self, error: reqwest::Error) -> PipelineError {
    if error.is_timeout() {
      PipelineError::DependencyTimeout { dependency: Dependency::VectorIndex, after: self.timeout }
    } else {
      PipelineError::IndexUnavailable(error.to_string())
    }
  }

  async fn post_data_plane(
    &self,
    path: &str,
    body: serde_json::Value,
  ) -> Result<reqwest::Response> {
    let url = format!("{}{}", self.host, path);
    with_timeout(Dependency::VectorIndex, self.timeout, async {
      let response = self
        .request(self.client.post(&url))
        .json(&body)
        .send()
        .await
        .map_err(|e| self.transport_error(e))?;
      check_status(response).await
    })
    .await
  }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
  fn dimension(&self) -> usize {
    self.dimension
  }

  async fn upsert(&self, id: &str, vector: &[f32], metadata: &VectorMetadata) -> Result<()> {
    ensure_dimension(vector, self.dimension)?;

    let body = json!({
      "vectors": [{ "id": id, "values": vector, "metadata": metadata }],
    });
    self.post_data_plane("/vectors/upsert", body).await?;

    tracing::debug!(id, "upserted vector");
    Ok(())
  }

  async fn query(
    &self,
    vector: &[f32],
    top_k: usize,
    include_metadata: bool,
    form_id: Option<&str>,
  ) -> Result<Vec<SimilarityMatch>> {
    ensure_dimension(vector, self.dimension)?;

    let mut body = json!({
      "vector": vector,
      "topK": top_k,
      "includeMetadata": include_metadata,
    });
    if let Some(form_id) = form_id {
      body["filter"] = json!({ "formId": { "$eq": form_id } });
    }

    let response = self.post_data_plane("/query", body).await?;
    let result = response
      .json::<QueryResponse>()
      .await
      .map_err(|e| PipelineError::IndexUnavailable(format!("Invalid query response: {e}")))?;

    let mut matches: Vec<SimilarityMatch> = result.matches.into_iter().map(Into::into).collect();
    matches.sort_by(|a, b| b.score.total_cmp(&a.score));
    matches.truncate(top_k);

    tracing::debug!(matches = matches.len(), "vector query complete");
    Ok(matches)
  }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
  if response.status().is_success() {
    return Ok(response);
  }

  let status = response.status();
  let body = response.text().await.unwrap_or_default();
  Err(PipelineError::from_status(Dependency::VectorIndex, status, &body))
}

fn normalize_host(host: &str) -> String {
  let host = host.trim_end_matches('/');
  if host.starts_with("http://") || host.starts_with("https://") {
    host.to_string()
  } else {
    format!("https://{host}")
  }
}
