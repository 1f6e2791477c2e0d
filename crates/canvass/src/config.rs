//! Service configuration
//!
//! Every field has a default so an empty (or missing) YAML file yields a
//! working local setup. API keys are normally supplied through the
//! environment rather than the file.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::server::services::retry::RetryPolicy;

pub const CONFIG_ENV_VAR: &str = "CANVASS_CONFIG";
pub const DATA_DIR_ENV_VAR: &str = "CANVASS_DATA_DIR";
pub const GEMINI_KEY_ENV_VAR: &str = "GEMINI_API_KEY";
pub const PINECONE_KEY_ENV_VAR: &str = "PINECONE_API_KEY";

const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvassConfig {
  pub server: ServerConfig,
  /// Root for the feedback store and server logs
  pub data_dir: PathBuf,
  pub store: StoreConfig,
  pub embedding: EmbeddingConfig,
  pub index: IndexConfig,
  pub generation: GenerationConfig,
  pub retrieval: RetrievalConfig,
  pub retry: RetryConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub bind: SocketAddr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
  pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
  pub endpoint: String,
  pub model: String,
  pub timeout_secs: u64,
  #[serde(skip_serializing)]
  pub api_key: Option<String>,
}

/// Similarity metric the index is provisioned with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
  Cosine,
  Euclidean,
  Dotproduct,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
  pub name: String,
  /// Must match the embedding model's output length
  pub dimension: usize,
  pub metric: Metric,
  /// Control plane used to describe and create indexes
  pub control_plane: String,
  /// Data plane host; discovered from the control plane when unset
  pub host: Option<String>,
  pub cloud: String,
  pub region: String,
  pub api_version: String,
  pub timeout_secs: u64,
  #[serde(skip_serializing)]
  pub api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
  pub endpoint: String,
  pub model: String,
  pub timeout_secs: u64,
  #[serde(skip_serializing)]
  pub api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
  pub top_k: usize,
  pub max_context_entries: usize,
  pub max_context_chars: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
  pub max_attempts: u32,
  pub initial_delay_ms: u64,
  pub max_delay_ms: u64,
  pub backoff_factor: f64,
}

// Defaults
// ========

impl Default for CanvassConfig {
  fn default() -> Self {
    Self {
      server: ServerConfig::default(),
      data_dir: default_data_dir(),
      store: StoreConfig::default(),
      embedding: EmbeddingConfig::default(),
      index: IndexConfig::default(),
      generation: GenerationConfig::default(),
      retrieval: RetrievalConfig::default(),
      retry: RetryConfig::default(),
    }
  }
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self { bind: SocketAddr::from(([127, 0, 0, 1], 3000)) }
  }
}

impl Default for StoreConfig {
  fn default() -> Self {
    Self { timeout_secs: 5 }
  }
}

impl Default for EmbeddingConfig {
  fn default() -> Self {
    Self {
      endpoint: GEMINI_ENDPOINT.to_string(),
      model: "text-embedding-004".to_string(),
      timeout_secs: 15,
      api_key: None,
    }
  }
}

impl Default for IndexConfig {
  fn default() -> Self {
    Self {
      name: "survey".to_string(),
      dimension: 768,
      metric: Metric::Cosine,
      control_plane: "https://api.pinecone.io".to_string(),
      host: None,
      cloud: "aws".to_string(),
      region: "us-east-1".to_string(),
      api_version: "2024-07".to_string(),
      timeout_secs: 10,
      api_key: None,
    }
  }
}

impl Default for GenerationConfig {
  fn default() -> Self {
    Self {
      endpoint: GEMINI_ENDPOINT.to_string(),
      model: "gemini-1.5-flash".to_string(),
      timeout_secs: 60,
      api_key: None,
    }
  }
}

impl Default for RetrievalConfig {
  fn default() -> Self {
    Self { top_k: 5, max_context_entries: 50, max_context_chars: 12_000 }
  }
}

impl Default for RetryConfig {
  fn default() -> Self {
    Self { max_attempts: 3, initial_delay_ms: 200, max_delay_ms: 2_000, backoff_factor: 2.0 }
  }
}

// Loading
// =======

impl CanvassConfig {
  /// Load from an explicit path, `$CANVASS_CONFIG`, or `~/.canvass/config.yaml`,
  /// then apply environment overrides and validate.
  pub fn load(explicit: Option<&Path>) -> Result<Self> {
    let mut config = match resolve_config_path(explicit)? {
      Some(path) => Self::from_file(&path)?,
      None => Self::default(),
    };

    config.apply_overrides(|key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
  }

  pub fn from_file(path: &Path) -> Result<Self> {
    let content = std::fs::read_to_string(path)
      .with_context(|| format!("Failed to read config file {}", path.display()))?;
    Self::from_yaml_str(&content)
      .with_context(|| format!("Failed to parse config file {}", path.display()))
  }

  pub fn from_yaml_str(content: &str) -> Result<Self> {
    if content.trim().is_empty() {
      return Ok(Self::default());
    }
    Ok(serde_yaml::from_str(content)?)
  }

  /// Apply overrides from a variable lookup (the process environment in production)
  pub fn apply_overrides<F>(&mut self, lookup: F)
  where
    F: Fn(&str) -> Option<String>,
  {
    if let Some(key) = lookup(GEMINI_KEY_ENV_VAR).filter(|k| !k.is_empty()) {
      self.embedding.api_key.get_or_insert_with(|| key.clone());
      self.generation.api_key.get_or_insert(key);
    }

    if let Some(key) = lookup(PINECONE_KEY_ENV_VAR).filter(|k| !k.is_empty()) {
      self.index.api_key.get_or_insert(key);
    }

    if let Some(dir) = lookup(DATA_DIR_ENV_VAR).filter(|d| !d.is_empty()) {
      self.data_dir = PathBuf::from(dir);
    }
  }

  pub fn validate(&self) -> Result<()> {
    parse_endpoint("embedding.endpoint", &self.embedding.endpoint)?;
    parse_endpoint("generation.endpoint", &self.generation.endpoint)?;
    parse_endpoint("index.control_plane", &self.index.control_plane)?;
    if let Some(host) = &self.index.host {
      parse_endpoint("index.host", host)?;
    }

    if self.index.dimension == 0 {
      return Err(anyhow!("index.dimension must be greater than zero"));
    }
    let timeouts = [
      ("store.timeout_secs", self.store.timeout_secs),
      ("embedding.timeout_secs", self.embedding.timeout_secs),
      ("index.timeout_secs", self.index.timeout_secs),
      ("generation.timeout_secs", self.generation.timeout_secs),
    ];
    if let Some((field, _)) = timeouts.iter().find(|(_, secs)| *secs == 0) {
      return Err(anyhow!("{field} must be greater than zero"));
    }
    if self.retrieval.top_k == 0 {
      return Err(anyhow!("retrieval.top_k must be greater than zero"));
    }
    if self.retrieval.max_context_entries == 0 || self.retrieval.max_context_chars == 0 {
      return Err(anyhow!("retrieval context budget must be greater than zero"));
    }
    if self.retry.max_attempts == 0 {
      return Err(anyhow!("retry.max_attempts must be at least 1"));
    }
    if self.retry.backoff_factor < 1.0 {
      return Err(anyhow!("retry.backoff_factor must be at least 1.0"));
    }

    Ok(())
  }

  pub fn feedback_dir(&self) -> PathBuf {
    self.data_dir.join("feedback")
  }

  pub fn server_logs_path(&self) -> PathBuf {
    self.data_dir.join("logs").join("server.logs.jsonl")
  }
}

impl RetryConfig {
  pub fn policy(&self) -> RetryPolicy {
    RetryPolicy::new(
      self.max_attempts,
      Duration::from_millis(self.initial_delay_ms),
      Duration::from_millis(self.max_delay_ms),
      self.backoff_factor,
    )
  }
}

fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
  if let Some(path) = explicit {
    return Ok(Some(path.to_path_buf()));
  }

  if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
    if !path.is_empty() {
      return Ok(Some(PathBuf::from(path)));
    }
  }

  let default_path = default_data_dir().join("config.yaml");
  Ok(default_path.exists().then_some(default_path))
}

fn default_data_dir() -> PathBuf {
  dirs::home_dir().unwrap_or_else(|| PathBuf::from("/tmp")).join(".canvass")
}

fn parse_endpoint(field: &str, value: &str) -> Result<Url> {
  Url::parse(value).map_err(|e| anyhow!("{field} is not a valid URL ({value}): {e}"))
}
