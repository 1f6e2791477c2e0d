//! Error taxonomy for the question-answering pipeline

use reqwest::StatusCode;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// External collaborators a request can wait on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dependency {
  FeedbackStore,
  Embedding,
  VectorIndex,
  Generation,
}

impl fmt::Display for Dependency {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Dependency::FeedbackStore => "feedback store",
      Dependency::Embedding => "embedding service",
      Dependency::VectorIndex => "vector index",
      Dependency::Generation => "generation service",
    };
    f.write_str(name)
  }
}

/// Errors that can occur while ingesting feedback or answering a question.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
  #[error("Invalid request: {0}")]
  Validation(String),

  #[error("Not found: {0}")]
  NotFound(String),

  #[error("Embedding service error: {0}")]
  EmbeddingService(String),

  #[error("Vector index unavailable: {0}")]
  IndexUnavailable(String),

  #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
  DimensionMismatch { expected: usize, actual: usize },

  #[error("Generation service error: {0}")]
  GenerationService(String),

  #[error("Timed out after {after:?} waiting for the {dependency}")]
  DependencyTimeout { dependency: Dependency, after: Duration },

  /// The dependency refused the request itself (bad key, bad payload)
  #[error("The {dependency} rejected the request: {detail}")]
  DependencyRejected { dependency: Dependency, detail: String },

  #[error("Feedback store error: {0}")]
  Store(String),
}

impl PipelineError {
  /// Classify a non-success HTTP status from a dependency.
  ///
  /// Server errors, 408 and 429 are transient; any other status means the
  /// request will fail the same way again.
  pub fn from_status(dependency: Dependency, status: StatusCode, body: &str) -> Self {
    let detail = format!("API error {status}: {body}");
    let transient = status.is_server_error()
      || status == StatusCode::REQUEST_TIMEOUT
      || status == StatusCode::TOO_MANY_REQUESTS;

    if !transient {
      return PipelineError::DependencyRejected { dependency, detail };
    }
    match dependency {
      Dependency::FeedbackStore => PipelineError::Store(detail),
      Dependency::Embedding => PipelineError::EmbeddingService(detail),
      Dependency::VectorIndex => PipelineError::IndexUnavailable(detail),
      Dependency::Generation => PipelineError::GenerationService(detail),
    }
  }

  /// Stable machine-readable code surfaced to API callers
  pub fn code(&self) -> &'static str {
    match self {
      PipelineError::Validation(_) => "validation_error",
      PipelineError::NotFound(_) => "not_found",
      PipelineError::EmbeddingService(_) => "embedding_service_error",
      PipelineError::IndexUnavailable(_) => "index_unavailable",
      PipelineError::DimensionMismatch { .. } => "dimension_mismatch",
      PipelineError::GenerationService(_) => "generation_service_error",
      PipelineError::DependencyTimeout { .. } => "dependency_timeout",
      PipelineError::Store(_) => "store_error",
      PipelineError::DependencyRejected { dependency, .. } => match dependency {
        Dependency::FeedbackStore => "store_error",
        Dependency::Embedding => "embedding_service_error",
        Dependency::VectorIndex => "index_unavailable",
        Dependency::Generation => "generation_service_error",
      },
    }
  }

  /// Whether an idempotent read that failed this way may be attempted again
  pub fn is_retryable(&self) -> bool {
    matches!(
      self,
      PipelineError::EmbeddingService(_)
        | PipelineError::IndexUnavailable(_)
        | PipelineError::DependencyTimeout { .. }
    )
  }

  /// Caller-facing message; never includes dependency error text
  pub fn public_message(&self) -> String {
    match self {
      PipelineError::Validation(reason) => reason.clone(),
      PipelineError::NotFound(what) => format!("{what} not found"),
      PipelineError::DimensionMismatch { .. } => {
        "Service is misconfigured; please contact the form owner".to_string()
      }
      PipelineError::DependencyTimeout { .. } => {
        "A required service took too long to respond".to_string()
      }
      _ => "Failed to process the request".to_string(),
    }
  }
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
