//! In-memory collaborators for unit tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::{PipelineError, Result};
use crate::server::services::vector_index::{
  ensure_dimension, SimilarityMatch, VectorIndex, VectorMetadata,
};

/// Records every call and answers queries with canned matches
pub struct RecordingIndex {
  dimension: usize,
  matches: Vec<SimilarityMatch>,
  fail_upserts: bool,
  queries: AtomicUsize,
  upserts: Mutex<Vec<(String, VectorMetadata)>>,
}

impl RecordingIndex {
  pub fn new(dimension: usize) -> Self {
    Self {
      dimension,
      matches: Vec::new(),
      fail_upserts: false,
      queries: AtomicUsize::new(0),
      upserts: Mutex::new(Vec::new()),
    }
  }

  pub fn with_matches(mut self, matches: Vec<SimilarityMatch>) -> Self {
    self.matches = matches;
    self
  }

  pub fn failing_upserts(mut self) -> Self {
    self.fail_upserts = true;
    self
  }

  pub fn query_count(&self) -> usize {
    self.queries.load(Ordering::SeqCst)
  }

  pub fn upserted(&self) -> Vec<(String, VectorMetadata)> {
    self.upserts.lock().unwrap().clone()
  }

  pub fn call_count(&self) -> usize {
    self.query_count() + self.upserts.lock().unwrap().len()
  }
}

#[async_trait]
impl VectorIndex for RecordingIndex {
  fn dimension(&self) -> usize {
    self.dimension
  }

  async fn upsert(&self, id: &str, vector: &[f32], metadata: &VectorMetadata) -> Result<()> {
    ensure_dimension(vector, self.dimension)?;
    if self.fail_upserts {
      return Err(PipelineError::IndexUnavailable("connection refused".to_string()));
    }
    self.upserts.lock().unwrap().push((id.to_string(), metadata.clone()));
    Ok(())
  }

  async fn query(
    &self,
    vector: &[f32],
    top_k: usize,
    _include_metadata: bool,
    _form_id: Option<&str>,
  ) -> Result<Vec<SimilarityMatch>> {
    self.queries.fetch_add(1, Ordering::SeqCst);
    ensure_dimension(vector, self.dimension)?;
    Ok(self.matches.iter().take(top_k).cloned().collect())
  }
}

pub fn similarity_match(id: &str, score: f32, customer: &str, feedback: &str) -> SimilarityMatch {
  SimilarityMatch {
    id: id.to_string(),
    score,
    metadata: Some(VectorMetadata {
      customer_name: customer.to_string(),
      feedback: feedback.to_string(),
      rating: 3,
      created_at: None,
      form_id: None,
    }),
  }
}
