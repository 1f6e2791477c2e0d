//! Shared in-process collaborators for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;

use canvass::error::{PipelineError, Result};
use canvass::server::services::embeddings::EmbeddingClient;
use canvass::server::services::generation::GenerativeModel;
use canvass::server::services::vector_index::{
  ensure_dimension, SimilarityMatch, VectorIndex, VectorMetadata,
};

pub const DIMENSION: usize = 16;

/// Bag-of-words embedding: texts sharing words land close together
pub struct HashingEmbedder {
  dimension: usize,
}

impl HashingEmbedder {
  pub fn new(dimension: usize) -> Self {
    Self { dimension }
  }
}

#[async_trait]
impl EmbeddingClient for HashingEmbedder {
  async fn embed(&self, text: &str) -> Result<Vec<f32>> {
    if text.trim().is_empty() {
      return Err(PipelineError::Validation("Cannot embed empty text".to_string()));
    }

    let mut vector = vec![0.0f32; self.dimension];
    for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
      let mut hasher = DefaultHasher::new();
      word.to_lowercase().hash(&mut hasher);
      vector[(hasher.finish() % self.dimension as u64) as usize] += 1.0;
    }
    Ok(vector)
  }
}

/// Cosine-similarity index kept in memory
pub struct MemoryIndex {
  dimension: usize,
  entries: Mutex<Vec<(String, Vec<f32>, VectorMetadata)>>,
}

impl MemoryIndex {
  pub fn new(dimension: usize) -> Self {
    Self { dimension, entries: Mutex::new(Vec::new()) }
  }

  pub fn len(&self) -> usize {
    self.entries.lock().unwrap().len()
  }

  pub fn ids(&self) -> Vec<String> {
    self.entries.lock().unwrap().iter().map(|(id, _, _)| id.clone()).collect()
  }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
  let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
  let norm = |v: &[f32]| v.iter().map(|x| x * x).sum::<f32>().sqrt();
  let denominator = norm(a) * norm(b);
  if denominator == 0.0 {
    0.0
  } else {
    dot / denominator
  }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
  fn dimension(&self) -> usize {
    self.dimension
  }

  async fn upsert(&self, id: &str, vector: &[f32], metadata: &VectorMetadata) -> Result<()> {
    ensure_dimension(vector, self.dimension)?;
    let mut entries = self.entries.lock().unwrap();
    entries.retain(|(existing, _, _)| existing != id);
    entries.push((id.to_string(), vector.to_vec(), metadata.clone()));
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
    let entries = self.entries.lock().unwrap();

    let mut matches: Vec<SimilarityMatch> = entries
      .iter()
      .filter(|(_, _, metadata)| form_id.is_none() || metadata.form_id.as_deref() == form_id)
      .map(|(id, values, metadata)| SimilarityMatch {
        id: id.clone(),
        score: cosine(vector, values),
        metadata: include_metadata.then(|| metadata.clone()),
      })
      .collect();
    matches.sort_by(|a, b| b.score.total_cmp(&a.score));
    matches.truncate(top_k);
    Ok(matches)
  }
}

/// Replies with a fixed answer and remembers every prompt it was given
pub struct ScriptedModel {
  reply: String,
  prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
  pub fn new(reply: &str) -> Self {
    Self { reply: reply.to_string(), prompts: Mutex::new(Vec::new()) }
  }

  pub fn prompts(&self) -> Vec<String> {
    self.prompts.lock().unwrap().clone()
  }
}

#[async_trait]
impl GenerativeModel for ScriptedModel {
  async fn generate(&self, prompt: &str) -> Result<String> {
    self.prompts.lock().unwrap().push(prompt.to_string());
    Ok(self.reply.clone())
  }
}

pub const FULL_REPLY: &str = "ANALYSIS: Customers praise fast delivery but dislike the packaging.\n\
EVIDENCE: \"Delivery was fast\" - Amy Chen (2024-03-01) \"Packaging was flimsy\" - Bo Diaz (2024-03-02)\n\
DATA COVERAGE: Based on 3 responses.\n\
CONFIDENCE: **High**\n\
LIMITATIONS: Small sample.";
