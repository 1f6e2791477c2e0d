//! Question answering over collected feedback
//!
//! A request moves through load, normalize, embed, retrieve, compose,
//! generate and parse. The first failing stage ends the request; nothing
//! partial is returned.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::CanvassConfig;
use crate::error::{Dependency, PipelineError, Result};
use crate::server::models::{
  AnswerReport, ContextSummary, DedupKey, FeedbackRecord, NormalizedFeedback, QueryScope,
  ScopeTarget,
};
use crate::server::services::embeddings::EmbeddingClient;
use crate::server::services::feedback_store::FeedbackStore;
use crate::server::services::generation::GenerativeModel;
use crate::server::services::normalizer::{compute_stats, normalize};
use crate::server::services::prompt::PromptComposer;
use crate::server::services::response_parser::ResponseParser;
use crate::server::services::retry::{with_retry, with_timeout, RetryPolicy};
use crate::server::services::vector_index::{ensure_dimension, SimilarityMatch, VectorIndex};

pub struct QueryOrchestrator {
  store: Arc<dyn FeedbackStore>,
  embedder: Arc<dyn EmbeddingClient>,
  index: Arc<dyn VectorIndex>,
  generator: Arc<dyn GenerativeModel>,
  composer: PromptComposer,
  parser: ResponseParser,
  top_k: usize,
  retry: RetryPolicy,
  store_timeout: Duration,
}

impl QueryOrchestrator {
  pub fn new(
    store: Arc<dyn FeedbackStore>,
    embedder: Arc<dyn EmbeddingClient>,
    index: Arc<dyn VectorIndex>,
    generator: Arc<dyn GenerativeModel>,
  ) -> Self {
    Self {
      store,
      embedder,
      index,
      generator,
      composer: PromptComposer::default(),
      parser: ResponseParser::new(),
      top_k: 5,
      retry: RetryPolicy::default(),
      store_timeout: Duration::from_secs(5),
    }
  }

  pub fn from_config(
    config: &CanvassConfig,
    store: Arc<dyn FeedbackStore>,
    embedder: Arc<dyn EmbeddingClient>,
    index: Arc<dyn VectorIndex>,
    generator: Arc<dyn GenerativeModel>,
  ) -> Self {
    Self::new(store, embedder, index, generator)
      .with_composer(PromptComposer::from_config(&config.retrieval))
      .with_top_k(config.retrieval.top_k)
      .with_retry_policy(config.retry.policy())
      .with_store_timeout(Duration::from_secs(config.store.timeout_secs))
  }

  pub fn with_composer(mut self, composer: PromptComposer) -> Self {
    self.composer = composer;
    self
  }

  pub fn with_top_k(mut self, top_k: usize) -> Self {
    self.top_k = top_k.max(1);
    self
  }

  pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
    self.retry = retry;
    self
  }

  pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
    self.store_timeout = timeout;
    self
  }

  pub async fn answer_question(&self, question: &str, scope: &QueryScope) -> Result<AnswerReport> {
    let question = question.trim();
    if question.is_empty() {
      return Err(PipelineError::Validation("Question is required".to_string()));
    }
    let target = scope.target()?;

    let ((form_id, records), embedding) =
      tokio::try_join!(self.load_feedback(&target), self.embed_question(question))?;
    tracing::debug!(records = records.len(), "feedback loaded");

    if records.is_empty() {
      return Err(PipelineError::NotFound("Feedback".to_string()));
    }

    let normalized = normalize(&records);
    let stats = compute_stats(&normalized);
    tracing::debug!(
      normalized = normalized.len(),
      duplicates = records.len() - normalized.len(),
      "feedback normalized"
    );

    ensure_dimension(&embedding, self.index.dimension())?;

    let matches = with_retry(&self.retry, "query vector index", || {
      self.index.query(&embedding, self.top_k, true, form_id.as_deref())
    })
    .await?;
    tracing::debug!(matches = matches.len(), "similar feedback retrieved");

    let ranked = rank_context(normalized, &matches);
    let prompt = self.composer.compose_with_budget(question, &ranked);
    if prompt.omitted > 0 {
      tracing::debug!(omitted = prompt.omitted, "context budget reached");
    }

    let raw = self.generator.generate(&prompt.text).await?;
    let answer = self.parser.parse(&raw);
    if !answer.has_all_sections() {
      tracing::debug!(missing = ?answer.missing_sections(), "answer is missing sections");
    }

    Ok(AnswerReport {
      answer,
      stats,
      context: ContextSummary {
        retrieved: matches.len(),
        included: prompt.included,
        omitted: prompt.omitted,
      },
    })
  }

  /// Resolve the scope and load its feedback; also returns the form id used
  /// to filter similarity queries
  async fn load_feedback(
    &self,
    target: &ScopeTarget<'_>,
  ) -> Result<(Option<String>, Vec<FeedbackRecord>)> {
    with_timeout(Dependency::FeedbackStore, self.store_timeout, async {
      match target {
        ScopeTarget::All => Ok((None, self.store.load_all().await?)),
        ScopeTarget::FormId(form_id) => {
          let form = self
            .store
            .find_form(form_id)
            .await?
            .ok_or_else(|| PipelineError::NotFound("Form".to_string()))?;
          let records = self.store.load_by_form(&form.id).await?;
          Ok((Some(form.id), records))
        }
        ScopeTarget::FormUrlId(form_url_id) => {
          let form = self
            .store
            .find_form_by_url_id(form_url_id)
            .await?
            .ok_or_else(|| PipelineError::NotFound("Form".to_string()))?;
          let records = self.store.load_by_form(&form.id).await?;
          Ok((Some(form.id), records))
        }
      }
    })
    .await
  }

  async fn embed_question(&self, question: &str) -> Result<Vec<f32>> {
    with_retry(&self.retry, "embed question", || self.embedder.embed(question)).await
  }
}

/// Order the prompt context: entries matching a similarity hit first, in
/// hit order, then everything else in its original order
pub fn rank_context(
  normalized: Vec<NormalizedFeedback>,
  matches: &[SimilarityMatch],
) -> Vec<NormalizedFeedback> {
  let mut rank: HashMap<DedupKey, usize> = HashMap::new();
  for (position, hit) in matches.iter().enumerate() {
    if let Some(metadata) = &hit.metadata {
      rank.entry(DedupKey::new(&metadata.customer_name, &metadata.feedback)).or_insert(position);
    }
  }

  let (mut hits, rest): (Vec<_>, Vec<_>) =
    normalized.into_iter().partition(|entry| rank.contains_key(&entry.dedup_key()));
  hits.sort_by_key(|entry| rank.get(&entry.dedup_key()).copied().unwrap_or(usize::MAX));
  hits.extend(rest);
  hits
}
