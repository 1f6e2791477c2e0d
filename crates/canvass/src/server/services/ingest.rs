//! Feedback submission: validate, store, then index for similarity search
//!
//! The store is the source of truth. A record that was stored but could not
//! be indexed is still accepted; it is reported with `indexed: false`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::CanvassConfig;
use crate::error::{Dependency, PipelineError, Result};
use crate::server::models::feedback::{MAX_RATING, MIN_RATING};
use crate::server::models::FeedbackRecord;
use crate::server::services::embeddings::EmbeddingClient;
use crate::server::services::feedback_store::FeedbackStore;
use crate::server::services::retry::{with_retry, with_timeout, RetryPolicy};
use crate::server::services::vector_index::{ensure_dimension, VectorIndex, VectorMetadata};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitFeedback {
  pub customer_name: String,
  pub feedback: String,
  pub rating: i64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub form_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
  pub record: FeedbackRecord,
  /// False when the record was stored but its vector could not be written
  pub indexed: bool,
}

pub struct FeedbackIngestor {
  store: Arc<dyn FeedbackStore>,
  embedder: Arc<dyn EmbeddingClient>,
  index: Arc<dyn VectorIndex>,
  retry: RetryPolicy,
  store_timeout: Duration,
}

impl FeedbackIngestor {
  pub fn new(
    store: Arc<dyn FeedbackStore>,
    embedder: Arc<dyn EmbeddingClient>,
    index: Arc<dyn VectorIndex>,
  ) -> Self {
    Self {
      store,
      embedder,
      index,
      retry: RetryPolicy::default(),
      store_timeout: Duration::from_secs(5),
    }
  }

  pub fn from_config(
    config: &CanvassConfig,
    store: Arc<dyn FeedbackStore>,
    embedder: Arc<dyn EmbeddingClient>,
    index: Arc<dyn VectorIndex>,
  ) -> Self {
    let mut ingestor = Self::new(store, embedder, index);
    ingestor.retry = config.retry.policy();
    ingestor.store_timeout = Duration::from_secs(config.store.timeout_secs);
    ingestor
  }

  pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
    self.retry = retry;
    self
  }

  pub async fn submit(&self, submission: SubmitFeedback) -> Result<SubmissionReceipt> {
    let rating = validate_rating(submission.rating)?;
    let customer_name = required("customerName", &submission.customer_name)?;
    let feedback = required("feedback", &submission.feedback)?;

    let form_id = match submission.form_id.as_deref() {
      None => None,
      Some(form_id) => {
        let form_id = required("formId", form_id)?;
        let lookup = self.store.find_form(&form_id);
        let form = with_timeout(Dependency::FeedbackStore, self.store_timeout, lookup)
          .await?
          .ok_or_else(|| PipelineError::NotFound("Form".to_string()))?;
        Some(form.id)
      }
    };

    let record = FeedbackRecord::new(customer_name, feedback, rating, form_id);
    with_timeout(Dependency::FeedbackStore, self.store_timeout, self.store.insert_feedback(&record))
      .await?;
    tracing::debug!(id = %record.id, "feedback stored");

    let indexed = match self.index_record(&record).await {
      Ok(()) => true,
      Err(e) => {
        bentley::warn!("Feedback {} was stored but not indexed: {}", record.id, e);
        false
      }
    };

    Ok(SubmissionReceipt { record, indexed })
  }

  async fn index_record(&self, record: &FeedbackRecord) -> Result<()> {
    let embedding =
      with_retry(&self.retry, "embed feedback", || self.embedder.embed(&record.feedback)).await?;
    ensure_dimension(&embedding, self.index.dimension())?;

    let metadata = VectorMetadata {
      customer_name: record.customer_name.clone(),
      feedback: record.feedback.clone(),
      rating: record.rating,
      created_at: Some(record.created_at),
      form_id: record.form_id.clone(),
    };

    // Upserts are not retried
    self.index.upsert(&record.id.to_string(), &embedding, &metadata).await
  }
}

fn required(field: &str, value: &str) -> Result<String> {
  let value = value.trim();
  if value.is_empty() {
    Err(PipelineError::Validation(format!("{field} is required")))
  } else {
    Ok(value.to_string())
  }
}

fn validate_rating(rating: i64) -> Result<u8> {
  match u8::try_from(rating) {
    Ok(value) if (MIN_RATING..=MAX_RATING).contains(&value) => Ok(value),
    _ => Err(PipelineError::Validation(format!(
      "rating must be between {MIN_RATING} and {MAX_RATING}"
    ))),
  }
}
