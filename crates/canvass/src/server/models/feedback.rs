use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// A single submitted piece of feedback; immutable once stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRecord {
  pub id: Uuid,
  pub customer_name: String,
  pub feedback: String,
  pub rating: u8,
  pub created_at: DateTime<Utc>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub form_id: Option<String>,
}

impl FeedbackRecord {
  pub fn new(customer_name: String, feedback: String, rating: u8, form_id: Option<String>) -> Self {
    Self { id: Uuid::new_v4(), customer_name, feedback, rating, created_at: Utc::now(), form_id }
  }
}

/// A survey form that feedback is collected against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Form {
  pub id: String,
  /// Public slug used in share links
  pub form_url_id: String,
  pub title: String,
  pub created_at: DateTime<Utc>,
}

impl Form {
  pub fn new(title: String, form_url_id: String) -> Self {
    Self { id: Uuid::new_v4().to_string(), form_url_id, title, created_at: Utc::now() }
  }
}

/// Feedback reduced to the fields used as model context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedFeedback {
  pub customer_name: String,
  pub feedback: String,
  pub rating: u8,
  pub created_at: DateTime<Utc>,
}

impl NormalizedFeedback {
  pub fn dedup_key(&self) -> DedupKey {
    DedupKey::new(&self.customer_name, &self.feedback)
  }
}

impl From<&FeedbackRecord> for NormalizedFeedback {
  fn from(record: &FeedbackRecord) -> Self {
    Self {
      customer_name: record.customer_name.clone(),
      feedback: record.feedback.clone(),
      rating: record.rating,
      created_at: record.created_at,
    }
  }
}

/// Case-insensitive (customer, feedback) identity
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
  customer: String,
  feedback: String,
}

impl DedupKey {
  pub fn new(customer_name: &str, feedback: &str) -> Self {
    Self { customer: customer_name.to_lowercase(), feedback: feedback.to_lowercase() }
  }
}

/// Summary over a normalized feedback set, recomputed per request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackStats {
  pub total_feedbacks: usize,
  /// Mean rating rounded to one decimal; 0.0 for an empty set
  pub average_rating: f64,
  pub unique_customers: usize,
}
