//! Feedback deduplication and summary statistics

use std::collections::HashSet;

use crate::server::models::{FeedbackRecord, FeedbackStats, NormalizedFeedback};

/// Drop repeated (customer, feedback) pairs, compared case-insensitively.
/// The first occurrence wins and input order is preserved.
pub fn normalize(records: &[FeedbackRecord]) -> Vec<NormalizedFeedback> {
  let mut seen = HashSet::new();

  records
    .iter()
    .map(NormalizedFeedback::from)
    .filter(|entry| seen.insert(entry.dedup_key()))
    .collect()
}

/// Summarize a normalized set; an empty set averages to 0.0
pub fn compute_stats(feedback: &[NormalizedFeedback]) -> FeedbackStats {
  let total_feedbacks = feedback.len();

  let average_rating = if total_feedbacks == 0 {
    0.0
  } else {
    let sum: u64 = feedback.iter().map(|entry| u64::from(entry.rating)).sum();
    round_to_tenth(sum as f64 / total_feedbacks as f64)
  };

  let unique_customers = feedback
    .iter()
    .map(|entry| entry.customer_name.to_lowercase())
    .collect::<HashSet<_>>()
    .len();

  FeedbackStats { total_feedbacks, average_rating, unique_customers }
}

fn round_to_tenth(value: f64) -> f64 {
  (value * 10.0).round() / 10.0
}
