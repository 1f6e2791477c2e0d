//! Bounded retry with exponential backoff, and per-call timeouts
//!
//! Only idempotent reads (embedding, index queries) go through `with_retry`;
//! index upserts are attempted once.

use std::future::Future;
use std::time::Duration;

use crate::error::{Dependency, PipelineError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
  /// Total attempts including the first one
  pub max_attempts: u32,
  pub initial_delay: Duration,
  pub max_delay: Duration,
  pub backoff_factor: f64,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      max_attempts: 3,
      initial_delay: Duration::from_millis(200),
      max_delay: Duration::from_secs(2),
      backoff_factor: 2.0,
    }
  }
}

impl RetryPolicy {
  pub fn new(
    max_attempts: u32,
    initial_delay: Duration,
    max_delay: Duration,
    backoff_factor: f64,
  ) -> Self {
    Self {
      max_attempts: max_attempts.max(1),
      initial_delay,
      max_delay,
      backoff_factor: backoff_factor.max(1.0),
    }
  }

  /// A policy that makes exactly one attempt
  pub fn none() -> Self {
    Self::new(1, Duration::ZERO, Duration::ZERO, 1.0)
  }

  /// Delay before retry number `retry` (0-indexed), capped at `max_delay`
  pub fn delay_for_retry(&self, retry: u32) -> Duration {
    let exponent = retry.min(31) as i32;
    let delay_ms = self.initial_delay.as_millis() as f64 * self.backoff_factor.powi(exponent);
    let capped_ms = delay_ms.min(self.max_delay.as_millis() as f64);
    Duration::from_millis(capped_ms as u64)
  }
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// the policy's attempts are exhausted. The last error is returned.
pub async fn with_retry<T, F, Fut>(
  policy: &RetryPolicy,
  operation_name: &str,
  mut operation: F,
) -> Result<T>
where
  F: FnMut() -> Fut,
  Fut: Future<Output = Result<T>>,
{
  let mut attempt = 0u32;

  loop {
    match operation().await {
      Ok(value) => {
        if attempt > 0 {
          tracing::debug!(operation = operation_name, retries = attempt, "succeeded after retries");
        }
        return Ok(value);
      }
      Err(error) => {
        attempt += 1;

        if !error.is_retryable() || attempt >= policy.max_attempts {
          if attempt > 1 {
            bentley::warn!("{operation_name} failed after {attempt} attempts: {error}");
          }
          return Err(error);
        }

        let delay = policy.delay_for_retry(attempt - 1);
        tracing::debug!(
          operation = operation_name,
          attempt,
          delay_ms = delay.as_millis() as u64,
          error = %error,
          "retrying after failure"
        );
        tokio::time::sleep(delay).await;
      }
    }
  }
}

/// Bound a call to `dependency`, mapping an elapsed timer to `DependencyTimeout`
pub async fn with_timeout<T, Fut>(dependency: Dependency, after: Duration, call: Fut) -> Result<T>
where
  Fut: Future<Output = Result<T>>,
{
  match tokio::time::timeout(after, call).await {
    Ok(result) => result,
    Err(_) => Err(PipelineError::DependencyTimeout { dependency, after }),
  }
}
