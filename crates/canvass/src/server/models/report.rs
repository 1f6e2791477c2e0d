use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{FeedbackStats, StructuredAnswer};
use crate::error::{PipelineError, Result};

/// Which feedback a question is asked over; both fields empty means all feedback
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueryScope {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub form_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub form_url_id: Option<String>,
}

/// Validated form of [`QueryScope`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeTarget<'a> {
  All,
  FormId(&'a str),
  FormUrlId(&'a str),
}

impl QueryScope {
  pub fn all() -> Self {
    Self::default()
  }

  pub fn form(form_id: impl Into<String>) -> Self {
    Self { form_id: Some(form_id.into()), form_url_id: None }
  }

  pub fn form_url(form_url_id: impl Into<String>) -> Self {
    Self { form_id: None, form_url_id: Some(form_url_id.into()) }
  }

  pub fn target(&self) -> Result<ScopeTarget<'_>> {
    match (self.form_id.as_deref(), self.form_url_id.as_deref()) {
      (Some(_), Some(_)) => {
        Err(PipelineError::Validation("Specify either formId or formUrlId, not both".to_string()))
      }
      (Some(id), None) if id.trim().is_empty() => {
        Err(PipelineError::Validation("formId must not be blank".to_string()))
      }
      (None, Some(url_id)) if url_id.trim().is_empty() => {
        Err(PipelineError::Validation("formUrlId must not be blank".to_string()))
      }
      (Some(id), None) => Ok(ScopeTarget::FormId(id.trim())),
      (None, Some(url_id)) => Ok(ScopeTarget::FormUrlId(url_id.trim())),
      (None, None) => Ok(ScopeTarget::All),
    }
  }
}

/// How much of the feedback reached the prompt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContextSummary {
  /// Similarity matches returned by the index
  pub retrieved: usize,
  /// Normalized entries listed in the prompt
  pub included: usize,
  /// Normalized entries dropped by the context budget
  pub omitted: usize,
}

/// Everything the pipeline returns for one question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnswerReport {
  pub answer: StructuredAnswer,
  pub stats: FeedbackStats,
  pub context: ContextSummary,
}
