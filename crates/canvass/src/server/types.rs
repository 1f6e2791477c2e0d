//! REST API types with schemars annotations for schema generation

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::PipelineError;
use crate::server::models::{
  AnswerReport, ContextSummary, FeedbackRecord, FeedbackStats, Form, QueryScope, StructuredAnswer,
};

pub use crate::server::services::ingest::SubmitFeedback as SubmitFeedbackRequest;

// Base Response Structure
// ======================

/// Base response object for all API endpoints
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct BaseResponse<T> {
  /// API versioning information
  pub versioning: VersionInfo,

  /// Transaction ID for logging correlation
  pub transaction_id: Uuid,

  /// Optional error information
  #[serde(skip_serializing_if = "Vec::is_empty", default)]
  pub errors: Vec<ApiError>,

  /// Response data (generic for different endpoint types)
  #[serde(flatten)]
  pub data: T,
}

/// API versioning information
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct VersionInfo {
  pub latest: String,
  pub requested: String,
  pub resolved: String,
}

/// API error information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ApiError {
  /// Stable error code, e.g. `validation_error`
  pub key: String,

  /// Human readable error message; never contains dependency details
  pub message: String,

  #[serde(default)]
  pub stack: Vec<String>,

  #[serde(default)]
  pub context: serde_json::Value,
}

/// Error-only body, used by clients to read failed responses
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
  #[serde(default)]
  pub transaction_id: Option<Uuid>,
  #[serde(default)]
  pub errors: Vec<ApiError>,
}

// Status/Version Endpoints
// =======================

/// Response for /status endpoint
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct StatusResponse {
  pub status: String,
  pub version: String,
  /// Directory holding the feedback store and server logs
  pub data_dir: String,
  pub index_name: String,
  pub dimension: usize,
  pub embedding_model: String,
  pub generation_model: String,
}

/// Response for /version endpoint
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct VersionResponse {
  pub version: String,
}

/// Response for /api endpoint
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ApiInfoResponse {
  pub latest: String,
  pub versions: ApiVersions,
  /// JSON schemas of the request bodies, keyed by type name
  pub schemas: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ApiVersions {
  pub latest: String,
  pub active: Vec<String>,
}

// Logs Endpoint
// =============

/// Query parameters for /logs
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct LogsQuery {
  /// Most recent entries to return (default 100)
  pub limit: Option<usize>,
  /// Only return entries at this level
  pub level: Option<String>,
}

/// Response for /logs endpoint
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct LogsResponse {
  pub logs: Vec<LogEntry>,
}

/// Individual log entry (re-exported from bentley)
pub type LogEntry = bentley::daemon_logs::LogEntry;

/// Request context information for logs (re-exported from bentley)
pub type LogContext = bentley::daemon_logs::LogContext;

// Question Endpoint
// =================

/// Request for POST /ask
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AskRequest {
  #[serde(default)]
  pub question: String,
  /// Restrict the question to one form's feedback
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub form_id: Option<String>,
  /// Same as `formId`, addressed by the form's public url id
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub form_url_id: Option<String>,
}

impl AskRequest {
  pub fn scope(&self) -> QueryScope {
    QueryScope { form_id: self.form_id.clone(), form_url_id: self.form_url_id.clone() }
  }
}

/// Response for POST /ask
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AskResponse {
  pub answer: StructuredAnswer,
  pub feedback_stats: FeedbackStats,
  pub context: ContextSummary,
}

impl From<AnswerReport> for AskResponse {
  fn from(report: AnswerReport) -> Self {
    Self { answer: report.answer, feedback_stats: report.stats, context: report.context }
  }
}

// Feedback Endpoints
// ==================

/// Response for POST /feedback
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitFeedbackResponse {
  pub feedback: FeedbackRecord,
  /// False when the feedback was saved but is not yet searchable
  pub indexed: bool,
}

/// Response for GET /forms/{form_url_id}
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormDetailsResponse {
  pub form: Form,
  pub feedback: Vec<FeedbackRecord>,
  pub feedback_stats: FeedbackStats,
}

// Helper Functions
// ================

fn version_info() -> VersionInfo {
  let version = env!("CARGO_PKG_VERSION");
  VersionInfo {
    latest: version.to_string(),
    requested: version.to_string(),
    resolved: version.to_string(),
  }
}

impl<T> BaseResponse<T> {
  /// Create a successful response
  pub fn success(data: T, transaction_id: Uuid) -> Self {
    Self { versioning: version_info(), transaction_id, errors: Vec::new(), data }
  }

  /// Create an error response
  pub fn error(errors: Vec<ApiError>, transaction_id: Uuid) -> BaseResponse<()> {
    BaseResponse { versioning: version_info(), transaction_id, errors, data: () }
  }
}

impl ApiError {
  pub fn new(key: &str, message: &str) -> Self {
    Self {
      key: key.to_string(),
      message: message.to_string(),
      stack: Vec::new(),
      context: serde_json::Value::Null,
    }
  }
}

impl From<&PipelineError> for ApiError {
  fn from(error: &PipelineError) -> Self {
    let mut api_error = ApiError::new(error.code(), &error.public_message());
    api_error.context = serde_json::json!({ "retryable": error.is_retryable() });
    api_error
  }
}
