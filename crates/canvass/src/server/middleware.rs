//! Request context and middleware for the canvass REST API
//!
//! Every request gets a [`RequestContext`] holding its id and the shared
//! daemon logs. Handlers extract it to log with request correlation.

use axum::{
  extract::{Request, State},
  http::{Method, Uri},
  middleware::Next,
  response::Response,
};
use bentley::daemon_logs::{DaemonLogs, LogContext, LogLevel};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::server::state::AppState;

const HTTP_COMPONENT: &str = "http-request";

/// Request context containing the logger and request metadata
#[derive(Clone)]
pub struct RequestContext {
  /// Unique ID for this request; also the response's transaction id
  pub request_id: Uuid,
  pub method: Method,
  pub uri: Uri,
  pub logger: Arc<DaemonLogs>,
}

impl RequestContext {
  pub fn new(method: Method, uri: Uri, logger: Arc<DaemonLogs>) -> Self {
    Self { request_id: Uuid::new_v4(), method, uri, logger }
  }

  pub async fn log_info(&self, message: &str, component: &str) {
    self.log(LogLevel::Info, message, component, None, None).await;
  }

  pub async fn log_success(&self, message: &str, component: &str) {
    self.log(LogLevel::Success, message, component, None, None).await;
  }

  pub async fn log_warn(&self, message: &str, component: &str) {
    self.log(LogLevel::Warn, message, component, None, None).await;
  }

  pub async fn log_error(&self, message: &str, component: &str) {
    self.log(LogLevel::Error, message, component, None, None).await;
  }

  async fn log(
    &self,
    level: LogLevel,
    message: &str,
    component: &str,
    status_code: Option<u16>,
    duration_ms: Option<f64>,
  ) {
    let context = LogContext {
      request_id: Some(self.request_id.to_string()),
      method: Some(self.method.to_string()),
      path: Some(self.uri.path().to_string()),
      duration_ms,
      status_code,
    };
    self.logger.log_with_context(level, message, component, context).await;
  }

  pub async fn log_request_start(&self) {
    self.log(LogLevel::Verbose, "Request started", HTTP_COMPONENT, None, None).await;
  }

  pub async fn log_request_complete(&self, status_code: u16, duration_ms: f64) {
    let level = match status_code {
      500..=u16::MAX => LogLevel::Error,
      400..=499 => LogLevel::Warn,
      _ => LogLevel::Info,
    };
    self
      .log(level, "Request completed", HTTP_COMPONENT, Some(status_code), Some(duration_ms))
      .await;
  }
}

/// Middleware to inject RequestContext into all requests
pub async fn request_context_middleware(
  State(state): State<AppState>,
  mut request: Request,
  next: Next,
) -> Response {
  let context =
    RequestContext::new(request.method().clone(), request.uri().clone(), state.logs.clone());

  let start_time = Instant::now();
  context.log_request_start().await;

  request.extensions_mut().insert(context.clone());
  let response = next.run(request).await;

  let duration_ms = start_time.elapsed().as_secs_f64() * 1000.0;
  context.log_request_complete(response.status().as_u16(), duration_ms).await;

  response
}
