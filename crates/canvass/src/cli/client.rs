//! HTTP client for the canvass REST API
//!
//! The CLI is a thin client: every command is one request against a running
//! `canvass_server`.

use anyhow::{anyhow, Context, Result};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::time::timeout;

use crate::server::models::QueryScope;
use crate::server::types::{
  AskRequest, AskResponse, BaseResponse, ErrorBody, FormDetailsResponse, LogsResponse,
  StatusResponse, SubmitFeedbackRequest, SubmitFeedbackResponse,
};

pub const SERVER_ENV_VAR: &str = "CANVASS_SERVER";
pub const DEFAULT_SERVER: &str = "http://localhost:3000";

/// Configuration for the canvass HTTP client
#[derive(Debug, Clone)]
pub struct ClientConfig {
  /// Base URL of the canvass server (e.g., "http://localhost:3000")
  pub base_url: String,
  /// Request timeout in seconds; generation can take most of a minute
  pub timeout_secs: u64,
}

impl Default for ClientConfig {
  fn default() -> Self {
    Self { base_url: DEFAULT_SERVER.to_string(), timeout_secs: 120 }
  }
}

pub struct CanvassClient {
  client: Client,
  config: ClientConfig,
}

impl CanvassClient {
  pub fn new(base_url: &str) -> Result<Self> {
    Self::with_config(ClientConfig { base_url: base_url.to_string(), ..ClientConfig::default() })
  }

  pub fn with_config(mut config: ClientConfig) -> Result<Self> {
    config.base_url = config.base_url.trim_end_matches('/').to_string();
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .context("Failed to create HTTP client")?;

    Ok(Self { client, config })
  }

  pub fn base_url(&self) -> &str {
    &self.config.base_url
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.base_url, path)
  }

  /// Send a request and unwrap the response envelope
  async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, action: &str) -> Result<T> {
    let response = timeout(Duration::from_secs(self.config.timeout_secs), request.send())
      .await
      .map_err(|_| anyhow!("Timed out while trying to {action}"))?
      .with_context(|| format!("Could not reach the canvass server at {}", self.config.base_url))?;

    let status = response.status();
    if !status.is_success() {
      let text = response.text().await.unwrap_or_default();
      return Err(describe_failure(action, status, &text));
    }

    let body: BaseResponse<T> =
      response
        .json()
        .await
        .with_context(|| format!("Unexpected response while trying to {action}"))?;
    Ok(body.data)
  }

  pub async fn ask(&self, question: &str, scope: &QueryScope) -> Result<AskResponse> {
    let request = AskRequest {
      question: question.to_string(),
      form_id: scope.form_id.clone(),
      form_url_id: scope.form_url_id.clone(),
    };
    self.send(self.client.post(self.url("/ask")).json(&request), "answer the question").await
  }

  pub async fn submit_feedback(
    &self,
    request: &SubmitFeedbackRequest,
  ) -> Result<SubmitFeedbackResponse> {
    self.send(self.client.post(self.url("/feedback")).json(request), "submit feedback").await
  }

  pub async fn get_form(&self, form_url_id: &str) -> Result<FormDetailsResponse> {
    let url = self.url(&format!("/forms/{form_url_id}"));
    self.send(self.client.get(url), "load the form").await
  }

  pub async fn status(&self) -> Result<StatusResponse> {
    self.send(self.client.get(self.url("/status")), "check server status").await
  }

  pub async fn get_logs(&self, limit: usize, level: Option<&str>) -> Result<LogsResponse> {
    let mut query = vec![("limit", limit.to_string())];
    if let Some(level) = level {
      query.push(("level", level.to_string()));
    }
    self.send(self.client.get(self.url("/logs")).query(&query), "read server logs").await
  }
}

fn describe_failure(action: &str, status: reqwest::StatusCode, body: &str) -> anyhow::Error {
  match serde_json::from_str::<ErrorBody>(body) {
    Ok(error_body) if !error_body.errors.is_empty() => {
      let messages: Vec<String> =
        error_body.errors.iter().map(|e| format!("{} ({})", e.message, e.key)).collect();
      let reference = error_body
        .transaction_id
        .map(|id| format!(" [transaction {id}]"))
        .unwrap_or_default();
      anyhow!("Failed to {action}: {}{reference}", messages.join("; "))
    }
    _ => anyhow!("Failed to {action}: HTTP {status}"),
  }
}

/// Resolve the server URL from the flag, `$CANVASS_SERVER`, or the default
pub fn server_url(flag: Option<&str>) -> String {
  flag
    .map(str::to_string)
    .or_else(|| std::env::var(SERVER_ENV_VAR).ok().filter(|s| !s.is_empty()))
    .unwrap_or_else(|| DEFAULT_SERVER.to_string())
}
