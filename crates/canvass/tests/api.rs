//! REST API tests driving the router in-process

mod common;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use bentley::daemon_logs::DaemonLogs;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use canvass::config::CanvassConfig;
use canvass::error::{PipelineError, Result};
use canvass::server::models::Form;
use canvass::server::routing::create_router;
use canvass::server::services::feedback_store::{FeedbackStore, JsonlFeedbackStore};
use canvass::server::services::generation::GenerativeModel;
use canvass::server::state::AppState;

use common::{HashingEmbedder, MemoryIndex, ScriptedModel, DIMENSION, FULL_REPLY};

struct QuotaExceeded;

#[async_trait]
impl GenerativeModel for QuotaExceeded {
  async fn generate(&self, _prompt: &str) -> Result<String> {
    Err(PipelineError::GenerationService("429 quota exceeded for key AIza-secret".to_string()))
  }
}

struct TestServer {
  _dir: TempDir,
  store: Arc<JsonlFeedbackStore>,
  router: Router,
}

impl TestServer {
  fn new() -> Self {
    Self::with_model(Arc::new(ScriptedModel::new(FULL_REPLY)))
  }

  fn with_model(model: Arc<dyn GenerativeModel>) -> Self {
    let dir = TempDir::new().unwrap();
    let mut config = CanvassConfig::default();
    config.data_dir = dir.path().to_path_buf();
    config.index.dimension = DIMENSION;

    let store = Arc::new(JsonlFeedbackStore::new(config.feedback_dir()));
    let logs = Arc::new(DaemonLogs::new_with_silent(config.server_logs_path(), true).unwrap());
    let state = AppState::new(
      &config,
      store.clone(),
      Arc::new(HashingEmbedder::new(DIMENSION)),
      Arc::new(MemoryIndex::new(DIMENSION)),
      model,
      logs,
    );

    Self { _dir: dir, store, router: create_router(state) }
  }

  async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
    let response = self.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, body)
  }

  async fn get(&self, uri: &str) -> (StatusCode, Value) {
    self.send(Request::get(uri).body(Body::empty()).unwrap()).await
  }

  async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::post(uri)
      .header("content-type", "application/json")
      .body(Body::from(body.to_string()))
      .unwrap();
    self.send(request).await
  }
}

fn first_error_key(body: &Value) -> &str {
  body["errors"][0]["key"].as_str().unwrap_or_default()
}

#[tokio::test]
async fn test_submit_then_ask() {
  let server = TestServer::new();

  let (status, body) = server
    .post(
      "/feedback",
      json!({ "customerName": "Amy Chen", "feedback": "Delivery was fast", "rating": 5 }),
    )
    .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["feedback"]["customerName"], "Amy Chen");
  assert_eq!(body["feedback"]["rating"], 5);
  assert_eq!(body["indexed"], true);

  let (status, body) = server.post("/ask", json!({ "question": "How is delivery?" })).await;
  assert_eq!(status, StatusCode::OK);
  assert!(body["transaction_id"].is_string());
  assert_eq!(body["feedbackStats"]["totalFeedbacks"], 1);
  assert_eq!(body["feedbackStats"]["averageRating"], 5.0);
  assert_eq!(body["answer"]["confidence"], "high");
  assert!(body["answer"]["sections"]["DATA COVERAGE"].is_string());
  assert_eq!(body["answer"]["evidence"][0]["kind"], "quote");
  assert_eq!(body["context"]["included"], 1);
}

#[tokio::test]
async fn test_blank_question_is_a_bad_request() {
  let server = TestServer::new();

  let (status, body) = server.post("/ask", json!({ "question": "   " })).await;

  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(first_error_key(&body), "validation_error");
  assert_eq!(body["errors"][0]["context"]["retryable"], false);
}

#[tokio::test]
async fn test_missing_question_is_a_bad_request() {
  let server = TestServer::new();

  for body in [json!({}), json!({ "formUrlId": "spring" })] {
    let (status, body) = server.post("/ask", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(first_error_key(&body), "validation_error");
  }
}

#[tokio::test]
async fn test_undecodable_bodies_use_the_error_envelope() {
  let server = TestServer::new();

  let (status, body) = server
    .post("/feedback", json!({ "customerName": "Amy", "feedback": "ok", "rating": 4.5 }))
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(first_error_key(&body), "validation_error");
  assert!(!body.to_string().contains("i64"));

  let (status, body) = server.post("/feedback", json!({})).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(first_error_key(&body), "validation_error");

  let request = Request::post("/ask")
    .header("content-type", "application/json")
    .body(Body::from("{\"question\": "))
    .unwrap();
  let (status, body) = server.send(request).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(first_error_key(&body), "validation_error");

  assert!(server.store.load_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_conflicting_scope_is_a_bad_request() {
  let server = TestServer::new();

  let (status, _) =
    server.post("/ask", json!({ "question": "Why?", "formId": "a", "formUrlId": "b" })).await;

  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_form_is_not_found() {
  let server = TestServer::new();

  let (status, body) =
    server.post("/ask", json!({ "question": "Why?", "formUrlId": "nope" })).await;

  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(first_error_key(&body), "not_found");
  assert_eq!(body["errors"][0]["message"], "Form not found");
}

#[tokio::test]
async fn test_question_without_feedback_is_not_found() {
  let server = TestServer::new();

  let (status, body) = server.post("/ask", json!({ "question": "Anyone there?" })).await;

  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["errors"][0]["message"], "Feedback not found");
}

#[tokio::test]
async fn test_generation_failure_is_a_bad_gateway_without_details() {
  let server = TestServer::with_model(Arc::new(QuotaExceeded));
  server
    .post("/feedback", json!({ "customerName": "Bo", "feedback": "Too slow", "rating": 2 }))
    .await;

  let (status, body) = server.post("/ask", json!({ "question": "Speed?" })).await;

  assert_eq!(status, StatusCode::BAD_GATEWAY);
  assert_eq!(first_error_key(&body), "generation_service_error");
  assert!(!body.to_string().contains("AIza"));
}

#[tokio::test]
async fn test_out_of_range_rating_is_rejected() {
  let server = TestServer::new();

  for rating in [0, 6, -1] {
    let (status, body) = server
      .post("/feedback", json!({ "customerName": "Cy", "feedback": "Fine", "rating": rating }))
      .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "rating {rating}");
    assert_eq!(first_error_key(&body), "validation_error");
  }

  assert!(server.store.load_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_form_details_include_feedback_and_stats() {
  let server = TestServer::new();
  let form = Form::new("Spring survey".to_string(), "spring".to_string());
  server.store.create_form(&form).await.unwrap();

  for (name, rating) in [("Amy", 5), ("Bo", 2)] {
    let (status, _) = server
      .post(
        "/feedback",
        json!({ "customerName": name, "feedback": "Noted", "rating": rating, "formId": form.id }),
      )
      .await;
    assert_eq!(status, StatusCode::OK);
  }

  let (status, body) = server.get("/forms/spring").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["form"]["title"], "Spring survey");
  assert_eq!(body["feedback"].as_array().unwrap().len(), 2);
  assert_eq!(body["feedbackStats"]["averageRating"], 3.5);

  let (status, _) = server.get("/forms/autumn").await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_status_reports_configuration() {
  let server = TestServer::new();

  let (status, body) = server.get("/status").await;

  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "healthy");
  assert_eq!(body["dimension"], DIMENSION);
  assert_eq!(body["index_name"], "survey");
}

#[tokio::test]
async fn test_api_info_lists_request_schemas() {
  let server = TestServer::new();

  let (status, body) = server.get("/api").await;

  assert_eq!(status, StatusCode::OK);
  assert!(body["schemas"]["AskRequest"].is_object());
  assert!(body["schemas"]["SubmitFeedbackRequest"].is_object());
}

#[tokio::test]
async fn test_requests_are_recorded_in_logs() {
  let server = TestServer::new();
  server.get("/version").await;

  let (status, body) = server.get("/logs?limit=10").await;
  assert_eq!(status, StatusCode::OK);
  let logs = body["logs"].as_array().unwrap();
  assert!(logs.iter().any(|entry| entry["context"]["path"] == "/version"));

  let (status, body) = server.get("/logs?level=loud").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(first_error_key(&body), "validation_error");
}
