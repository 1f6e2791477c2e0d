//! HTTP client tests against mocked Gemini and Pinecone endpoints

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use canvass::config::{EmbeddingConfig, GenerationConfig, IndexConfig};
use canvass::error::{Dependency, PipelineError};
use canvass::server::services::embeddings::{EmbeddingClient, GeminiEmbeddingClient};
use canvass::server::services::generation::{GeminiGenerationClient, GenerativeModel};
use canvass::server::services::vector_index::{PineconeIndex, VectorIndex, VectorMetadata};

const GEMINI_KEY: &str = "gemini-test-key";
const PINECONE_KEY: &str = "pinecone-test-key";

fn embedding_config(server: &MockServer) -> EmbeddingConfig {
  EmbeddingConfig {
    endpoint: server.uri(),
    api_key: Some(GEMINI_KEY.to_string()),
    ..EmbeddingConfig::default()
  }
}

fn generation_config(server: &MockServer) -> GenerationConfig {
  GenerationConfig {
    endpoint: server.uri(),
    api_key: Some(GEMINI_KEY.to_string()),
    ..GenerationConfig::default()
  }
}

fn index_config(server: &MockServer, host: Option<String>) -> IndexConfig {
  IndexConfig {
    name: "survey".to_string(),
    dimension: 3,
    control_plane: server.uri(),
    host,
    api_key: Some(PINECONE_KEY.to_string()),
    ..IndexConfig::default()
  }
}

fn metadata(customer: &str, feedback: &str) -> VectorMetadata {
  VectorMetadata {
    customer_name: customer.to_string(),
    feedback: feedback.to_string(),
    rating: 4,
    created_at: None,
    form_id: Some("form-1".to_string()),
  }
}

// Embeddings
// ==========

#[tokio::test]
async fn test_embedding_request_returns_vector() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .and(path("/models/text-embedding-004:embedContent"))
    .and(header("x-goog-api-key", GEMINI_KEY))
    .and(body_partial_json(json!({ "content": { "parts": [{ "text": "Great service" }] } })))
    .respond_with(
      ResponseTemplate::new(200)
        .set_body_json(json!({ "embedding": { "values": [0.1, 0.2, 0.3] } })),
    )
    .expect(1)
    .mount(&server)
    .await;

  let client = GeminiEmbeddingClient::new(&embedding_config(&server)).unwrap();
  let vector = client.embed("Great service").await.unwrap();

  assert_eq!(vector, vec![0.1, 0.2, 0.3]);
}

#[tokio::test]
async fn test_embedding_api_error_is_an_embedding_failure() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
    .mount(&server)
    .await;

  let client = GeminiEmbeddingClient::new(&embedding_config(&server)).unwrap();
  let error = client.embed("Great service").await.unwrap_err();

  assert!(matches!(error, PipelineError::EmbeddingService(_)));
  assert!(error.is_retryable());
}

#[tokio::test]
async fn test_rejected_embedding_key_is_not_retryable() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .respond_with(ResponseTemplate::new(401).set_body_string("API key not valid"))
    .expect(1)
    .mount(&server)
    .await;

  let client = GeminiEmbeddingClient::new(&embedding_config(&server)).unwrap();
  let error = client.embed("Great service").await.unwrap_err();

  assert!(matches!(
    error,
    PipelineError::DependencyRejected { dependency: Dependency::Embedding, .. }
  ));
  assert!(!error.is_retryable());
  assert_eq!(error.code(), "embedding_service_error");
}

#[tokio::test]
async fn test_empty_embedding_is_rejected() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .respond_with(
      ResponseTemplate::new(200).set_body_json(json!({ "embedding": { "values": [] } })),
    )
    .mount(&server)
    .await;

  let client = GeminiEmbeddingClient::new(&embedding_config(&server)).unwrap();
  let error = client.embed("Great service").await.unwrap_err();

  assert!(matches!(error, PipelineError::EmbeddingService(_)));
}

// Generation
// ==========

#[tokio::test]
async fn test_generation_joins_candidate_parts() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .and(path("/models/gemini-1.5-flash:generateContent"))
    .and(header("x-goog-api-key", GEMINI_KEY))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "candidates": [
        { "content": { "parts": [{ "text": "ANALYSIS: " }, { "text": "Mostly positive." }] } },
        { "content": { "parts": [{ "text": "ignored" }] } }
      ]
    })))
    .expect(1)
    .mount(&server)
    .await;

  let client = GeminiGenerationClient::new(&generation_config(&server)).unwrap();
  let text = client.generate("prompt").await.unwrap();

  assert_eq!(text, "ANALYSIS: Mostly positive.");
}

#[tokio::test]
async fn test_generation_without_candidates_fails() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
    .mount(&server)
    .await;

  let client = GeminiGenerationClient::new(&generation_config(&server)).unwrap();
  let error = client.generate("prompt").await.unwrap_err();

  assert!(matches!(error, PipelineError::GenerationService(_)));
  assert!(!error.is_retryable());
}

// Vector index
// ============

#[tokio::test]
async fn test_missing_index_is_created_then_used() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/indexes/survey"))
    .and(header("Api-Key", PINECONE_KEY))
    .respond_with(ResponseTemplate::new(404))
    .expect(1)
    .mount(&server)
    .await;
  Mock::given(method("POST"))
    .and(path("/indexes"))
    .and(body_partial_json(json!({
      "name": "survey",
      "dimension": 3,
      "spec": { "serverless": { "cloud": "aws", "region": "us-east-1" } }
    })))
    .respond_with(
      ResponseTemplate::new(201).set_body_json(json!({ "dimension": 3, "host": server.uri() })),
    )
    .expect(1)
    .mount(&server)
    .await;
  Mock::given(method("POST"))
    .and(path("/vectors/upsert"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "upsertedCount": 1 })))
    .expect(1)
    .mount(&server)
    .await;

  let index = PineconeIndex::connect(&index_config(&server, None)).await.unwrap();
  index.upsert("record-1", &[0.1, 0.2, 0.3], &metadata("Amy", "Fast")).await.unwrap();
}

#[tokio::test]
async fn test_existing_index_with_other_dimension_is_refused() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/indexes/survey"))
    .respond_with(
      ResponseTemplate::new(200).set_body_json(json!({ "dimension": 1536, "host": server.uri() })),
    )
    .mount(&server)
    .await;

  let Err(error) = PineconeIndex::connect(&index_config(&server, None)).await else {
    panic!("connect should fail on a dimension mismatch");
  };
  assert_eq!(error, PipelineError::DimensionMismatch { expected: 3, actual: 1536 });
}

#[tokio::test]
async fn test_query_filters_by_form_and_orders_by_score() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .and(path("/query"))
    .and(header("Api-Key", PINECONE_KEY))
    .and(body_partial_json(json!({
      "topK": 2,
      "includeMetadata": true,
      "filter": { "formId": { "$eq": "form-1" } }
    })))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "matches": [
        { "id": "b", "score": 0.42,
          "metadata": { "customerName": "Bo", "feedback": "Slow", "rating": 2.0 } },
        { "id": "a", "score": 0.91,
          "metadata": { "customerName": "Amy", "feedback": "Fast", "rating": 5.0,
                        "formId": "form-1" } },
        { "id": "c", "score": 0.10, "metadata": { "unrelated": true } }
      ]
    })))
    .expect(1)
    .mount(&server)
    .await;

  // An explicit host skips the control plane entirely
  let index = PineconeIndex::connect(&index_config(&server, Some(server.uri()))).await.unwrap();
  let matches = index.query(&[0.1, 0.2, 0.3], 2, true, Some("form-1")).await.unwrap();

  assert_eq!(matches.len(), 2);
  assert_eq!(matches[0].id, "a");
  assert_eq!(matches[1].id, "b");
  let first = matches[0].metadata.as_ref().unwrap();
  assert_eq!(first.customer_name, "Amy");
  assert_eq!(first.rating, 5);
  assert_eq!(first.form_id.as_deref(), Some("form-1"));
}

#[tokio::test]
async fn test_unreadable_match_metadata_is_dropped() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .and(path("/query"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "matches": [{ "id": "c", "score": 0.5, "metadata": { "unrelated": true } }]
    })))
    .mount(&server)
    .await;

  let index = PineconeIndex::connect(&index_config(&server, Some(server.uri()))).await.unwrap();
  let matches = index.query(&[0.1, 0.2, 0.3], 5, true, None).await.unwrap();

  assert_eq!(matches.len(), 1);
  assert!(matches[0].metadata.is_none());
}

#[tokio::test]
async fn test_index_outage_is_retryable() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .and(path("/query"))
    .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
    .mount(&server)
    .await;

  let index = PineconeIndex::connect(&index_config(&server, Some(server.uri()))).await.unwrap();
  let error = index.query(&[0.1, 0.2, 0.3], 5, true, None).await.unwrap_err();

  assert!(matches!(error, PipelineError::IndexUnavailable(_)));
  assert!(error.is_retryable());
}

#[tokio::test]
async fn test_bad_index_request_is_not_retryable() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .and(path("/query"))
    .respond_with(ResponseTemplate::new(400).set_body_string("invalid filter"))
    .mount(&server)
    .await;

  let index = PineconeIndex::connect(&index_config(&server, Some(server.uri()))).await.unwrap();
  let error = index.query(&[0.1, 0.2, 0.3], 5, true, None).await.unwrap_err();

  assert!(matches!(
    error,
    PipelineError::DependencyRejected { dependency: Dependency::VectorIndex, .. }
  ));
  assert!(!error.is_retryable());
}

#[tokio::test]
async fn test_wrong_length_vector_never_reaches_the_index() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .respond_with(ResponseTemplate::new(200))
    .expect(0)
    .mount(&server)
    .await;

  let index = PineconeIndex::connect(&index_config(&server, Some(server.uri()))).await.unwrap();
  let error = index.upsert("record-1", &[0.1, 0.2], &metadata("Amy", "Fast")).await.unwrap_err();

  assert_eq!(error, PipelineError::DimensionMismatch { expected: 3, actual: 2 });
}
