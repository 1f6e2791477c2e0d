//! Axum router configuration for all endpoints

use axum::{
  middleware,
  routing::{get, post},
  Router,
};

use crate::server::handlers::{ask, feedback, forms, logs, status};
use crate::server::middleware::request_context_middleware;
use crate::server::state::AppState;

/// Create the main application router around the shared state
pub fn create_router(state: AppState) -> Router {
  Router::new()
    // Status and version endpoints
    .route("/status", get(status::status))
    .route("/version", get(status::version))
    .route("/api", get(status::api_info))
    // Logs endpoint
    .route("/logs", get(logs::get_logs))
    // Pipeline endpoints
    .route("/ask", post(ask::ask_question))
    .route("/feedback", post(feedback::submit_feedback))
    .route("/forms/{form_url_id}", get(forms::get_form))
    .layer(middleware::from_fn_with_state(state.clone(), request_context_middleware))
    .with_state(state)
}
