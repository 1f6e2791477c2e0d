//! HTTP handlers and the shared error mapping

pub mod ask;
pub mod feedback;
pub mod forms;
pub mod logs;
pub mod status;

use axum::extract::rejection::JsonRejection;
use axum::{http::StatusCode, response::Json};
use uuid::Uuid;

use crate::error::PipelineError;
use crate::server::middleware::RequestContext;
use crate::server::types::{ApiError, BaseResponse};

pub type ErrorResponse = (StatusCode, Json<BaseResponse<()>>);
pub type ApiResult<T> = Result<Json<BaseResponse<T>>, ErrorResponse>;

pub fn status_for(error: &PipelineError) -> StatusCode {
  match error {
    PipelineError::Validation(_) => StatusCode::BAD_REQUEST,
    PipelineError::NotFound(_) => StatusCode::NOT_FOUND,
    PipelineError::EmbeddingService(_)
    | PipelineError::IndexUnavailable(_)
    | PipelineError::GenerationService(_)
    | PipelineError::DependencyRejected { .. } => StatusCode::BAD_GATEWAY,
    PipelineError::DependencyTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
    PipelineError::DimensionMismatch { .. } | PipelineError::Store(_) => {
      StatusCode::INTERNAL_SERVER_ERROR
    }
  }
}

pub fn error_response(error: &PipelineError, transaction_id: Uuid) -> ErrorResponse {
  (status_for(error), Json(BaseResponse::<()>::error(vec![ApiError::from(error)], transaction_id)))
}

/// Log the full error for operators, then answer with the generic form
pub async fn fail(
  context: &RequestContext,
  component: &str,
  error: PipelineError,
) -> ErrorResponse {
  let message = format!("{} ({})", error, error.code());
  match status_for(&error) {
    status if status.is_server_error() => context.log_error(&message, component).await,
    _ => context.log_warn(&message, component).await,
  }
  error_response(&error, context.request_id)
}

/// Unwrap a JSON body, turning extractor rejections into validation errors
pub async fn json_body<T>(
  context: &RequestContext,
  component: &str,
  body: Result<Json<T>, JsonRejection>,
) -> Result<T, ErrorResponse> {
  match body {
    Ok(Json(value)) => Ok(value),
    Err(rejection) => {
      context
        .log_warn(&format!("Rejected request body: {}", rejection.body_text()), component)
        .await;
      let error =
        PipelineError::Validation("Request body is malformed or has invalid fields".into());
      Err(fail(context, component, error).await)
    }
  }
}
