//! Logs endpoint handler

use axum::extract::{Extension, Query};
use axum::http::StatusCode;
use axum::response::Json;

use bentley::daemon_logs::LogLevel;

use crate::server::handlers::ApiResult;
use crate::server::middleware::RequestContext;
use crate::server::types::{ApiError, BaseResponse, LogsQuery, LogsResponse};

const DEFAULT_LIMIT: usize = 100;

/// GET /logs - Most recent server log entries
pub async fn get_logs(
  Extension(context): Extension<RequestContext>,
  Query(query): Query<LogsQuery>,
) -> ApiResult<LogsResponse> {
  let level = match query.level.as_deref().map(str::parse::<LogLevel>).transpose() {
    Ok(level) => level,
    Err(e) => {
      let error = ApiError::new("validation_error", &e);
      return Err((
        StatusCode::BAD_REQUEST,
        Json(BaseResponse::<()>::error(vec![error], context.request_id)),
      ));
    }
  };

  match context.logger.get_logs(Some(query.limit.unwrap_or(DEFAULT_LIMIT)), level).await {
    Ok(logs) => Ok(Json(BaseResponse::success(LogsResponse { logs }, context.request_id))),
    Err(e) => {
      context.log_error(&format!("Failed to read logs: {e}"), "logs-api").await;
      let error = ApiError::new("logs_read_failed", "Failed to read logs");
      Err((
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(BaseResponse::<()>::error(vec![error], context.request_id)),
      ))
    }
  }
}
