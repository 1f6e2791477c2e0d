//! Status and version endpoint handlers

use axum::extract::{Extension, State};
use axum::response::Json;
use schemars::schema_for;
use std::collections::BTreeMap;

use crate::server::middleware::RequestContext;
use crate::server::state::AppState;
use crate::server::types::{
  ApiInfoResponse, ApiVersions, AskRequest, BaseResponse, LogsQuery, StatusResponse,
  SubmitFeedbackRequest, VersionResponse,
};

/// GET /status - Health check endpoint
pub async fn status(
  State(state): State<AppState>,
  Extension(context): Extension<RequestContext>,
) -> Json<BaseResponse<StatusResponse>> {
  let info = &state.info;
  let response = StatusResponse {
    status: "healthy".to_string(),
    version: env!("CARGO_PKG_VERSION").to_string(),
    data_dir: info.data_dir.clone(),
    index_name: info.index_name.clone(),
    dimension: info.dimension,
    embedding_model: info.embedding_model.clone(),
    generation_model: info.generation_model.clone(),
  };

  Json(BaseResponse::success(response, context.request_id))
}

/// GET /version - Returns current API version
pub async fn version(
  Extension(context): Extension<RequestContext>,
) -> Json<BaseResponse<VersionResponse>> {
  let response = VersionResponse { version: env!("CARGO_PKG_VERSION").to_string() };
  Json(BaseResponse::success(response, context.request_id))
}

/// GET /api - Returns API information, supported versions and request schemas
pub async fn api_info(
  Extension(context): Extension<RequestContext>,
) -> Json<BaseResponse<ApiInfoResponse>> {
  let version = env!("CARGO_PKG_VERSION");
  let response = ApiInfoResponse {
    latest: version.to_string(),
    versions: ApiVersions { latest: version.to_string(), active: vec![version.to_string()] },
    schemas: request_schemas(),
  };

  Json(BaseResponse::success(response, context.request_id))
}

fn request_schemas() -> BTreeMap<String, serde_json::Value> {
  let schemas = [
    ("AskRequest", schema_for!(AskRequest)),
    ("SubmitFeedbackRequest", schema_for!(SubmitFeedbackRequest)),
    ("LogsQuery", schema_for!(LogsQuery)),
  ];

  schemas
    .into_iter()
    .filter_map(|(name, schema)| {
      serde_json::to_value(schema).ok().map(|value| (name.to_string(), value))
    })
    .collect()
}
