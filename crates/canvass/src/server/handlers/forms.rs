//! Form lookup handler

use axum::extract::{Extension, Path, State};
use axum::response::Json;

use crate::error::{Dependency, PipelineError, Result};
use crate::server::handlers::{fail, ApiResult};
use crate::server::middleware::RequestContext;
use crate::server::models::{FeedbackRecord, Form};
use crate::server::services::normalizer::{compute_stats, normalize};
use crate::server::services::retry::with_timeout;
use crate::server::state::AppState;
use crate::server::types::{BaseResponse, FormDetailsResponse};

const COMPONENT: &str = "forms-api";

/// GET /forms/{form_url_id} - A form with its feedback and summary stats
pub async fn get_form(
  State(state): State<AppState>,
  Extension(context): Extension<RequestContext>,
  Path(form_url_id): Path<String>,
) -> ApiResult<FormDetailsResponse> {
  match load_form(&state, &form_url_id).await {
    Ok((form, feedback)) => {
      let feedback_stats = compute_stats(&normalize(&feedback));
      let response = FormDetailsResponse { form, feedback, feedback_stats };
      Ok(Json(BaseResponse::success(response, context.request_id)))
    }
    Err(e) => Err(fail(&context, COMPONENT, e).await),
  }
}

async fn load_form(state: &AppState, form_url_id: &str) -> Result<(Form, Vec<FeedbackRecord>)> {
  with_timeout(Dependency::FeedbackStore, state.store_timeout, async {
    let form = state
      .store
      .find_form_by_url_id(form_url_id)
      .await?
      .ok_or_else(|| PipelineError::NotFound("Form".to_string()))?;
    let feedback = state.store.load_by_form(&form.id).await?;
    Ok((form, feedback))
  })
  .await
}
