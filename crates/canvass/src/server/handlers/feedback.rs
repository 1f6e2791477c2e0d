//! Feedback submission handler

use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, Json, State};
use axum::response::Json as ResponseJson;

use crate::server::handlers::{fail, json_body, ApiResult};
use crate::server::middleware::RequestContext;
use crate::server::state::AppState;
use crate::server::types::{BaseResponse, SubmitFeedbackRequest, SubmitFeedbackResponse};

const COMPONENT: &str = "feedback-api";

/// POST /feedback - Store a submission and index it for retrieval
pub async fn submit_feedback(
  State(state): State<AppState>,
  Extension(context): Extension<RequestContext>,
  body: Result<Json<SubmitFeedbackRequest>, JsonRejection>,
) -> ApiResult<SubmitFeedbackResponse> {
  let request = json_body(&context, COMPONENT, body).await?;
  match state.ingestor.submit(request).await {
    Ok(receipt) => {
      if receipt.indexed {
        context.log_success(&format!("Stored feedback {}", receipt.record.id), COMPONENT).await;
      } else {
        context
          .log_warn(
            &format!("Stored feedback {} without indexing it", receipt.record.id),
            COMPONENT,
          )
          .await;
      }
      let response = SubmitFeedbackResponse { feedback: receipt.record, indexed: receipt.indexed };
      Ok(ResponseJson(BaseResponse::success(response, context.request_id)))
    }
    Err(e) => Err(fail(&context, COMPONENT, e).await),
  }
}
