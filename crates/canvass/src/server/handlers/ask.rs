//! Question endpoint handler

use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, Json, State};
use axum::response::Json as ResponseJson;

use crate::server::handlers::{fail, json_body, ApiResult};
use crate::server::middleware::RequestContext;
use crate::server::state::AppState;
use crate::server::types::{AskRequest, AskResponse, BaseResponse};

const COMPONENT: &str = "ask-api";

/// POST /ask - Answer a question over the scoped feedback
pub async fn ask_question(
  State(state): State<AppState>,
  Extension(context): Extension<RequestContext>,
  body: Result<Json<AskRequest>, JsonRejection>,
) -> ApiResult<AskResponse> {
  let request = json_body(&context, COMPONENT, body).await?;
  context.log_info(&format!("Question received: {:?}", request.question), COMPONENT).await;

  match state.orchestrator.answer_question(&request.question, &request.scope()).await {
    Ok(report) => {
      context
        .log_success(
          &format!(
            "Answered from {} feedback entries ({} in context, confidence {})",
            report.stats.total_feedbacks, report.context.included, report.answer.confidence
          ),
          COMPONENT,
        )
        .await;
      Ok(ResponseJson(BaseResponse::success(AskResponse::from(report), context.request_id)))
    }
    Err(e) => Err(fail(&context, COMPONENT, e).await),
  }
}
