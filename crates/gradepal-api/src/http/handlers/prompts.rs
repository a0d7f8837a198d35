//! GET /api/v1/prompts - Suggested conversation starters for the caller's role.

use std::time::Instant;

use axum::Json;
use axum::extract::State;

use gradepal_types::prompt::PromptList;

use crate::http::error::AppError;
use crate::http::extractors::auth::CurrentUser;
use crate::http::response::ApiResponse;
use crate::state::AppState;

pub async fn list_prompts(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ApiResponse<PromptList>>, AppError> {
    let start = Instant::now();
    let prompts = state.prompts.for_role(user.role);
    Ok(Json(ApiResponse::success(PromptList { prompts }, start)))
}
