//! POST /api/v1/grades - Record (create or overwrite) a grade.
//!
//! Lecturer only, and only for assessments in the lecturer's own subjects.
//! Every successful write publishes `grade_created` on the notification bus.

use std::time::Instant;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use gradepal_types::records::{Grade, GradeInput};

use crate::http::error::AppError;
use crate::http::extractors::auth::CurrentUser;
use crate::http::response::ApiResponse;
use crate::state::AppState;

pub async fn record_grade(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<GradeInput>,
) -> Result<(StatusCode, Json<ApiResponse<Grade>>), AppError> {
    let start = Instant::now();
    let grade = state.records.record_grade(&user, body).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(grade, start))))
}
