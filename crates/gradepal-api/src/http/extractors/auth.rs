//! Bearer token authentication extractor.
//!
//! Extracts the token from `Authorization: Bearer <token>`, hashes it with
//! SHA-256 and resolves the owning user through `api_tokens`.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use gradepal_infra::sqlite::identity::hash_token;
use gradepal_types::identity::ChatUser;

use crate::http::error::AppError;
use crate::state::AppState;

/// The authenticated caller. Extracting this validates the bearer token.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub ChatUser);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(parts)?;

        match state.identity.find_user_by_token_hash(&hash_token(&token)).await? {
            Some(user) => Ok(CurrentUser(user)),
            None => Err(AppError::Unauthorized("Invalid token".to_string())),
        }
    }
}

/// Extract the bearer token from request headers.
fn extract_bearer_token(parts: &Parts) -> Result<String, AppError> {
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| {
            AppError::Unauthorized(
                "Missing token. Provide it via 'Authorization: Bearer <token>'.".to_string(),
            )
        })?;
    let value = header
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid Authorization header encoding".to_string()))?;

    match value.strip_prefix("Bearer ").map(str::trim) {
        Some(token) if !token.is_empty() => Ok(token.to_string()),
        _ => Err(AppError::Unauthorized(
            "Authorization header must use the Bearer scheme".to_string(),
        )),
    }
}
