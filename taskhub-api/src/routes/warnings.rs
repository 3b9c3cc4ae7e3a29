/// Warning endpoints
///
/// - `POST /warnings` - Warn a user; bumps their warning counter
/// - `GET  /warnings/:user_id` - Warnings of a user, newest first

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use taskhub_shared::models::warning::{IssuedWarning, Warning};
use validator::Validate;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(issue_warning))
        .route("/:user_id", get(list_warnings))
}

#[derive(Debug, Deserialize, Validate)]
pub struct IssueWarningRequest {
    pub user_id: i64,

    #[validate(length(min = 1, message = "Reason must not be empty"))]
    pub reason: String,

    pub issued_by: i64,
}

/// # Errors
///
/// - `404 Not Found`: user unknown; nothing is written
pub async fn issue_warning(
    State(state): State<AppState>,
    Json(req): Json<IssueWarningRequest>,
) -> ApiResult<(StatusCode, Json<IssuedWarning>)> {
    req.validate()?;

    let issued = Warning::issue(&state.db, req.user_id, &req.reason, req.issued_by)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    Ok((StatusCode::CREATED, Json(issued)))
}

pub async fn list_warnings(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<Vec<Warning>>> {
    Ok(Json(Warning::list_for_user(&state.db, user_id).await?))
}
