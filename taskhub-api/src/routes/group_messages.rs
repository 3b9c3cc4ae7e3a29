/// Group message endpoints
///
/// - `POST /group-messages` - Store the announcement message of a task
/// - `GET  /group-messages/:task_id` - First announcement of a task

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
use taskhub_shared::models::group_message::{CreateGroupMessage, GroupMessage};
use validator::Validate;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_group_message))
        .route("/:task_id", get(get_group_message))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateGroupMessageRequest {
    pub group_message_id: i64,
    pub task_id: i32,

    #[validate(length(min = 1, message = "Message text must not be empty"))]
    pub message_text: String,

    #[serde(default)]
    pub has_files: bool,
}

/// # Errors
///
/// - `400 Bad Request`: message id already stored or task unknown
pub async fn create_group_message(
    State(state): State<AppState>,
    Json(req): Json<CreateGroupMessageRequest>,
) -> ApiResult<(StatusCode, Json<GroupMessage>)> {
    req.validate()?;

    let created = GroupMessage::create(
        &state.db,
        CreateGroupMessage {
            group_message_id: req.group_message_id,
            task_id: req.task_id,
            message_text: req.message_text,
            has_files: req.has_files,
        },
    )
    .await
    .map_err(|e| match ApiError::from(e) {
        ApiError::Conflict(msg) => ApiError::BadRequest(msg),
        other => other,
    })?;

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_group_message(
    State(state): State<AppState>,
    Path(task_id): Path<i32>,
) -> ApiResult<Json<GroupMessage>> {
    let found = GroupMessage::find_by_task(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Group message"))?;

    Ok(Json(found))
}
