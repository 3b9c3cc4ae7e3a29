/// Executor endpoints
///
/// # Endpoints
///
/// - `POST  /executors` - Submit an executor application
/// - `GET   /executors` - Users with an accepted profile
/// - `GET   /executors/applications` - Applications awaiting review
/// - `PATCH /executors/applications` - Accept or reject an application
/// - `GET   /executors/:user_id` - Profile of a user
/// - `GET   /executors/:user_id/orders?status=a&status=b` - Tasks the executor works on

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{message, non_empty, MessageResponse},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use axum_extra::extract::Query;
use serde::Deserialize;
use taskhub_shared::models::{
    executor::{CreateExecutor, Executor, ProfileStatus},
    task::{FileType, Task, TaskStatus},
    user::User,
};
use validator::Validate;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_executors).post(create_executor))
        .route(
            "/applications",
            get(list_applications).patch(review_application),
        )
        .route("/:user_id", get(get_executor))
        .route("/:user_id/orders", get(list_orders))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateExecutorRequest {
    pub user_id: i64,

    #[validate(length(min = 1, message = "At least one tag is required"))]
    pub tags: Vec<String>,

    #[validate(length(max = 4096, message = "Description is too long"))]
    pub description: Option<String>,

    #[serde(default)]
    pub work_examples: Vec<String>,

    #[serde(default)]
    pub work_files_type: Vec<FileType>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewApplicationRequest {
    pub executor_id: i32,
    pub new_profile_state: ProfileStatus,
}

#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    /// Repeated or comma separated statuses; all when absent
    #[serde(default)]
    pub status: Vec<String>,
}

/// Submit an application in `created` state
///
/// # Errors
///
/// - `409 Conflict`: user already has a profile or does not exist
pub async fn create_executor(
    State(state): State<AppState>,
    Json(req): Json<CreateExecutorRequest>,
) -> ApiResult<(StatusCode, Json<Executor>)> {
    req.validate()?;

    if req.work_examples.len() != req.work_files_type.len() {
        return Err(ApiError::BadRequest(
            "work_examples and work_files_type must have the same length".to_string(),
        ));
    }

    let executor = Executor::create(
        &state.db,
        CreateExecutor {
            user_id: req.user_id,
            tags: req.tags,
            description: req.description,
            work_examples: req.work_examples,
            work_files_type: req.work_files_type,
        },
    )
    .await?;

    tracing::info!(user_id = executor.user_id, "Executor application submitted");

    Ok((StatusCode::CREATED, Json(executor)))
}

pub async fn get_executor(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<Executor>> {
    let executor = Executor::find_by_user_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Executor"))?;

    Ok(Json(executor))
}

pub async fn list_executors(State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    non_empty(User::list_accepted_executors(&state.db).await?, "executors")
}

pub async fn list_applications(State(state): State<AppState>) -> ApiResult<Json<Vec<Executor>>> {
    non_empty(Executor::list_pending_applications(&state.db).await?, "applications")
}

pub async fn review_application(
    State(state): State<AppState>,
    Json(req): Json<ReviewApplicationRequest>,
) -> ApiResult<Json<MessageResponse>> {
    if !Executor::set_profile_state(&state.db, req.executor_id, req.new_profile_state).await? {
        return Err(ApiError::not_found("Executor"));
    }

    tracing::info!(
        executor_id = req.executor_id,
        state = ?req.new_profile_state,
        "Executor application reviewed"
    );
    Ok(message("Profile state updated"))
}

pub async fn list_orders(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(query): Query<OrdersQuery>,
) -> ApiResult<Json<Vec<Task>>> {
    let statuses = TaskStatus::parse_list(&query.status.join(","))
        .map_err(ApiError::BadRequest)?;

    let orders = Task::list_executor_orders(&state.db, user_id, &statuses).await?;
    non_empty(orders, "orders")
}
