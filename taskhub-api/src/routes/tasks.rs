/// Task endpoints
///
/// # Endpoints
///
/// - `POST  /tasks` - Create a task
/// - `GET   /tasks?user_id&user_type&task_id&task_status` - Tasks of a user
/// - `GET   /tasks/:task_id` - Get a task
/// - `PATCH /tasks/status/:task_id` - Change status
/// - `PATCH /tasks/files/:task_id` - Replace attached files
/// - `GET   /tasks/client-by-task/:task_id` - Client who posted the task
/// - `GET   /tasks/proposed-deals/:user_id/:proposed_by` - Active proposals

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{message, non_empty, MessageResponse},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use axum_extra::extract::Query;
use chrono::NaiveDate;
use serde::Deserialize;
use taskhub_shared::models::{
    task::{CreateTask, FileType, PropositionBy, Task, TaskStatus, UserRole},
    user::User,
};
use validator::Validate;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tasks).post(create_task))
        .route("/:task_id", get(get_task))
        .route("/status/:task_id", patch(update_status))
        .route("/files/:task_id", patch(update_files))
        .route("/client-by-task/:task_id", get(client_by_task))
        .route("/proposed-deals/:user_id/:proposed_by", get(proposed_deals))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    pub client_id: i64,

    #[serde(default = "default_status")]
    pub status: TaskStatus,

    #[validate(length(min = 1, max = 255, message = "Price must be 1-255 characters"))]
    pub price: String,

    #[serde(default)]
    pub subjects: Vec<String>,

    #[serde(default)]
    pub work_type: Vec<String>,

    pub deadline: Option<NaiveDate>,
    pub files: Option<Vec<String>>,
    pub files_type: Option<Vec<FileType>>,
    pub description: Option<String>,

    #[serde(default)]
    pub proposed_by: PropositionBy,

    pub executor_id: Option<i64>,
}

fn default_status() -> TaskStatus {
    TaskStatus::Active
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: TaskStatus,
}

#[derive(Debug, Deserialize)]
pub struct UpdateFilesRequest {
    pub files: Vec<String>,
    pub files_type: Option<Vec<FileType>>,
}

#[derive(Debug, Deserialize)]
pub struct ListTasksQuery {
    pub user_id: i64,
    pub user_type: UserRole,
    pub task_id: Option<i32>,

    /// Repeated (`task_status=a&task_status=b`) or comma separated; all
    /// statuses when absent
    #[serde(default)]
    pub task_status: Vec<String>,
}

pub async fn create_task(
    State(state): State<AppState>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    req.validate()?;

    if let (Some(files), Some(types)) = (&req.files, &req.files_type) {
        if files.len() != types.len() {
            return Err(ApiError::BadRequest(
                "files and files_type must have the same length".to_string(),
            ));
        }
    }

    let task = Task::create(
        &state.db,
        CreateTask {
            client_id: req.client_id,
            status: req.status,
            price: req.price,
            subjects: req.subjects,
            work_type: req.work_type,
            deadline: req.deadline,
            files: req.files,
            files_type: req.files_type,
            description: req.description,
            proposed_by: req.proposed_by,
            executor_id: req.executor_id,
        },
    )
    .await?;

    tracing::info!(task_id = task.task_id, client_id = req.client_id, "Task created");

    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<i32>,
) -> ApiResult<Json<Task>> {
    let task = Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task"))?;

    Ok(Json(task))
}

pub async fn update_status(
    State(state): State<AppState>,
    Path(task_id): Path<i32>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<Json<MessageResponse>> {
    if !Task::update_status(&state.db, task_id, req.status).await? {
        return Err(ApiError::not_found("Task"));
    }

    tracing::info!(task_id, status = %req.status, "Task status changed");
    Ok(message(format!("Task status updated to {}", req.status)))
}

pub async fn update_files(
    State(state): State<AppState>,
    Path(task_id): Path<i32>,
    Json(req): Json<UpdateFilesRequest>,
) -> ApiResult<Json<MessageResponse>> {
    if let Some(types) = &req.files_type {
        if types.len() != req.files.len() {
            return Err(ApiError::BadRequest(
                "files and files_type must have the same length".to_string(),
            ));
        }
    }

    if !Task::update_files(&state.db, task_id, req.files, req.files_type).await? {
        return Err(ApiError::not_found("Task"));
    }

    Ok(message("Task files updated"))
}

/// Tasks where the user is client (or executor) in the given statuses
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<ListTasksQuery>,
) -> ApiResult<Json<Vec<Task>>> {
    let statuses = TaskStatus::parse_list(&query.task_status.join(","))
        .map_err(ApiError::BadRequest)?;

    let tasks = Task::list_for_user(
        &state.db,
        query.user_id,
        query.user_type,
        &statuses,
        query.task_id,
    )
    .await?;

    Ok(Json(tasks))
}

pub async fn client_by_task(
    State(state): State<AppState>,
    Path(task_id): Path<i32>,
) -> ApiResult<Json<User>> {
    let client = User::find_client_by_task(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Client"))?;

    Ok(Json(client))
}

pub async fn proposed_deals(
    State(state): State<AppState>,
    Path((user_id, proposed_by)): Path<(i64, PropositionBy)>,
) -> ApiResult<Json<Vec<Task>>> {
    let tasks = Task::list_proposed_deals(&state.db, user_id, proposed_by).await?;
    non_empty(tasks, "proposed deals")
}
