/// Chat endpoints
///
/// The bot creates a messenger group for every deal and registers it here.
/// Groups are recycled: once a deal is paid and some time has passed, the
/// chat is offered again for a new deal.
///
/// # Endpoints
///
/// - `POST  /chats` - Register a chat
/// - `GET   /chats?db_chat_id|supergroup_id|chat_id` - Look up one chat
/// - `PATCH /chats/type` - Change chat type (e.g. group upgraded to supergroup)
/// - `PATCH /chats/group-title` - Rename
/// - `GET   /chats/unused?hours=12` - Chats free for reuse
/// - `GET   /chats/exists?task_id&executor_id&client_id` - Active chat check
/// - `GET   /chats/recent-clients/:executor_id` - Clients of an executor
/// - `GET   /chats/chats-by-task/:task_id` - Active chats of a task
/// - `GET   /chats/user/:client_id` - Client's free chats
/// - `PATCH /chats/:db_chat_id` - Partial update

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{message, non_empty, MessageResponse},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use taskhub_shared::models::{
    chat::{Chat, ChatLookup, ChatType, CreateChat, UpdateChat},
    user::User,
};
use validator::Validate;

/// Hours after payment before a chat may be reused
const DEFAULT_REUSE_HOURS: i32 = 12;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(find_chat).post(create_chat))
        .route("/type", patch(update_type))
        .route("/group-title", patch(update_group_title))
        .route("/unused", get(list_unused))
        .route("/exists", get(chat_exists))
        .route("/recent-clients/:executor_id", get(recent_clients))
        .route("/chats-by-task/:task_id", get(chats_by_task))
        .route("/user/:client_id", get(free_chats_for_client))
        .route("/:db_chat_id", patch(update_chat))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateChatRequest {
    pub chat_id: i64,
    pub task_id: i32,

    #[validate(length(min = 1, max = 255, message = "Group name must be 1-255 characters"))]
    pub group_name: String,

    pub invite_link: Option<String>,
    pub participants_count: Option<i32>,
    pub client_id: i64,
    pub executor_id: i64,

    #[validate(length(min = 1, message = "Chat admin must not be empty"))]
    pub chat_admin: String,

    pub supergroup_id: Option<i64>,

    #[serde(default)]
    pub chat_type: ChatType,
}

#[derive(Debug, Deserialize)]
pub struct ChatQuery {
    pub chat_id: Option<i64>,
    pub db_chat_id: Option<i32>,
    pub supergroup_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTypeRequest {
    pub chat_type: ChatType,
    pub supergroup_id: Option<i64>,
    pub db_chat_id: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateGroupTitleRequest {
    pub db_chat_id: i32,

    #[validate(length(min = 1, max = 255, message = "Group name must be 1-255 characters"))]
    pub group_name: String,
}

#[derive(Debug, Deserialize)]
pub struct UnusedQuery {
    pub hours: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ExistsQuery {
    pub task_id: i32,
    pub executor_id: i64,
    pub client_id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExistsResponse {
    pub exists: bool,
}

pub async fn create_chat(
    State(state): State<AppState>,
    Json(req): Json<CreateChatRequest>,
) -> ApiResult<(StatusCode, Json<Chat>)> {
    req.validate()?;

    let chat = Chat::create(
        &state.db,
        CreateChat {
            chat_id: req.chat_id,
            task_id: req.task_id,
            group_name: req.group_name,
            invite_link: req.invite_link,
            participants_count: req.participants_count,
            client_id: req.client_id,
            executor_id: req.executor_id,
            chat_admin: req.chat_admin,
            supergroup_id: req.supergroup_id,
            chat_type: req.chat_type,
        },
    )
    .await?;

    tracing::info!(id = chat.id, chat_id = chat.chat_id, task_id = req.task_id, "Chat registered");

    Ok((StatusCode::CREATED, Json(chat)))
}

/// Look up one chat by the most specific key given
///
/// # Errors
///
/// - `400 Bad Request`: no key given
/// - `404 Not Found`: no such chat
pub async fn find_chat(
    State(state): State<AppState>,
    Query(query): Query<ChatQuery>,
) -> ApiResult<Json<Chat>> {
    let lookup = ChatLookup::from_keys(query.db_chat_id, query.supergroup_id, query.chat_id)
        .ok_or_else(|| {
            ApiError::BadRequest(
                "One of db_chat_id, supergroup_id or chat_id is required".to_string(),
            )
        })?;

    let chat = Chat::find(&state.db, lookup)
        .await?
        .ok_or_else(|| ApiError::not_found("Chat"))?;

    Ok(Json(chat))
}

pub async fn update_type(
    State(state): State<AppState>,
    Json(req): Json<UpdateTypeRequest>,
) -> ApiResult<Json<MessageResponse>> {
    if !Chat::update_type(&state.db, req.db_chat_id, req.chat_type, req.supergroup_id).await? {
        return Err(ApiError::not_found("Chat"));
    }

    Ok(message("Chat type updated"))
}

pub async fn update_group_title(
    State(state): State<AppState>,
    Json(req): Json<UpdateGroupTitleRequest>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate()?;

    if !Chat::update_group_name(&state.db, req.db_chat_id, &req.group_name).await? {
        return Err(ApiError::not_found("Chat"));
    }

    Ok(message("Group title updated"))
}

pub async fn update_chat(
    State(state): State<AppState>,
    Path(db_chat_id): Path<i32>,
    Json(req): Json<UpdateChat>,
) -> ApiResult<Json<Chat>> {
    let chat = Chat::update(&state.db, db_chat_id, req)
        .await?
        .ok_or_else(|| ApiError::not_found("Chat"))?;

    Ok(Json(chat))
}

pub async fn list_unused(
    State(state): State<AppState>,
    Query(query): Query<UnusedQuery>,
) -> ApiResult<Json<Vec<Chat>>> {
    let hours = query.hours.unwrap_or(DEFAULT_REUSE_HOURS);
    if hours < 0 {
        return Err(ApiError::BadRequest("hours must not be negative".to_string()));
    }

    Ok(Json(Chat::list_unused(&state.db, hours).await?))
}

pub async fn chat_exists(
    State(state): State<AppState>,
    Query(query): Query<ExistsQuery>,
) -> ApiResult<Json<ExistsResponse>> {
    let exists =
        Chat::exists_active(&state.db, query.task_id, query.executor_id, query.client_id).await?;

    Ok(Json(ExistsResponse { exists }))
}

pub async fn recent_clients(
    State(state): State<AppState>,
    Path(executor_id): Path<i64>,
) -> ApiResult<Json<Vec<User>>> {
    non_empty(User::list_recent_clients(&state.db, executor_id).await?, "clients")
}

pub async fn chats_by_task(
    State(state): State<AppState>,
    Path(task_id): Path<i32>,
) -> ApiResult<Json<Vec<Chat>>> {
    non_empty(Chat::list_active_by_task(&state.db, task_id).await?, "chats")
}

pub async fn free_chats_for_client(
    State(state): State<AppState>,
    Path(client_id): Path<i64>,
) -> ApiResult<Json<Vec<Chat>>> {
    Ok(Json(Chat::list_free_for_client(&state.db, client_id).await?))
}
