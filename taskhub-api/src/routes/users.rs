/// User endpoints
///
/// # Endpoints
///
/// - `POST   /users` - Register a user
/// - `GET    /users/default-users` - All users except superusers
/// - `PATCH  /users/ban` - Ban or unban a user
/// - `GET    /users/similarity/:name` - Fuzzy search by name
/// - `POST   /users/reset-password` - Redeem a reset token
/// - `GET    /users/:telegram_id` - Get a user
/// - `PATCH  /users/:telegram_id` - Update profile fields
/// - `DELETE /users/:telegram_id` - Delete a user
/// - `POST   /users/:telegram_id/verify-password` - Check a password
/// - `POST   /users/:telegram_id/reset-token` - Issue a reset token

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{message, non_empty, MessageResponse},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use taskhub_shared::{
    auth::{
        password::{hash_password, verify_password},
        reset_token::{hash_reset_token, issue_reset_token},
    },
    models::{
        reset_token::ResetToken,
        user::{CreateUser, UpdateUser, User, UserStatus},
    },
};
use validator::Validate;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_user))
        .route("/default-users", get(list_default_users))
        .route("/ban", patch(set_ban))
        .route("/similarity/:name", get(search_similar))
        .route("/reset-password", post(reset_password))
        .route(
            "/:telegram_id",
            get(get_user).patch(update_user).delete(delete_user),
        )
        .route("/:telegram_id/verify-password", post(verify_user_password))
        .route("/:telegram_id/reset-token", post(create_reset_token))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    pub telegram_id: i64,

    #[validate(length(min = 1, max = 255, message = "Username must be 1-255 characters"))]
    pub username: String,

    #[validate(length(min = 1, max = 32, message = "Phone must be 1-32 characters"))]
    pub phone: String,

    #[validate(length(min = 1, message = "Password must not be empty"))]
    pub password: String,

    pub chat_id: i64,

    #[validate(length(min = 1, max = 255, message = "Telegram username must be 1-255 characters"))]
    pub tg_username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(min = 1, max = 255, message = "Nickname must be 1-255 characters"))]
    pub nickname: Option<String>,

    #[validate(length(min = 1, max = 32, message = "Phone must be 1-32 characters"))]
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BanRequest {
    pub user_id: i64,
    pub is_banned: bool,
}

#[derive(Debug, Deserialize)]
pub struct SimilarityQuery {
    #[serde(default)]
    pub is_executor: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyPasswordRequest {
    #[validate(length(min = 1, message = "Password must not be empty"))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyPasswordResponse {
    pub valid: bool,
}

/// Reset token; shown only in this response
#[derive(Debug, Serialize, Deserialize)]
pub struct ResetTokenResponse {
    pub token: String,
    pub expire_date: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "Token must not be empty"))]
    pub token: String,

    #[validate(length(min = 1, message = "Password must not be empty"))]
    pub new_password: String,
}

/// Register a user
///
/// The password is hashed with Argon2id before it reaches the database.
///
/// # Errors
///
/// - `409 Conflict`: telegram id or phone already registered
pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    req.validate()?;

    let hashed = hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            telegram_id: req.telegram_id,
            telegram_username: req.tg_username,
            username: req.username,
            chat_id: req.chat_id,
            phone: req.phone,
            email: req.email,
            hashed_password: hashed.hash,
            salt: hashed.salt,
            user_status: UserStatus::DefaultUser,
        },
    )
    .await?;

    tracing::info!(telegram_id = user.telegram_id, "User registered");

    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(telegram_id): Path<i64>,
) -> ApiResult<Json<User>> {
    let user = User::find_by_id(&state.db, telegram_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    Ok(Json(user))
}

/// Update only the provided profile fields
pub async fn update_user(
    State(state): State<AppState>,
    Path(telegram_id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    req.validate()?;

    let user = User::update(
        &state.db,
        telegram_id,
        UpdateUser {
            email: req.email,
            username: req.nickname,
            phone: req.phone,
        },
    )
    .await?
    .ok_or_else(|| ApiError::not_found("User"))?;

    Ok(Json(user))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(telegram_id): Path<i64>,
) -> ApiResult<Json<MessageResponse>> {
    if !User::delete(&state.db, telegram_id).await? {
        return Err(ApiError::not_found("User"));
    }

    tracing::info!(telegram_id, "User deleted");
    Ok(message("User deleted"))
}

pub async fn list_default_users(State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    non_empty(User::list_default_users(&state.db).await?, "users")
}

pub async fn set_ban(
    State(state): State<AppState>,
    Json(req): Json<BanRequest>,
) -> ApiResult<Json<MessageResponse>> {
    if !User::set_banned(&state.db, req.user_id, req.is_banned).await? {
        return Err(ApiError::not_found("User"));
    }

    tracing::info!(user_id = req.user_id, is_banned = req.is_banned, "Ban status changed");
    Ok(message(if req.is_banned { "User banned" } else { "User unbanned" }))
}

/// Fuzzy search over usernames, best match first
pub async fn search_similar(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<SimilarityQuery>,
) -> ApiResult<Json<Vec<User>>> {
    let users = User::search_similar(&state.db, &name, query.is_executor).await?;
    non_empty(users, "similar users")
}

pub async fn verify_user_password(
    State(state): State<AppState>,
    Path(telegram_id): Path<i64>,
    Json(req): Json<VerifyPasswordRequest>,
) -> ApiResult<Json<VerifyPasswordResponse>> {
    req.validate()?;

    let user = User::find_by_id(&state.db, telegram_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    let valid = verify_password(&req.password, &user.hashed_password, &user.salt)?;

    Ok(Json(VerifyPasswordResponse { valid }))
}

/// Issue a password reset token, replacing any previous one
pub async fn create_reset_token(
    State(state): State<AppState>,
    Path(telegram_id): Path<i64>,
) -> ApiResult<(StatusCode, Json<ResetTokenResponse>)> {
    if User::find_by_id(&state.db, telegram_id).await?.is_none() {
        return Err(ApiError::not_found("User"));
    }

    let ttl = Duration::minutes(state.config.payments.reset_token_ttl_minutes);
    let issued = issue_reset_token(ttl);

    ResetToken::upsert(&state.db, telegram_id, &issued.token_hash, issued.expire_date).await?;

    tracing::info!(telegram_id, "Reset token issued");

    Ok((
        StatusCode::CREATED,
        Json(ResetTokenResponse {
            token: issued.token,
            expire_date: issued.expire_date,
        }),
    ))
}

/// Redeem a reset token and set a new password
///
/// # Errors
///
/// - `400 Bad Request`: token unknown, expired or already used
pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate()?;

    let hashed = hash_password(&req.new_password)?;
    let token_hash = hash_reset_token(&req.token);

    ResetToken::redeem(&state.db, &token_hash, &hashed.hash, &hashed.salt)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Reset token is invalid or expired".to_string()))?;

    Ok(message("Password updated"))
}
