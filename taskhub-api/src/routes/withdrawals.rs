/// Withdrawal endpoints
///
/// - `POST  /withdrawals` - Request a payout
/// - `GET   /withdrawals/:status` - Requests in a status, newest first
/// - `PATCH /withdrawals` - Admin decision

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{message, MessageResponse},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use taskhub_shared::models::withdrawal::{
    CreateWithdrawalRequest, WithdrawalRequest, WithdrawalStatus,
};
use validator::Validate;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_withdrawal).patch(resolve_withdrawal))
        .route("/:status", get(list_withdrawals))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateWithdrawalBody {
    pub user_id: i64,
    pub amount: Decimal,
    pub commission: Decimal,

    #[serde(default = "default_status")]
    pub status: WithdrawalStatus,

    #[validate(length(min = 1, max = 255, message = "Payment method must be 1-255 characters"))]
    pub payment_method: String,

    pub payment_details: Option<String>,
}

fn default_status() -> WithdrawalStatus {
    WithdrawalStatus::Pending
}

#[derive(Debug, Deserialize)]
pub struct ResolveWithdrawalBody {
    pub request_id: i32,
    pub new_status: WithdrawalStatus,
    pub admin_id: i64,
    pub notes: Option<String>,
}

pub async fn create_withdrawal(
    State(state): State<AppState>,
    Json(req): Json<CreateWithdrawalBody>,
) -> ApiResult<(StatusCode, Json<WithdrawalRequest>)> {
    req.validate()?;

    if req.amount <= Decimal::ZERO {
        return Err(ApiError::BadRequest("amount must be positive".to_string()));
    }
    if req.commission < Decimal::ZERO {
        return Err(ApiError::BadRequest("commission must not be negative".to_string()));
    }

    let request = WithdrawalRequest::create(
        &state.db,
        CreateWithdrawalRequest {
            user_id: req.user_id,
            amount: req.amount,
            commission: req.commission,
            status: req.status,
            payment_method: req.payment_method,
            payment_details: req.payment_details,
        },
    )
    .await?;

    tracing::info!(
        request_id = request.request_id,
        user_id = request.user_id,
        amount = %request.amount,
        "Withdrawal requested"
    );

    Ok((StatusCode::CREATED, Json(request)))
}

pub async fn list_withdrawals(
    State(state): State<AppState>,
    Path(status): Path<WithdrawalStatus>,
) -> ApiResult<Json<Vec<WithdrawalRequest>>> {
    Ok(Json(WithdrawalRequest::list_by_status(&state.db, status).await?))
}

pub async fn resolve_withdrawal(
    State(state): State<AppState>,
    Json(req): Json<ResolveWithdrawalBody>,
) -> ApiResult<Json<MessageResponse>> {
    let resolved = WithdrawalRequest::resolve(
        &state.db,
        req.request_id,
        req.new_status,
        req.admin_id,
        req.notes,
    )
    .await?
    .ok_or_else(|| ApiError::not_found("Withdrawal request"))?;

    tracing::info!(
        request_id = resolved.request_id,
        status = ?resolved.status,
        admin_id = req.admin_id,
        "Withdrawal resolved"
    );
    Ok(message("Withdrawal request updated"))
}
