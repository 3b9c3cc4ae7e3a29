/// Payment endpoints
///
/// Money moves in two steps. The client pays into escrow with a transfer;
/// the executor is credited when the client accepts the finished work. Both
/// steps run in one database transaction each (see
/// [`taskhub_shared::ledger::Ledger`]).
///
/// - `POST /payments/transfer` - Client pays for a task
/// - `POST /payments/accept-offer` - Client accepts the work
/// - `GET  /payments/:task_id/:receiver_id/:sender_id` - Whether a deal was paid

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use taskhub_shared::{ledger::validate_amount, models::transaction::Transaction};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/transfer", post(transfer))
        .route("/accept-offer", post(accept_offer))
        .route("/:task_id/:receiver_id/:sender_id", get(payment_status))
}

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub receiver_id: i64,
    pub sender_id: i64,
    pub task_id: i32,
    pub amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct AcceptOfferRequest {
    pub transaction_id: i32,
    pub task_id: i32,
    pub receiver_id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentStatusResponse {
    pub status: bool,
}

/// Debit the client and hold the net amount for the executor
///
/// # Errors
///
/// - `400 Bad Request`: amount not a positive number of cents, or insufficient funds
/// - `404 Not Found`: sender has no balance, or the task does not exist
pub async fn transfer(
    State(state): State<AppState>,
    Json(req): Json<TransferRequest>,
) -> ApiResult<Json<Transaction>> {
    let amount = validate_amount(req.amount)?;

    if req.sender_id == req.receiver_id {
        return Err(ApiError::BadRequest("sender and receiver must differ".to_string()));
    }

    let transaction = state
        .ledger
        .transfer(req.receiver_id, req.sender_id, req.task_id, amount)
        .await?;

    Ok(Json(transaction))
}

/// Complete the transfer and credit the executor
///
/// # Errors
///
/// - `404 Not Found`: transaction or receiver balance missing
/// - `409 Conflict`: transaction already completed or failed
pub async fn accept_offer(
    State(state): State<AppState>,
    Json(req): Json<AcceptOfferRequest>,
) -> ApiResult<Json<Transaction>> {
    let transaction = state
        .ledger
        .accept_done_offer(req.transaction_id, req.task_id, req.receiver_id)
        .await?;

    Ok(Json(transaction))
}

pub async fn payment_status(
    State(state): State<AppState>,
    Path((task_id, receiver_id, sender_id)): Path<(i32, i64, i64)>,
) -> ApiResult<Json<PaymentStatusResponse>> {
    let status = Transaction::exists_for_deal(&state.db, task_id, receiver_id, sender_id).await?;
    Ok(Json(PaymentStatusResponse { status }))
}
