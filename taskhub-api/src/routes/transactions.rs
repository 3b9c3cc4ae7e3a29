/// Transaction endpoints
///
/// - `POST  /transactions` - Record a transaction (e.g. a provider invoice)
/// - `PATCH /transactions` - Set the status of an invoice
/// - `GET   /transactions?sender_id&receiver_id&...` - Filtered list
/// - `GET   /transactions/:user_id` - Everything a user sent or received

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{message, non_empty, MessageResponse},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use taskhub_shared::ledger::validate_amount;
use taskhub_shared::models::transaction::{
    CreateTransaction, Transaction, TransactionFilter, TransactionStatus, TransactionType,
};
use validator::Validate;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list_filtered).post(create_transaction).patch(update_status),
        )
        .route("/:user_id", get(list_for_user))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTransactionRequest {
    #[validate(length(min = 1, max = 255, message = "Invoice id must be 1-255 characters"))]
    pub invoice_id: String,

    pub amount: Decimal,
    pub transaction_type: TransactionType,
    pub transaction_status: TransactionStatus,
    pub sender_id: Option<i64>,
    pub receiver_id: Option<i64>,
    pub task_id: Option<i32>,
    pub commission: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub invoice_id: String,
    pub new_status: TransactionStatus,
}

/// # Errors
///
/// - `400 Bad Request`: non-positive amount or negative commission
/// - `409 Conflict`: invoice id already recorded
pub async fn create_transaction(
    State(state): State<AppState>,
    Json(req): Json<CreateTransactionRequest>,
) -> ApiResult<(StatusCode, Json<Transaction>)> {
    req.validate()?;

    validate_amount(req.amount)?;
    if req
        .commission
        .is_some_and(|c| c < Decimal::ZERO || c.normalize().scale() > 2)
    {
        return Err(ApiError::BadRequest(
            "commission must be a non-negative number of cents".to_string(),
        ));
    }

    let transaction = Transaction::create(
        &state.db,
        CreateTransaction {
            invoice_id: req.invoice_id,
            amount: req.amount,
            transaction_type: req.transaction_type,
            transaction_status: req.transaction_status,
            sender_id: req.sender_id,
            receiver_id: req.receiver_id,
            task_id: req.task_id,
            commission: req.commission,
        },
    )
    .await?;

    tracing::info!(
        transaction_id = transaction.transaction_id,
        invoice_id = %transaction.invoice_id,
        "Transaction recorded"
    );

    Ok((StatusCode::CREATED, Json(transaction)))
}

pub async fn update_status(
    State(state): State<AppState>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<Json<MessageResponse>> {
    Transaction::update_status_by_invoice(&state.db, &req.invoice_id, req.new_status)
        .await?
        .ok_or_else(|| ApiError::not_found("Transaction"))?;

    Ok(message("Transaction status updated"))
}

pub async fn list_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<Vec<Transaction>>> {
    non_empty(Transaction::list_for_user(&state.db, user_id).await?, "transactions")
}

pub async fn list_filtered(
    State(state): State<AppState>,
    Query(filter): Query<TransactionFilter>,
) -> ApiResult<Json<Vec<Transaction>>> {
    non_empty(Transaction::list_filtered(&state.db, filter).await?, "transactions")
}
