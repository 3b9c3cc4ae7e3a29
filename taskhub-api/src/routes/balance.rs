/// Balance endpoints
///
/// Card numbers are encrypted with the server's [`CardCipher`] before they
/// are stored and decrypted only when a balance is read back.
///
/// # Endpoints
///
/// - `GET   /balance/:user_id` - Balance with decrypted cards
/// - `POST  /balance/:user_id` - Open an empty balance
/// - `PATCH /balance/user-cards` - Store a card
/// - `PATCH /balance/new` - Overwrite the amount
/// - `PATCH /balance/fund-transfer` - Top up or pay out under a row lock
///
/// [`CardCipher`]: taskhub_shared::crypto::card::CardCipher

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{message, MessageResponse},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use taskhub_shared::{
    ledger::validate_amount,
    models::balance::{Balance, BalanceAction},
};
use validator::Validate;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:user_id", get(get_balance).post(create_balance))
        .route("/user-cards", patch(add_card))
        .route("/new", patch(set_amount))
        .route("/fund-transfer", patch(fund_transfer))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub user_id: i64,
    pub balance_money: Decimal,

    /// Plaintext card numbers
    pub user_cards: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddCardRequest {
    pub user_id: i64,

    #[validate(length(min = 12, max = 23, message = "Card number must be 12-19 digits"))]
    pub card: String,
}

#[derive(Debug, Deserialize)]
pub struct SetAmountRequest {
    pub user_id: i64,
    pub new_amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct FundTransferRequest {
    pub user_id: i64,
    pub amount: Decimal,
    pub action: BalanceAction,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FundTransferResponse {
    pub user_id: i64,
    pub balance_money: Decimal,
}

/// Strips spaces and dashes; `None` unless 12-19 digits remain.
fn normalize_card_number(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| !matches!(c, ' ' | '-')).collect();

    let valid = (12..=19).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit());
    valid.then_some(digits)
}

pub async fn get_balance(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<BalanceResponse>> {
    let balance = Balance::find(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Balance"))?;

    let user_cards = state.cipher.decrypt_all(&balance.user_cards)?;

    Ok(Json(BalanceResponse {
        user_id: balance.user_id,
        balance_money: balance.balance_money,
        user_cards,
    }))
}

/// # Errors
///
/// - `409 Conflict`: balance already exists or user unknown
pub async fn create_balance(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> ApiResult<(StatusCode, Json<Balance>)> {
    let balance = Balance::create(&state.db, user_id).await?;

    tracing::info!(user_id, "Balance opened");
    Ok((StatusCode::CREATED, Json(balance)))
}

/// Encrypt and store a card unless it is already stored
pub async fn add_card(
    State(state): State<AppState>,
    Json(req): Json<AddCardRequest>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    req.validate()?;

    let card = normalize_card_number(&req.card)
        .ok_or_else(|| ApiError::BadRequest("Card number must be 12-19 digits".to_string()))?;

    let encrypted = state.cipher.encrypt_card_number(&card);
    let added = Balance::add_card(&state.db, req.user_id, encrypted).await?;

    if added {
        tracing::info!(user_id = req.user_id, "Card stored");
        Ok((StatusCode::CREATED, message("Card added")))
    } else {
        Ok((StatusCode::CREATED, message("Card already stored")))
    }
}

pub async fn set_amount(
    State(state): State<AppState>,
    Json(req): Json<SetAmountRequest>,
) -> ApiResult<Json<MessageResponse>> {
    if req.new_amount < Decimal::ZERO || req.new_amount.normalize().scale() > 2 {
        return Err(ApiError::BadRequest(
            "new_amount must be a non-negative number of cents".to_string(),
        ));
    }

    if !Balance::set_amount(&state.db, req.user_id, req.new_amount).await? {
        return Err(ApiError::not_found("Balance"));
    }

    tracing::info!(user_id = req.user_id, new_amount = %req.new_amount, "Balance overwritten");
    Ok(message("Balance updated"))
}

/// Top up or pay out
///
/// # Errors
///
/// - `400 Bad Request`: amount not a positive number of cents, or payout
///   exceeding the balance
/// - `404 Not Found`: no balance
pub async fn fund_transfer(
    State(state): State<AppState>,
    Json(req): Json<FundTransferRequest>,
) -> ApiResult<Json<FundTransferResponse>> {
    let amount = validate_amount(req.amount)?;

    let balance_money = state
        .ledger
        .adjust_balance(req.user_id, amount, req.action)
        .await?;

    Ok(Json(FundTransferResponse {
        user_id: req.user_id,
        balance_money,
    }))
}
