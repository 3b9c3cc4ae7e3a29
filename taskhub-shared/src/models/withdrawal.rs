/// Withdrawal requests
///
/// Users ask to cash out their balance; an admin processes or rejects the
/// request by hand and the decision is recorded here.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "withdrawal_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalStatus {
    Pending,
    Processed,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WithdrawalRequest {
    pub request_id: i32,
    pub user_id: i64,
    pub amount: Decimal,
    pub commission: Decimal,
    pub request_date: DateTime<Utc>,
    pub status: WithdrawalStatus,

    /// E.g. "card"
    pub payment_method: String,
    pub payment_details: Option<String>,

    pub processed_date: Option<DateTime<Utc>>,
    pub admin_id: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWithdrawalRequest {
    pub user_id: i64,
    pub amount: Decimal,
    pub commission: Decimal,
    pub status: WithdrawalStatus,
    pub payment_method: String,
    pub payment_details: Option<String>,
}

impl WithdrawalRequest {
    pub async fn create(pool: &PgPool, data: CreateWithdrawalRequest) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, WithdrawalRequest>(
            r#"
            INSERT INTO withdrawal_requests (
                user_id, amount, commission, status, payment_method, payment_details
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(data.user_id)
        .bind(data.amount)
        .bind(data.commission)
        .bind(data.status)
        .bind(data.payment_method)
        .bind(data.payment_details)
        .fetch_one(pool)
        .await
    }

    /// Requests in a given state, newest first.
    pub async fn list_by_status(pool: &PgPool, status: WithdrawalStatus) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, WithdrawalRequest>(
            r#"
            SELECT * FROM withdrawal_requests
            WHERE status = $1
            ORDER BY request_date DESC, request_id DESC
            "#,
        )
        .bind(status)
        .fetch_all(pool)
        .await
    }

    /// Records an admin decision. `processed_date` is set to now.
    pub async fn resolve(
        pool: &PgPool,
        request_id: i32,
        status: WithdrawalStatus,
        admin_id: i64,
        notes: Option<String>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, WithdrawalRequest>(
            r#"
            UPDATE withdrawal_requests
            SET status = $2, processed_date = NOW(), admin_id = $3, notes = COALESCE($4, notes)
            WHERE request_id = $1
            RETURNING *
            "#,
        )
        .bind(request_id)
        .bind(status)
        .bind(admin_id)
        .bind(notes)
        .fetch_optional(pool)
        .await
    }
}
