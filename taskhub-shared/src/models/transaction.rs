/// Money movement records
///
/// Every change of a user's balance that involves the platform is recorded
/// as a transaction:
///
/// - `Debit`: top-up through the payment provider, settled by the webhook
/// - `Transfer`: client pays an executor for a task (escrow until accepted)
/// - `Withdrawal`: payout to the user's card
///
/// # State Machine
///
/// ```text
/// Pending → Completed
///         → Failed
/// ```
///
/// `amount` is the net amount the receiver gets; `commission` is what the
/// platform keeps.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgExecutor, PgPool};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_status", rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

impl TransactionStatus {
    pub fn is_final(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_type", rename_all = "lowercase")]
pub enum TransactionType {
    Debit,
    Transfer,
    Withdrawal,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Transaction {
    pub transaction_id: i32,

    /// Provider invoice id, or a generated UUID for internal transfers
    pub invoice_id: String,

    pub sender_id: Option<i64>,
    pub receiver_id: Option<i64>,
    pub task_id: Option<i32>,
    pub amount: Decimal,
    pub commission: Decimal,
    pub transaction_type: TransactionType,
    pub transaction_status: TransactionStatus,
    pub transaction_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTransaction {
    pub invoice_id: String,
    pub amount: Decimal,
    pub transaction_type: TransactionType,
    pub transaction_status: TransactionStatus,
    pub sender_id: Option<i64>,
    pub receiver_id: Option<i64>,
    pub task_id: Option<i32>,
    pub commission: Option<Decimal>,
}

/// Filter for [`Transaction::list_filtered`]. Sender and receiver are
/// required; the rest narrow the result when present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionFilter {
    pub sender_id: i64,
    pub receiver_id: i64,
    pub task_id: Option<i32>,
    pub transaction_type: Option<TransactionType>,
    pub transaction_status: Option<TransactionStatus>,
}

impl Transaction {
    /// Records a transaction.
    ///
    /// # Errors
    ///
    /// Unique violation on a duplicate `invoice_id`.
    pub async fn create<'e, E>(executor: E, data: CreateTransaction) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Transaction>(
            r#"
            INSERT INTO transactions (
                invoice_id, amount, transaction_type, transaction_status,
                sender_id, receiver_id, task_id, commission
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8, 0.00))
            RETURNING *
            "#,
        )
        .bind(data.invoice_id)
        .bind(data.amount)
        .bind(data.transaction_type)
        .bind(data.transaction_status)
        .bind(data.sender_id)
        .bind(data.receiver_id)
        .bind(data.task_id)
        .bind(data.commission)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, transaction_id: i32) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE transaction_id = $1")
            .bind(transaction_id)
            .fetch_optional(pool)
            .await
    }

    /// Reads the transaction with `FOR UPDATE`. Must run inside a transaction.
    pub async fn lock(conn: &mut PgConnection, transaction_id: i32) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Transaction>(
            "SELECT * FROM transactions WHERE transaction_id = $1 FOR UPDATE",
        )
        .bind(transaction_id)
        .fetch_optional(conn)
        .await
    }

    /// Moves a pending transaction to `status`. Returns `None` when no
    /// pending transaction has this invoice id, which makes repeated
    /// settlement a no-op.
    pub async fn settle_pending_invoice(
        conn: &mut PgConnection,
        invoice_id: &str,
        status: TransactionStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Transaction>(
            r#"
            UPDATE transactions SET transaction_status = $2
            WHERE invoice_id = $1 AND transaction_status = 'pending'
            RETURNING *
            "#,
        )
        .bind(invoice_id)
        .bind(status)
        .fetch_optional(conn)
        .await
    }

    pub async fn set_status(
        conn: &mut PgConnection,
        transaction_id: i32,
        status: TransactionStatus,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE transactions SET transaction_status = $2 WHERE transaction_id = $1")
            .bind(transaction_id)
            .bind(status)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Sets the status of the transaction with this invoice id.
    pub async fn update_status_by_invoice(
        pool: &PgPool,
        invoice_id: &str,
        status: TransactionStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Transaction>(
            r#"
            UPDATE transactions SET transaction_status = $2
            WHERE invoice_id = $1
            RETURNING *
            "#,
        )
        .bind(invoice_id)
        .bind(status)
        .fetch_optional(pool)
        .await
    }

    /// Transactions where the user is sender or receiver, newest first.
    pub async fn list_for_user(pool: &PgPool, user_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Transaction>(
            r#"
            SELECT * FROM transactions
            WHERE sender_id = $1 OR receiver_id = $1
            ORDER BY transaction_date DESC, transaction_id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn list_filtered(pool: &PgPool, filter: TransactionFilter) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Transaction>(
            r#"
            SELECT * FROM transactions
            WHERE sender_id = $1
              AND receiver_id = $2
              AND ($3::INTEGER IS NULL OR task_id = $3)
              AND ($4::transaction_type IS NULL OR transaction_type = $4)
              AND ($5::transaction_status IS NULL OR transaction_status = $5)
            ORDER BY transaction_date DESC, transaction_id DESC
            "#,
        )
        .bind(filter.sender_id)
        .bind(filter.receiver_id)
        .bind(filter.task_id)
        .bind(filter.transaction_type)
        .bind(filter.transaction_status)
        .fetch_all(pool)
        .await
    }

    /// Whether any payment has been made for this deal.
    pub async fn exists_for_deal(
        pool: &PgPool,
        task_id: i32,
        receiver_id: i64,
        sender_id: i64,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM transactions
                WHERE task_id = $1 AND receiver_id = $2 AND sender_id = $3
            )
            "#,
        )
        .bind(task_id)
        .bind(receiver_id)
        .bind(sender_id)
        .fetch_one(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_spelling_is_capitalized() {
        assert_eq!(json!(TransactionStatus::Pending), json!("Pending"));
        assert_eq!(json!(TransactionType::Withdrawal), json!("Withdrawal"));

        let status: TransactionStatus = serde_json::from_value(json!("Completed")).unwrap();
        assert_eq!(status, TransactionStatus::Completed);
        assert!(serde_json::from_value::<TransactionStatus>(json!("completed")).is_err());
    }

    #[test]
    fn test_is_final() {
        assert!(!TransactionStatus::Pending.is_final());
        assert!(TransactionStatus::Completed.is_final());
        assert!(TransactionStatus::Failed.is_final());
    }
}
