/// User balances and stored cards
///
/// One row per user. `user_cards` holds AES-CBC ciphertexts produced by
/// [`crate::crypto::card::CardCipher`]; the model never sees plaintext card
/// numbers. Because encryption is deterministic, a card that is already
/// stored is recognised by comparing ciphertexts.
///
/// Reads and writes that move money between users go through
/// [`crate::ledger::Ledger`], which uses the row-locking helpers here inside
/// its own transactions.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Balance {
    pub user_id: i64,

    /// Encrypted card numbers
    #[serde(skip)]
    pub user_cards: Vec<Vec<u8>>,

    pub balance_money: Decimal,
}

/// Direction of a manual balance adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceAction {
    Replenishment,
    Withdrawal,
}

impl Balance {
    pub async fn find(pool: &PgPool, user_id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Balance>("SELECT * FROM balance WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Opens an empty balance.
    ///
    /// # Errors
    ///
    /// Unique violation when the user already has one.
    pub async fn create(pool: &PgPool, user_id: i64) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Balance>(
            r#"
            INSERT INTO balance (user_id, user_cards, balance_money)
            VALUES ($1, '{}', 0.00)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    /// Appends an encrypted card unless it is already stored.
    ///
    /// Creates the balance row when missing. Returns true when the card was
    /// added, false when it was already present.
    pub async fn add_card(pool: &PgPool, user_id: i64, encrypted_card: Vec<u8>) -> Result<bool, sqlx::Error> {
        let inserted: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO balance (user_id, user_cards)
            VALUES ($1, ARRAY[$2::BYTEA])
            ON CONFLICT (user_id) DO UPDATE
            SET user_cards = balance.user_cards || EXCLUDED.user_cards
            WHERE NOT (balance.user_cards @> EXCLUDED.user_cards)
            RETURNING user_id
            "#,
        )
        .bind(user_id)
        .bind(encrypted_card)
        .fetch_optional(pool)
        .await?;

        Ok(inserted.is_some())
    }

    /// Overwrites the amount. Returns false when the user has no balance.
    pub async fn set_amount(pool: &PgPool, user_id: i64, new_amount: Decimal) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE balance SET balance_money = $2 WHERE user_id = $1")
            .bind(user_id)
            .bind(new_amount)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Reads the balance row with `FOR UPDATE`. Must run inside a transaction.
    pub async fn lock(conn: &mut PgConnection, user_id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Balance>("SELECT * FROM balance WHERE user_id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(conn)
            .await
    }

    /// Adds `delta` (negative to debit). Returns the new amount, or `None`
    /// when the user has no balance.
    pub async fn apply_delta(
        conn: &mut PgConnection,
        user_id: i64,
        delta: Decimal,
    ) -> Result<Option<Decimal>, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            UPDATE balance SET balance_money = balance_money + $2
            WHERE user_id = $1
            RETURNING balance_money
            "#,
        )
        .bind(user_id)
        .bind(delta)
        .fetch_optional(conn)
        .await
    }
}
