/// Password reset tokens
///
/// At most one token per user: issuing a new one replaces the previous row.
/// Only the SHA-256 digest is stored (see [`crate::auth::reset_token`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ResetToken {
    pub user_id: i64,

    #[serde(skip_serializing, default)]
    pub token_hash: String,

    pub expire_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub is_used: bool,
}

impl ResetToken {
    /// Stores a token for the user, replacing any previous one.
    pub async fn upsert(
        pool: &PgPool,
        user_id: i64,
        token_hash: &str,
        expire_date: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ResetToken>(
            r#"
            INSERT INTO reset_tokens (user_id, token_hash, expire_date)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE
            SET token_hash = EXCLUDED.token_hash,
                expire_date = EXCLUDED.expire_date,
                created_at = NOW(),
                is_used = FALSE
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(expire_date)
        .fetch_one(pool)
        .await
    }

    /// Redeems a token and stores the new password in one transaction.
    ///
    /// Returns the user id on success, `None` when the token is unknown,
    /// expired or already used.
    pub async fn redeem(
        pool: &PgPool,
        token_hash: &str,
        new_hash: &str,
        new_salt: &str,
    ) -> Result<Option<i64>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let user_id: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE reset_tokens
            SET is_used = TRUE
            WHERE token_hash = $1 AND is_used = FALSE AND expire_date > NOW()
            RETURNING user_id
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(user_id) = user_id else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query("UPDATE users SET hashed_password = $2, salt = $3 WHERE telegram_id = $1")
            .bind(user_id)
            .bind(new_hash)
            .bind(new_salt)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(user_id, "Password reset");
        Ok(Some(user_id))
    }
}
