/// Moderation warnings
///
/// Issuing a warning inserts a row and bumps `users.warning_count` in the
/// same transaction, so the counter always equals the number of rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Warning {
    pub warning_id: i32,
    pub user_id: i64,
    pub reason: String,

    /// Admin who issued the warning
    pub issued_by: Option<i64>,
    pub issued_at: DateTime<Utc>,
}

/// Outcome of [`Warning::issue`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedWarning {
    pub warning_id: i32,

    /// User's warning count after this one
    pub warning_count: i32,
}

impl Warning {
    /// Records a warning and increments the user's counter atomically.
    ///
    /// Returns `None` when the user does not exist; nothing is written then.
    pub async fn issue(
        pool: &PgPool,
        user_id: i64,
        reason: &str,
        issued_by: i64,
    ) -> Result<Option<IssuedWarning>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let warning_count: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE users SET warning_count = warning_count + 1
            WHERE telegram_id = $1
            RETURNING warning_count
            "#,
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(warning_count) = warning_count else {
            tx.rollback().await?;
            return Ok(None);
        };

        let warning_id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO warnings (user_id, reason, issued_by)
            VALUES ($1, $2, $3)
            RETURNING warning_id
            "#,
        )
        .bind(user_id)
        .bind(reason)
        .bind(issued_by)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(user_id, warning_count, issued_by, "Warning issued");
        Ok(Some(IssuedWarning {
            warning_id,
            warning_count,
        }))
    }

    pub async fn list_for_user(pool: &PgPool, user_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Warning>(
            "SELECT * FROM warnings WHERE user_id = $1 ORDER BY issued_at DESC, warning_id DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}
