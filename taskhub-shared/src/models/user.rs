/// User model and database operations
///
/// A user is identified by their messenger id (`telegram_id`). The bot
/// registers users on first contact; the same row is used whether the person
/// acts as a client or as an executor.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     telegram_id BIGINT PRIMARY KEY,
///     telegram_username VARCHAR(255) NOT NULL,
///     username VARCHAR(255) NOT NULL,
///     chat_id BIGINT NOT NULL,
///     user_status user_status NOT NULL DEFAULT 'default_user',
///     is_banned BOOLEAN NOT NULL DEFAULT FALSE,
///     warning_count INTEGER NOT NULL DEFAULT 0,
///     salt VARCHAR(255) NOT NULL,
///     hashed_password VARCHAR(255) NOT NULL,
///     phone VARCHAR(32) NOT NULL UNIQUE,
///     email VARCHAR(255),
///     date_added TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskhub_shared::auth::password::hash_password;
/// use taskhub_shared::models::user::{CreateUser, User, UserStatus};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let hashed = hash_password("qwerty123")?;
///
/// let user = User::create(&pool, CreateUser {
///     telegram_id: 100200300,
///     telegram_username: "ivan_tg".to_string(),
///     username: "Ivan".to_string(),
///     chat_id: 100200300,
///     phone: "+380501112233".to_string(),
///     email: None,
///     hashed_password: hashed.hash,
///     salt: hashed.salt,
///     user_status: UserStatus::DefaultUser,
/// })
/// .await?;
///
/// assert!(!user.is_banned);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Role of a user on the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    /// Regular client or executor
    DefaultUser,

    /// Moderator; handles tickets, withdrawals and warnings
    Admin,

    /// Platform owner; hidden from user listings
    Superuser,
}

/// User account
///
/// `salt` and `hashed_password` are loaded for verification but never
/// serialized into API responses.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub telegram_id: i64,
    pub telegram_username: String,

    /// Display name chosen in the bot
    pub username: String,

    /// Private chat with the bot
    pub chat_id: i64,

    pub user_status: UserStatus,
    pub is_banned: bool,

    /// Number of warnings issued so far
    pub warning_count: i32,

    #[serde(skip_serializing, default)]
    pub salt: String,

    #[serde(skip_serializing, default)]
    pub hashed_password: String,

    pub phone: String,
    pub email: Option<String>,
    pub date_added: DateTime<Utc>,
}

/// Input for creating a user. The password must already be hashed.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub telegram_id: i64,
    pub telegram_username: String,
    pub username: String,
    pub chat_id: i64,
    pub phone: String,
    pub email: Option<String>,
    pub hashed_password: String,
    pub salt: String,
    pub user_status: UserStatus,
}

/// Profile fields a user may change. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub username: Option<String>,
    pub phone: Option<String>,
}

impl UpdateUser {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.username.is_none() && self.phone.is_none()
    }
}

/// Minimum pg_trgm `word_similarity` for a name search hit
pub const SIMILARITY_THRESHOLD: f32 = 0.25;

impl User {
    /// Inserts a new user.
    ///
    /// # Errors
    ///
    /// A duplicate `telegram_id` or `phone` surfaces as a unique violation.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (
                telegram_id, telegram_username, username, chat_id, phone, email,
                hashed_password, salt, user_status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(data.telegram_id)
        .bind(data.telegram_username)
        .bind(data.username)
        .bind(data.chat_id)
        .bind(data.phone)
        .bind(data.email)
        .bind(data.hashed_password)
        .bind(data.salt)
        .bind(data.user_status)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, telegram_id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE telegram_id = $1")
            .bind(telegram_id)
            .fetch_optional(pool)
            .await
    }

    /// Every user except superusers, oldest first.
    pub async fn list_default_users(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE user_status <> 'superuser'
            ORDER BY date_added ASC
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// Applies the provided profile fields in one statement.
    ///
    /// Returns `None` when the user does not exist. An empty update just reads
    /// the row back.
    pub async fn update(
        pool: &PgPool,
        telegram_id: i64,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        if data.is_empty() {
            return Self::find_by_id(pool, telegram_id).await;
        }

        let mut sets = Vec::new();
        let mut bind_count = 1;

        if data.email.is_some() {
            bind_count += 1;
            sets.push(format!("email = ${}", bind_count));
        }
        if data.username.is_some() {
            bind_count += 1;
            sets.push(format!("username = ${}", bind_count));
        }
        if data.phone.is_some() {
            bind_count += 1;
            sets.push(format!("phone = ${}", bind_count));
        }

        let query = format!(
            "UPDATE users SET {} WHERE telegram_id = $1 RETURNING *",
            sets.join(", ")
        );

        let mut q = sqlx::query_as::<_, User>(&query).bind(telegram_id);
        if let Some(email) = data.email {
            q = q.bind(email);
        }
        if let Some(username) = data.username {
            q = q.bind(username);
        }
        if let Some(phone) = data.phone {
            q = q.bind(phone);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes a user. Returns false when nothing was deleted.
    pub async fn delete(pool: &PgPool, telegram_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE telegram_id = $1")
            .bind(telegram_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn set_banned(
        pool: &PgPool,
        telegram_id: i64,
        is_banned: bool,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET is_banned = $2 WHERE telegram_id = $1")
            .bind(telegram_id)
            .bind(is_banned)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Fuzzy name search over `username` and `telegram_username`.
    ///
    /// Admins are never returned. With `executors_only`, only users that have
    /// an executor profile match. Best match first.
    pub async fn search_similar(
        pool: &PgPool,
        name: &str,
        executors_only: bool,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT u.* FROM users u
            WHERE (word_similarity(u.username, $1) > $2
                   OR word_similarity(u.telegram_username, $1) > $2)
              AND u.user_status <> 'admin'
              AND (NOT $3 OR EXISTS (SELECT 1 FROM executors e WHERE e.user_id = u.telegram_id))
            ORDER BY GREATEST(word_similarity(u.username, $1),
                              word_similarity(u.telegram_username, $1)) DESC,
                     u.telegram_id ASC
            "#,
        )
        .bind(name)
        .bind(SIMILARITY_THRESHOLD)
        .bind(executors_only)
        .fetch_all(pool)
        .await
    }

    /// Users whose executor profile has been accepted.
    pub async fn list_accepted_executors(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT u.* FROM users u
            JOIN executors e ON e.user_id = u.telegram_id
            WHERE e.profile_state = 'accepted'
            ORDER BY u.telegram_id ASC
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// Client of a task.
    pub async fn find_client_by_task(pool: &PgPool, task_id: i32) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT u.* FROM users u
            JOIN tasks t ON t.client_id = u.telegram_id
            WHERE t.task_id = $1
            "#,
        )
        .bind(task_id)
        .fetch_optional(pool)
        .await
    }

    /// Distinct clients of tasks assigned to an executor.
    pub async fn list_recent_clients(pool: &PgPool, executor_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT DISTINCT u.* FROM users u
            JOIN tasks t ON t.client_id = u.telegram_id
            WHERE t.executor_id = $1
            ORDER BY u.telegram_id ASC
            "#,
        )
        .bind(executor_id)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> User {
        User {
            telegram_id: 42,
            telegram_username: "tg".to_string(),
            username: "Name".to_string(),
            chat_id: 42,
            user_status: UserStatus::DefaultUser,
            is_banned: false,
            warning_count: 0,
            salt: "c2FsdA".to_string(),
            hashed_password: "$argon2id$...".to_string(),
            phone: "+380000000000".to_string(),
            email: None,
            date_added: Utc::now(),
        }
    }

    #[test]
    fn test_user_status_serialization() {
        assert_eq!(json!(UserStatus::DefaultUser), json!("default_user"));
        assert_eq!(json!(UserStatus::Superuser), json!("superuser"));
        let parsed: UserStatus = serde_json::from_value(json!("admin")).unwrap();
        assert_eq!(parsed, UserStatus::Admin);
    }

    #[test]
    fn test_credentials_are_not_serialized() {
        let value = serde_json::to_value(sample()).unwrap();
        assert!(value.get("salt").is_none());
        assert!(value.get("hashed_password").is_none());
        assert_eq!(value["telegram_id"], 42);
        assert_eq!(value["user_status"], "default_user");
    }

    #[test]
    fn test_update_user_is_empty() {
        assert!(UpdateUser::default().is_empty());
        assert!(!UpdateUser {
            phone: Some("+1".to_string()),
            ..Default::default()
        }
        .is_empty());
    }
}
