/// Executor profiles
///
/// A user applies to become an executor by submitting a profile with tags and
/// work samples. Admins review applications:
///
/// ```text
/// created → accepted
///         → rejected
/// ```
///
/// Only accepted executors are listed to clients.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::task::FileType;

/// Review state of an executor application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "profile_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProfileStatus {
    Created,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Executor {
    pub executor_id: i32,
    pub user_id: i64,
    pub tags: Vec<String>,
    pub description: Option<String>,
    pub profile_state: ProfileStatus,

    /// Messenger file ids of portfolio samples
    pub work_examples: Vec<String>,
    pub work_files_type: Vec<FileType>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateExecutor {
    pub user_id: i64,
    pub tags: Vec<String>,
    pub description: Option<String>,
    pub work_examples: Vec<String>,
    pub work_files_type: Vec<FileType>,
}

impl Executor {
    /// Submits a new application in `created` state.
    ///
    /// # Errors
    ///
    /// Unique violation if the user already has a profile, foreign key
    /// violation if the user does not exist.
    pub async fn create(pool: &PgPool, data: CreateExecutor) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Executor>(
            r#"
            INSERT INTO executors (user_id, tags, description, work_examples, work_files_type)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(data.user_id)
        .bind(data.tags)
        .bind(data.description)
        .bind(data.work_examples)
        .bind(data.work_files_type)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_user_id(pool: &PgPool, user_id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Executor>("SELECT * FROM executors WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Applications waiting for review, oldest first.
    pub async fn list_pending_applications(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Executor>(
            "SELECT * FROM executors WHERE profile_state = 'created' ORDER BY executor_id ASC",
        )
        .fetch_all(pool)
        .await
    }

    /// Moves an application to a new state. Returns false for an unknown id.
    pub async fn set_profile_state(
        pool: &PgPool,
        executor_id: i32,
        state: ProfileStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE executors SET profile_state = $2 WHERE executor_id = $1")
            .bind(executor_id)
            .bind(state)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_profile_status_spelling() {
        assert_eq!(json!(ProfileStatus::Accepted), json!("accepted"));
        let parsed: ProfileStatus = serde_json::from_value(json!("rejected")).unwrap();
        assert_eq!(parsed, ProfileStatus::Rejected);
        assert!(serde_json::from_value::<ProfileStatus>(json!("Accepted")).is_err());
    }
}
