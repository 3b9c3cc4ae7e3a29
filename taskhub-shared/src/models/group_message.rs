/// Task announcements posted by the bot
///
/// When a public task is announced in the bot's channel, the messenger
/// message id is stored here so the bot can later edit or remove the post.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct GroupMessage {
    /// Messenger message id
    pub group_message_id: i64,
    pub task_id: i32,
    pub message_text: String,
    pub has_files: bool,
    pub date_added: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGroupMessage {
    pub group_message_id: i64,
    pub task_id: i32,
    pub message_text: String,
    pub has_files: bool,
}

impl GroupMessage {
    pub async fn create(pool: &PgPool, data: CreateGroupMessage) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, GroupMessage>(
            r#"
            INSERT INTO group_messages (group_message_id, task_id, message_text, has_files)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(data.group_message_id)
        .bind(data.task_id)
        .bind(data.message_text)
        .bind(data.has_files)
        .fetch_one(pool)
        .await
    }

    /// First announcement of a task.
    pub async fn find_by_task(pool: &PgPool, task_id: i32) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, GroupMessage>(
            r#"
            SELECT * FROM group_messages
            WHERE task_id = $1
            ORDER BY date_added ASC, group_message_id ASC
            LIMIT 1
            "#,
        )
        .bind(task_id)
        .fetch_optional(pool)
        .await
    }
}
