/// Chat groups created for task deals
///
/// For every deal the bot creates (or reuses) a messenger group containing
/// the client, the executor and the bot. The row links the messenger chat to
/// the task and tracks whether the deal has been paid.
///
/// A chat is *reusable* once it is not in use and either inactive, or active
/// with its payment older than a cut-off (see [`Chat::list_unused`]). The bot
/// then renames it and attaches it to a new task instead of creating a group.
///
/// `chat_id` is not unique: the same messenger group is recorded again for
/// every task it is reused for. Lookups by `chat_id` return the newest row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

/// Messenger chat kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "chat_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ChatType {
    Sender,
    Private,
    Group,
    Supergroup,
    Channel,
}

impl Default for ChatType {
    fn default() -> Self {
        ChatType::Group
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Chat {
    /// Database id
    pub id: i32,

    /// Messenger chat id
    pub chat_id: i64,

    /// Set once a group is upgraded to a supergroup
    pub supergroup_id: Option<i64>,

    pub task_id: Option<i32>,
    pub executor_id: i64,
    pub client_id: i64,
    pub active: bool,
    pub group_name: String,
    pub chat_type: ChatType,
    pub chat_admin: String,
    pub date_created: DateTime<Utc>,
    pub participants_count: Option<i32>,
    pub invite_link: Option<String>,
    pub is_payed: bool,
    pub in_use: bool,
    pub payment_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChat {
    pub chat_id: i64,
    pub task_id: i32,
    pub group_name: String,
    pub invite_link: Option<String>,
    pub participants_count: Option<i32>,
    pub client_id: i64,
    pub executor_id: i64,
    pub chat_admin: String,
    pub supergroup_id: Option<i64>,
    pub chat_type: ChatType,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateChat {
    pub task_id: Option<i32>,
    pub executor_id: Option<i64>,
    pub client_id: Option<i64>,
    pub group_name: Option<String>,
    pub invite_link: Option<String>,
    pub participants_count: Option<i32>,
    pub active: Option<bool>,
    pub in_use: Option<bool>,
    pub is_payed: Option<bool>,
}

/// How a single chat is looked up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatLookup {
    /// Database id
    Id(i32),

    /// Supergroup id
    Supergroup(i64),

    /// Messenger chat id; newest row wins
    ChatId(i64),
}

impl ChatLookup {
    /// Picks the most specific key given: database id, then supergroup id,
    /// then messenger chat id.
    pub fn from_keys(
        db_chat_id: Option<i32>,
        supergroup_id: Option<i64>,
        chat_id: Option<i64>,
    ) -> Option<Self> {
        db_chat_id
            .map(ChatLookup::Id)
            .or(supergroup_id.map(ChatLookup::Supergroup))
            .or(chat_id.map(ChatLookup::ChatId))
    }
}

impl Chat {
    /// Records a new chat. It starts active, unpaid and not in use.
    pub async fn create(pool: &PgPool, data: CreateChat) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Chat>(
            r#"
            INSERT INTO chats (
                chat_id, task_id, group_name, invite_link, participants_count,
                client_id, executor_id, chat_admin, supergroup_id, chat_type, in_use
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, FALSE)
            RETURNING *
            "#,
        )
        .bind(data.chat_id)
        .bind(data.task_id)
        .bind(data.group_name)
        .bind(data.invite_link)
        .bind(data.participants_count)
        .bind(data.client_id)
        .bind(data.executor_id)
        .bind(data.chat_admin)
        .bind(data.supergroup_id)
        .bind(data.chat_type)
        .fetch_one(pool)
        .await
    }

    pub async fn find(pool: &PgPool, lookup: ChatLookup) -> Result<Option<Self>, sqlx::Error> {
        match lookup {
            ChatLookup::Id(id) => {
                sqlx::query_as::<_, Chat>("SELECT * FROM chats WHERE id = $1")
                    .bind(id)
                    .fetch_optional(pool)
                    .await
            }
            ChatLookup::Supergroup(supergroup_id) => {
                sqlx::query_as::<_, Chat>("SELECT * FROM chats WHERE supergroup_id = $1")
                    .bind(supergroup_id)
                    .fetch_optional(pool)
                    .await
            }
            ChatLookup::ChatId(chat_id) => {
                sqlx::query_as::<_, Chat>(
                    "SELECT * FROM chats WHERE chat_id = $1 ORDER BY id DESC LIMIT 1",
                )
                .bind(chat_id)
                .fetch_optional(pool)
                .await
            }
        }
    }

    pub async fn list_active_by_task(pool: &PgPool, task_id: i32) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Chat>(
            "SELECT * FROM chats WHERE task_id = $1 AND active = TRUE ORDER BY id ASC",
        )
        .bind(task_id)
        .fetch_all(pool)
        .await
    }

    /// Active chats of a client that are free to be attached to a new task.
    pub async fn list_free_for_client(pool: &PgPool, client_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Chat>(
            r#"
            SELECT * FROM chats
            WHERE client_id = $1 AND active = TRUE AND in_use = FALSE
            ORDER BY id ASC
            "#,
        )
        .bind(client_id)
        .fetch_all(pool)
        .await
    }

    /// Records the group's upgrade to a supergroup (or other type change).
    pub async fn update_type(
        pool: &PgPool,
        id: i32,
        chat_type: ChatType,
        supergroup_id: Option<i64>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE chats SET chat_type = $2, supergroup_id = $3 WHERE id = $1")
            .bind(id)
            .bind(chat_type)
            .bind(supergroup_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn update_group_name(pool: &PgPool, id: i32, group_name: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE chats SET group_name = $2 WHERE id = $1")
            .bind(id)
            .bind(group_name)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Applies a partial update. Returns `None` for an unknown id.
    pub async fn update(pool: &PgPool, id: i32, data: UpdateChat) -> Result<Option<Self>, sqlx::Error> {
        let mut sets: Vec<String> = Vec::new();
        let mut bind_count = 1;

        let mut push = |column: &str, present: bool| {
            if present {
                bind_count += 1;
                sets.push(format!("{} = ${}", column, bind_count));
            }
        };

        push("task_id", data.task_id.is_some());
        push("executor_id", data.executor_id.is_some());
        push("client_id", data.client_id.is_some());
        push("group_name", data.group_name.is_some());
        push("invite_link", data.invite_link.is_some());
        push("participants_count", data.participants_count.is_some());
        push("active", data.active.is_some());
        push("in_use", data.in_use.is_some());
        push("is_payed", data.is_payed.is_some());

        if sets.is_empty() {
            return Self::find(pool, ChatLookup::Id(id)).await;
        }

        let query = format!("UPDATE chats SET {} WHERE id = $1 RETURNING *", sets.join(", "));

        // Bind order must follow the push order above.
        let mut q = sqlx::query_as::<_, Chat>(&query).bind(id);
        if let Some(v) = data.task_id {
            q = q.bind(v);
        }
        if let Some(v) = data.executor_id {
            q = q.bind(v);
        }
        if let Some(v) = data.client_id {
            q = q.bind(v);
        }
        if let Some(v) = data.group_name {
            q = q.bind(v);
        }
        if let Some(v) = data.invite_link {
            q = q.bind(v);
        }
        if let Some(v) = data.participants_count {
            q = q.bind(v);
        }
        if let Some(v) = data.active {
            q = q.bind(v);
        }
        if let Some(v) = data.in_use {
            q = q.bind(v);
        }
        if let Some(v) = data.is_payed {
            q = q.bind(v);
        }

        q.fetch_optional(pool).await
    }

    /// Chats that can be reused for a new deal.
    ///
    /// Not in use, and either inactive, or active with a payment older than
    /// `hours`. Oldest payment first; never-paid chats last.
    pub async fn list_unused(pool: &PgPool, hours: i32) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Chat>(
            r#"
            SELECT * FROM chats
            WHERE in_use = FALSE
              AND (
                  active = FALSE
                  OR payment_date < NOW() - make_interval(hours => $1)
              )
            ORDER BY payment_date ASC NULLS LAST, id ASC
            "#,
        )
        .bind(hours)
        .fetch_all(pool)
        .await
    }

    /// Marks the deal's chat as paid now. Returns the number of chats touched.
    pub async fn mark_paid(
        conn: &mut PgConnection,
        task_id: i32,
        executor_id: i64,
        client_id: i64,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE chats SET is_payed = TRUE, payment_date = NOW()
            WHERE task_id = $1 AND executor_id = $2 AND client_id = $3
            "#,
        )
        .bind(task_id)
        .bind(executor_id)
        .bind(client_id)
        .execute(conn)
        .await?;

        Ok(result.rows_affected())
    }

    /// Whether an active chat already exists for this deal.
    pub async fn exists_active(
        pool: &PgPool,
        task_id: i32,
        executor_id: i64,
        client_id: i64,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM chats
                WHERE task_id = $1 AND executor_id = $2 AND client_id = $3 AND active = TRUE
            )
            "#,
        )
        .bind(task_id)
        .bind(executor_id)
        .bind(client_id)
        .fetch_one(pool)
        .await
    }
}
