/// Task model and database operations
///
/// A task is a job posted by a client. It is either public (announced in the
/// bot's channel) or proposed directly to one executor, or an executor offers
/// their services to a client.
///
/// # State Machine
///
/// ```text
/// active → executing → done
/// ```
///
/// `active → executing` happens when the client pays (see
/// [`crate::ledger::Ledger::transfer`]); `executing → done` when the client
/// accepts the finished work. Direct status updates are also allowed for
/// admin corrections.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     task_id SERIAL PRIMARY KEY,
///     executor_id BIGINT REFERENCES executors(user_id) ON DELETE SET NULL,
///     client_id BIGINT REFERENCES users(telegram_id) ON DELETE SET NULL,
///     status task_status NOT NULL DEFAULT 'active',
///     price VARCHAR(255) NOT NULL,
///     date_added TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     deadline DATE,
///     proposed_by proposition_by NOT NULL DEFAULT 'public',
///     files TEXT[],
///     files_type file_type[],
///     description TEXT,
///     subjects TEXT[] NOT NULL DEFAULT '{}',
///     work_type TEXT[] NOT NULL DEFAULT '{}'
/// );
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgHasArrayType, PgTypeInfo};
use sqlx::{PgConnection, PgExecutor, PgPool};
use std::fmt;
use std::str::FromStr;

/// Task lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Open, waiting for an executor or for payment
    Active,

    /// Paid and in progress
    Executing,

    /// Accepted by the client
    Done,
}

// Needed to bind status filters as `task_status[]`
impl PgHasArrayType for TaskStatus {
    fn array_type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("_task_status")
    }
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Active, TaskStatus::Executing, TaskStatus::Done];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Active => "active",
            TaskStatus::Executing => "executing",
            TaskStatus::Done => "done",
        }
    }

    /// Parses a comma separated filter such as `active,executing`.
    ///
    /// An empty string means no filter and yields every status.
    pub fn parse_list(raw: &str) -> Result<Vec<TaskStatus>, String> {
        let statuses = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(TaskStatus::from_str)
            .collect::<Result<Vec<_>, _>>()?;

        if statuses.is_empty() {
            Ok(Self::ALL.to_vec())
        } else {
            Ok(statuses)
        }
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(TaskStatus::Active),
            "executing" => Ok(TaskStatus::Executing),
            "done" => Ok(TaskStatus::Done),
            other => Err(format!("Unknown task status: {}", other)),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who initiated a deal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "proposition_by", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PropositionBy {
    /// Executor offered their services to a client
    Executor,

    /// Client proposed the task directly to an executor
    Client,

    /// Posted publicly for any executor
    Public,
}

impl Default for PropositionBy {
    fn default() -> Self {
        PropositionBy::Public
    }
}

/// Kind of an attached file, as reported by the messenger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "file_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Photo,
    Document,
}

impl PgHasArrayType for FileType {
    fn array_type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("_file_type")
    }
}

/// Which side of a task a user is looked up on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Client,
    Executor,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub task_id: i32,
    pub executor_id: Option<i64>,
    pub client_id: Option<i64>,
    pub status: TaskStatus,

    /// Free-form price as typed by the client ("500", "negotiable", ...)
    pub price: String,

    pub date_added: DateTime<Utc>,
    pub deadline: Option<NaiveDate>,
    pub proposed_by: PropositionBy,

    /// Messenger file ids
    pub files: Option<Vec<String>>,
    pub files_type: Option<Vec<FileType>>,

    pub description: Option<String>,
    pub subjects: Vec<String>,
    pub work_type: Vec<String>,
}

/// Input for creating a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub client_id: i64,
    pub status: TaskStatus,
    pub price: String,
    pub subjects: Vec<String>,
    pub work_type: Vec<String>,
    pub deadline: Option<NaiveDate>,
    pub files: Option<Vec<String>>,
    pub files_type: Option<Vec<FileType>>,
    pub description: Option<String>,
    pub proposed_by: PropositionBy,
    pub executor_id: Option<i64>,
}

impl Task {
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (
                client_id, status, price, subjects, work_type, deadline,
                files, files_type, description, proposed_by, executor_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(data.client_id)
        .bind(data.status)
        .bind(data.price)
        .bind(data.subjects)
        .bind(data.work_type)
        .bind(data.deadline)
        .bind(data.files)
        .bind(data.files_type)
        .bind(data.description)
        .bind(data.proposed_by)
        .bind(data.executor_id)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, task_id: i32) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE task_id = $1")
            .bind(task_id)
            .fetch_optional(pool)
            .await
    }

    /// Sets the status. Returns false when the task does not exist.
    pub async fn update_status<'e, E>(
        executor: E,
        task_id: i32,
        status: TaskStatus,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("UPDATE tasks SET status = $2 WHERE task_id = $1")
            .bind(task_id)
            .bind(status)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Hands the task to a paid executor: sets `executor_id` and moves it
    /// to `executing`.
    pub async fn assign_executor(
        conn: &mut PgConnection,
        task_id: i32,
        executor_id: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE tasks SET executor_id = $2, status = 'executing' WHERE task_id = $1",
        )
        .bind(task_id)
        .bind(executor_id)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Replaces the attached files. `files_type` is left as is when `None`.
    pub async fn update_files(
        pool: &PgPool,
        task_id: i32,
        files: Vec<String>,
        files_type: Option<Vec<FileType>>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET files = $2, files_type = COALESCE($3, files_type)
            WHERE task_id = $1
            "#,
        )
        .bind(task_id)
        .bind(files)
        .bind(files_type)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Tasks where the user is the client (or executor) and the status is in
    /// `statuses`, optionally narrowed to a single task.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: i64,
        role: UserRole,
        statuses: &[TaskStatus],
        task_id: Option<i32>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let column = match role {
            UserRole::Client => "client_id",
            UserRole::Executor => "executor_id",
        };

        let query = format!(
            r#"
            SELECT * FROM tasks
            WHERE {} = $1
              AND status = ANY($2)
              AND ($3::INTEGER IS NULL OR task_id = $3)
            ORDER BY task_id ASC
            "#,
            column
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(user_id)
            .bind(statuses.to_vec())
            .bind(task_id)
            .fetch_all(pool)
            .await
    }

    /// Active deals awaiting an answer.
    ///
    /// For `Client` proposals the user is the executor the task was offered
    /// to; for the other kinds the user is the client.
    pub async fn list_proposed_deals(
        pool: &PgPool,
        user_id: i64,
        proposed_by: PropositionBy,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let column = match proposed_by {
            PropositionBy::Client => "executor_id",
            PropositionBy::Executor | PropositionBy::Public => "client_id",
        };

        let query = format!(
            r#"
            SELECT * FROM tasks
            WHERE proposed_by = $1 AND status = 'active' AND {} = $2
            ORDER BY task_id ASC
            "#,
            column
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(proposed_by)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Tasks that have a chat with this user as executor, by status.
    pub async fn list_executor_orders(
        pool: &PgPool,
        executor_id: i64,
        statuses: &[TaskStatus],
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT t.* FROM tasks t
            WHERE t.status = ANY($2)
              AND EXISTS (
                  SELECT 1 FROM chats c
                  WHERE c.task_id = t.task_id AND c.executor_id = $1
              )
            ORDER BY t.task_id ASC
            "#,
        )
        .bind(executor_id)
        .bind(statuses.to_vec())
        .fetch_all(pool)
        .await
    }
}
