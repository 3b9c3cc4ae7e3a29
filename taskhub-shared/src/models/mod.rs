/// Database models for TaskHub
///
/// Each model owns its row struct plus the queries that read and write it.
/// Plain CRUD returns `sqlx::Error`; callers map "no row" to 404 themselves
/// through the `Option`/`bool` results.
///
/// # Models
///
/// - `user`: accounts keyed by the messenger user id
/// - `reset_token`: password reset tokens
/// - `executor`: executor profiles and applications
/// - `task`: task postings
/// - `chat`: chat groups created for deals
/// - `group_message`: announcement messages of tasks
/// - `balance`: balances and encrypted cards
/// - `transaction`: money movement records
/// - `withdrawal`: payout requests
/// - `warning`: moderation warnings
/// - `ticket`: support tickets
/// - `review`: reviews and their statistics
///
/// # Example
///
/// ```no_run
/// use taskhub_shared::models::task::{Task, TaskStatus};
/// use taskhub_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// if let Some(task) = Task::find_by_id(&pool, 42).await? {
///     Task::update_status(&pool, task.task_id, TaskStatus::Done).await?;
/// }
/// # Ok(())
/// # }
/// ```

pub mod balance;
pub mod chat;
pub mod executor;
pub mod group_message;
pub mod reset_token;
pub mod review;
pub mod task;
pub mod ticket;
pub mod transaction;
pub mod user;
pub mod warning;
pub mod withdrawal;
