/// Support tickets
///
/// ```text
/// Open → In Progress → Closed
/// ```
///
/// Admins may jump straight to any state; the last admin to touch a ticket
/// is stored in `responded_by`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "ticket_status", rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    #[serde(rename = "In Progress")]
    InProgress,
    Closed,
}

impl Default for TicketStatus {
    fn default() -> Self {
        TicketStatus::Open
    }
}

impl FromStr for TicketStatus {
    type Err = String;

    /// Accepts the display spelling as well as the database spelling.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Open" | "open" => Ok(TicketStatus::Open),
            "In Progress" | "in_progress" => Ok(TicketStatus::InProgress),
            "Closed" | "closed" => Ok(TicketStatus::Closed),
            other => Err(format!("Unknown ticket status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserTicket {
    pub ticket_id: i32,
    pub user_id: i64,
    pub subject: String,
    pub description: String,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub response: Option<String>,
    pub responded_by: Option<i64>,
}

impl UserTicket {
    pub async fn create(
        pool: &PgPool,
        user_id: i64,
        subject: &str,
        description: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, UserTicket>(
            r#"
            INSERT INTO user_tickets (user_id, subject, description)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(subject)
        .bind(description)
        .fetch_one(pool)
        .await
    }

    pub async fn list_by_status(pool: &PgPool, status: TicketStatus) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, UserTicket>(
            "SELECT * FROM user_tickets WHERE status = $1 ORDER BY created_at ASC, ticket_id ASC",
        )
        .bind(status)
        .fetch_all(pool)
        .await
    }

    /// Moves a ticket to `status`, optionally storing the admin's answer.
    pub async fn update_status(
        pool: &PgPool,
        ticket_id: i32,
        status: TicketStatus,
        admin_id: i64,
        response: Option<String>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, UserTicket>(
            r#"
            UPDATE user_tickets
            SET status = $2,
                updated_at = NOW(),
                responded_by = $3,
                response = COALESCE($4, response)
            WHERE ticket_id = $1
            RETURNING *
            "#,
        )
        .bind(ticket_id)
        .bind(status)
        .bind(admin_id)
        .bind(response)
        .fetch_optional(pool)
        .await
    }
}
