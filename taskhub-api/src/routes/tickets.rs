/// Support ticket endpoints
///
/// - `POST  /tickets` - Open a ticket
/// - `GET   /tickets?ticket_status=Open` - Tickets in a status
/// - `PATCH /tickets/:ticket_id` - Change status and answer

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{message, non_empty, MessageResponse},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use serde::Deserialize;
use taskhub_shared::models::ticket::{TicketStatus, UserTicket};
use validator::Validate;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tickets).post(create_ticket))
        .route("/:ticket_id", patch(update_ticket))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTicketRequest {
    pub user_id: i64,

    #[validate(length(min = 1, max = 255, message = "Subject must be 1-255 characters"))]
    pub subject: String,

    #[validate(length(min = 1, message = "Description must not be empty"))]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct TicketQuery {
    /// `Open`, `In Progress` or `Closed`; `Open` when absent
    pub ticket_status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTicketRequest {
    pub new_status: TicketStatus,
    pub admin_id: i64,
    pub response: Option<String>,
}

pub async fn create_ticket(
    State(state): State<AppState>,
    Json(req): Json<CreateTicketRequest>,
) -> ApiResult<(StatusCode, Json<UserTicket>)> {
    req.validate()?;

    let ticket = UserTicket::create(&state.db, req.user_id, &req.subject, &req.description).await?;

    tracing::info!(ticket_id = ticket.ticket_id, user_id = req.user_id, "Ticket opened");
    Ok((StatusCode::CREATED, Json(ticket)))
}

pub async fn list_tickets(
    State(state): State<AppState>,
    Query(query): Query<TicketQuery>,
) -> ApiResult<Json<Vec<UserTicket>>> {
    let status = match query.ticket_status.as_deref() {
        None => TicketStatus::Open,
        Some(raw) => raw.parse::<TicketStatus>().map_err(ApiError::BadRequest)?,
    };

    non_empty(UserTicket::list_by_status(&state.db, status).await?, "tickets")
}

pub async fn update_ticket(
    State(state): State<AppState>,
    Path(ticket_id): Path<i32>,
    Json(req): Json<UpdateTicketRequest>,
) -> ApiResult<Json<MessageResponse>> {
    UserTicket::update_status(&state.db, ticket_id, req.new_status, req.admin_id, req.response)
        .await?
        .ok_or_else(|| ApiError::not_found("Ticket"))?;

    tracing::info!(ticket_id, status = ?req.new_status, admin_id = req.admin_id, "Ticket updated");
    Ok(message("Ticket updated"))
}
