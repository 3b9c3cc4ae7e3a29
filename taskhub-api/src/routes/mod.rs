/// API route handlers
///
/// This module contains all route handlers organized by resource. Each
/// resource module exposes a `router()` that `app::build_router` nests
/// under the resource prefix.
///
/// - `health`: Health check endpoint
/// - `users`: Accounts, bans, password checks and resets
/// - `tasks`: Task postings
/// - `executors`: Executor profiles and applications
/// - `chats`: Deal chat groups
/// - `group_messages`: Task announcement messages
/// - `balance`: Balances and stored cards
/// - `transactions`: Transaction records
/// - `payments`: Escrow transfers and acceptance
/// - `webhook`: Payment provider callback
/// - `withdrawals`: Payout requests
/// - `warnings`: Moderation warnings
/// - `tickets`: Support tickets
/// - `reviews`: Reviews and statistics

pub mod balance;
pub mod chats;
pub mod executors;
pub mod group_messages;
pub mod health;
pub mod payments;
pub mod reviews;
pub mod tasks;
pub mod tickets;
pub mod transactions;
pub mod users;
pub mod warnings;
pub mod webhook;
pub mod withdrawals;

use crate::error::{ApiError, ApiResult};
use axum::Json;
use serde::{Deserialize, Serialize};

/// Plain acknowledgement body
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

pub(crate) fn message(text: impl Into<String>) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: text.into(),
    })
}

/// Turns an empty list into a 404 for endpoints where "nothing found" is
/// an error to the bot.
pub(crate) fn non_empty<T>(items: Vec<T>, what: &str) -> ApiResult<Json<Vec<T>>> {
    if items.is_empty() {
        return Err(ApiError::NotFound(format!("No {} found", what)));
    }
    Ok(Json(items))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty() {
        assert!(non_empty(vec![1], "items").is_ok());

        let err = non_empty::<i32>(vec![], "tasks").unwrap_err();
        assert_eq!(err.to_string(), "Not found: No tasks found");
    }
}
