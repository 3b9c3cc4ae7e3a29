/// Payment provider webhook
///
/// ```text
/// POST /webhook/monobank/:user_id
/// ```
///
/// Monobank calls this URL whenever the status of an invoice created for
/// `user_id` changes. It is not behind the service token; the provider only
/// knows the URL.
///
/// Once the body parses, the provider always gets `200 {"message": "Received"}`.
/// Failures while applying it are logged, since a non-2xx answer would only
/// make the provider resend the same notification.

use crate::{app::AppState, routes::{message, MessageResponse}};
use axum::{
    extract::{Path, State},
    Json,
};
use taskhub_shared::ledger::{SettlementOutcome, WebhookPayload};

pub async fn monobank(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(payload): Json<WebhookPayload>,
) -> Json<MessageResponse> {
    tracing::info!(
        user_id,
        invoice_id = %payload.invoice_id,
        status = %payload.status,
        amount = payload.amount,
        "Payment notification received"
    );

    match state.ledger.settle_invoice(user_id, &payload).await {
        Ok(SettlementOutcome::Credited(balance)) => {
            tracing::debug!(user_id, %balance, "Balance after top-up");
        }
        Ok(_) => {}
        Err(e) => {
            tracing::error!(
                user_id,
                invoice_id = %payload.invoice_id,
                error = %e,
                "Failed to apply payment notification"
            );
        }
    }

    message("Received")
}
