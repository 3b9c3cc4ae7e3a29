//! Router tests that never reach the database
//!
//! The router runs over a pool that cannot connect, so everything here is
//! decided by middleware, extractors and request validation.

mod common;

use axum::http::StatusCode;
use common::TestContext;
use serde_json::json;

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let ctx = TestContext::offline();

    let (status, body) = ctx.send_with_token("GET", "/users/1", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_wrong_token_is_forbidden() {
    let ctx = TestContext::offline();

    let (status, _) = ctx
        .send_with_token("GET", "/balance/1", None, Some("not-the-token"))
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unknown_route_is_not_found_without_token() {
    let ctx = TestContext::offline();

    let (status, _) = ctx.send_with_token("GET", "/nope", None, None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_reports_degraded_database() {
    let ctx = TestContext::offline();

    let (status, body) = ctx.send_with_token("GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"], "disconnected");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_chat_lookup_requires_a_key() {
    let ctx = TestContext::offline();

    let (status, body) = ctx.send("GET", "/chats", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_invalid_task_status_filter() {
    let ctx = TestContext::offline();

    let (status, body) = ctx
        .send("GET", "/tasks?user_id=1&user_type=client&task_status=active,unknown", None)
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Unknown task status: unknown");
}

#[tokio::test]
async fn test_repeated_task_status_keys() {
    let ctx = TestContext::offline();

    let (status, body) = ctx
        .send(
            "GET",
            "/tasks?user_id=1&user_type=client&task_status=active&task_status=unknown",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Unknown task status: unknown");

    // Parsed fine, then stopped by the unreachable database
    let (status, _) = ctx
        .send(
            "GET",
            "/tasks?user_id=1&user_type=client&task_status=active&task_status=executing",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, _) = ctx
        .send("GET", "/executors/1/orders?status=done&status=paused", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_review_rating_out_of_range() {
    let ctx = TestContext::offline();

    let (status, body) = ctx
        .send(
            "POST",
            "/reviews",
            Some(json!({
                "reviewer_id": 1,
                "reviewed_id": 2,
                "task_id": 3,
                "rating": 6
            })),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"][0]["field"], "rating");
}

#[tokio::test]
async fn test_negative_fund_transfer_is_rejected() {
    let ctx = TestContext::offline();

    let (status, _) = ctx
        .send(
            "PATCH",
            "/balance/fund-transfer",
            Some(json!({"user_id": 1, "amount": "-5.00", "action": "withdrawal"})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_fractions_of_a_cent_are_rejected() {
    let ctx = TestContext::offline();

    let (status, body) = ctx
        .send(
            "POST",
            "/payments/transfer",
            Some(json!({"receiver_id": 2, "sender_id": 1, "task_id": 3, "amount": "10.005"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let (status, _) = ctx
        .send(
            "PATCH",
            "/balance/fund-transfer",
            Some(json!({"user_id": 1, "amount": "0.001", "action": "replenishment"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx
        .send(
            "PATCH",
            "/balance/new",
            Some(json!({"user_id": 1, "new_amount": "12.345"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_card_is_rejected() {
    let ctx = TestContext::offline();

    let (status, _) = ctx
        .send(
            "PATCH",
            "/balance/user-cards",
            Some(json!({"user_id": 1, "card": "4444 3333 2222 111x"})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_webhook_rejects_payload_without_invoice() {
    let ctx = TestContext::offline();

    let (status, _) = ctx
        .send_with_token(
            "POST",
            "/webhook/monobank/1",
            Some(json!({"status": "success", "amount": 100})),
            None,
        )
        .await;

    assert!(status.is_client_error(), "got {}", status);
}

#[tokio::test]
async fn test_webhook_rejects_non_numeric_user() {
    let ctx = TestContext::offline();

    let (status, _) = ctx
        .send_with_token(
            "POST",
            "/webhook/monobank/abc",
            Some(json!({"invoiceId": "x", "status": "success", "amount": 100})),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_bearer_token_is_accepted() {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    let ctx = TestContext::offline();

    let request = Request::builder()
        .uri("/chats")
        .header("authorization", format!("Bearer {}", common::TEST_TOKEN))
        .body(Body::empty())
        .unwrap();

    let response = ctx.app.clone().oneshot(request).await.unwrap();

    // Past authentication, rejected by the handler for the missing key
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
