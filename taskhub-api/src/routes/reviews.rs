/// Review endpoints
///
/// - `POST /reviews` - Leave a review
/// - `GET  /reviews/:user_id` - Review statistics of a user

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use taskhub_shared::models::review::{CreateReview, Review, ReviewSummary};
use validator::Validate;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_review))
        .route("/:user_id", get(review_summary))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReviewRequest {
    pub reviewer_id: i64,
    pub reviewed_id: i64,
    pub task_id: Option<i32>,

    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i16,

    #[serde(default)]
    pub positive_sights: Vec<String>,

    #[serde(default)]
    pub negative_sights: Vec<String>,

    #[validate(length(max = 4096, message = "Comment is too long"))]
    pub comment: Option<String>,
}

pub async fn create_review(
    State(state): State<AppState>,
    Json(req): Json<CreateReviewRequest>,
) -> ApiResult<(StatusCode, Json<Review>)> {
    req.validate()?;

    if req.reviewer_id == req.reviewed_id {
        return Err(ApiError::BadRequest("Users cannot review themselves".to_string()));
    }

    let review = Review::create(
        &state.db,
        CreateReview {
            reviewer_id: req.reviewer_id,
            reviewed_id: req.reviewed_id,
            task_id: req.task_id,
            rating: req.rating,
            positive_sights: req.positive_sights,
            negative_sights: req.negative_sights,
            comment: req.comment,
        },
    )
    .await?;

    tracing::info!(
        review_id = review.review_id,
        reviewed_id = review.reviewed_id,
        rating = review.rating,
        "Review created"
    );

    Ok((StatusCode::CREATED, Json(review)))
}

/// Top sights, average rating and comments
///
/// # Errors
///
/// - `404 Not Found`: user has no reviews
pub async fn review_summary(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<ReviewSummary>> {
    let summary = Review::summary(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("No reviews found".to_string()))?;

    Ok(Json(summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rating_range() {
        let valid: CreateReviewRequest = serde_json::from_value(json!({
            "reviewer_id": 1,
            "reviewed_id": 2,
            "task_id": 3,
            "rating": 5
        }))
        .unwrap();
        assert!(valid.validate().is_ok());
        assert!(valid.positive_sights.is_empty());

        let invalid: CreateReviewRequest = serde_json::from_value(json!({
            "reviewer_id": 1,
            "reviewed_id": 2,
            "rating": 0
        }))
        .unwrap();
        assert!(invalid.validate().is_err());
    }
}
