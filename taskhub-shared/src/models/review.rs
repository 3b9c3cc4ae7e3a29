/// Reviews and review statistics
///
/// A review carries a 1..=5 rating plus free-form "sights": short titles for
/// what the reviewer liked (`positive_sights`) or disliked
/// (`negative_sights`). The profile page shows the most common sights, the
/// average rating and all written comments.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// How many sights of each kind the summary shows
pub const TOP_SIGHTS: i64 = 3;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Review {
    pub review_id: i32,
    pub reviewer_id: i64,
    pub reviewed_id: i64,
    pub task_id: Option<i32>,
    pub rating: i16,
    pub positive_sights: Vec<String>,
    pub negative_sights: Vec<String>,
    pub comment: Option<String>,
    pub review_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReview {
    pub reviewer_id: i64,
    pub reviewed_id: i64,
    pub task_id: Option<i32>,
    pub rating: i16,
    pub positive_sights: Vec<String>,
    pub negative_sights: Vec<String>,
    pub comment: Option<String>,
}

/// One sight title and how many reviews mention it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SightCount {
    pub username: String,
    pub reviewed_id: i64,
    pub sight_title: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReviewComment {
    /// Reviewer's username
    pub username: String,
    pub comment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewSummary {
    pub pos_sights: Vec<SightCount>,
    pub neg_sights: Vec<SightCount>,
    pub avg_rating: Decimal,
    pub comments: Vec<ReviewComment>,
}

#[derive(Debug, Clone, Copy)]
enum SightKind {
    Positive,
    Negative,
}

impl SightKind {
    fn column(self) -> &'static str {
        match self {
            SightKind::Positive => "positive_sights",
            SightKind::Negative => "negative_sights",
        }
    }
}

impl Review {
    pub async fn create(pool: &PgPool, data: CreateReview) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews (
                reviewer_id, reviewed_id, task_id, rating,
                positive_sights, negative_sights, comment
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(data.reviewer_id)
        .bind(data.reviewed_id)
        .bind(data.task_id)
        .bind(data.rating)
        .bind(data.positive_sights)
        .bind(data.negative_sights)
        .bind(data.comment)
        .fetch_one(pool)
        .await
    }

    /// Aggregated statistics for the reviewed user, `None` without reviews.
    pub async fn summary(pool: &PgPool, reviewed_id: i64) -> Result<Option<ReviewSummary>, sqlx::Error> {
        let avg_rating: Option<Decimal> = sqlx::query_scalar(
            "SELECT ROUND(AVG(rating)::NUMERIC, 2) FROM reviews WHERE reviewed_id = $1",
        )
        .bind(reviewed_id)
        .fetch_one(pool)
        .await?;

        let Some(avg_rating) = avg_rating else {
            return Ok(None);
        };

        let pos_sights = Self::top_sights(pool, reviewed_id, SightKind::Positive).await?;
        let neg_sights = Self::top_sights(pool, reviewed_id, SightKind::Negative).await?;

        let comments = sqlx::query_as::<_, ReviewComment>(
            r#"
            SELECT u.username, r.comment
            FROM reviews r
            JOIN users u ON u.telegram_id = r.reviewer_id
            WHERE r.reviewed_id = $1
              AND r.comment IS NOT NULL
              AND r.comment <> ''
            ORDER BY r.review_date DESC, r.review_id DESC
            "#,
        )
        .bind(reviewed_id)
        .fetch_all(pool)
        .await?;

        Ok(Some(ReviewSummary {
            pos_sights,
            neg_sights,
            avg_rating,
            comments,
        }))
    }

    async fn top_sights(
        pool: &PgPool,
        reviewed_id: i64,
        kind: SightKind,
    ) -> Result<Vec<SightCount>, sqlx::Error> {
        // Column name comes from a closed enum, never from input
        let query = format!(
            r#"
            SELECT u.username, r.reviewed_id, s.sight AS sight_title, COUNT(*) AS count
            FROM reviews r
            CROSS JOIN LATERAL unnest(r.{column}) AS s(sight)
            JOIN users u ON u.telegram_id = r.reviewed_id
            WHERE r.reviewed_id = $1
            GROUP BY u.username, r.reviewed_id, s.sight
            ORDER BY count DESC, sight_title ASC
            LIMIT $2
            "#,
            column = kind.column()
        );

        sqlx::query_as::<_, SightCount>(&query)
            .bind(reviewed_id)
            .bind(TOP_SIGHTS)
            .fetch_all(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sight_columns() {
        assert_eq!(SightKind::Positive.column(), "positive_sights");
        assert_eq!(SightKind::Negative.column(), "negative_sights");
    }

    #[test]
    fn test_summary_serializes_rating_as_string() {
        let summary = ReviewSummary {
            pos_sights: vec![SightCount {
                username: "ivan".to_string(),
                reviewed_id: 1,
                sight_title: "fast".to_string(),
                count: 2,
            }],
            neg_sights: vec![],
            avg_rating: Decimal::new(450, 2),
            comments: vec![],
        };

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["avg_rating"], "4.50");
        assert_eq!(value["pos_sights"][0]["sight_title"], "fast");
    }
}
