use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{ReviewId, SubmissionId};

/// One reviewer's verdict. Retraction deletes the row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Review {
    pub id: ReviewId,
    pub submission_id: SubmissionId,
    pub approval: bool,
    pub reviewer_id: i64,
    pub reviewer_display_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub submission_id: SubmissionId,
    pub approval: bool,
    pub reviewer_id: i64,
    pub reviewer_display_name: String,
}

impl Review {
    pub async fn create(new: &NewReview, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO reviews (id, submission_id, approval, reviewer_id, reviewer_display_name)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(ReviewId::new())
        .bind(new.submission_id)
        .bind(new.approval)
        .bind(new.reviewer_id)
        .bind(&new.reviewer_display_name)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Delete the oldest review matching (submission, reviewer, verdict).
    /// Returns false when there was nothing to delete.
    pub async fn delete_matching(
        submission_id: SubmissionId,
        reviewer_id: i64,
        approval: bool,
        pool: &PgPool,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM reviews
            WHERE id = (
                SELECT id FROM reviews
                WHERE submission_id = $1 AND reviewer_id = $2 AND approval = $3
                ORDER BY created_at ASC, id ASC
                LIMIT 1
            )
            "#,
        )
        .bind(submission_id)
        .bind(reviewer_id)
        .bind(approval)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn find_for_submission(
        submission_id: SubmissionId,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM reviews WHERE submission_id = $1 ORDER BY created_at ASC",
        )
        .bind(submission_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
