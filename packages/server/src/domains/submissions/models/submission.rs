use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::{Attachment, NewAttachment};
use crate::common::{AttachmentId, SubmissionId};

/// One chat message routed through review before publishing.
///
/// `author_display_name` is the snapshot taken at intake; the caption is
/// always derived from it, never from a later lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Submission {
    pub id: SubmissionId,
    pub created_at: DateTime<Utc>,
    pub origin_message_id: i64,
    pub thread_id: i64,
    pub approval_message_id: Option<i64>,
    pub author_id: i64,
    pub author_display_name: String,
    pub content: Option<String>,
    pub posted: bool,
    pub posted_at: Option<DateTime<Utc>>,
    pub post_url: Option<String>,
}

/// Intake data for a submission that passed the ingestion guards.
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub origin_message_id: i64,
    pub thread_id: i64,
    pub author_id: i64,
    pub author_display_name: String,
    pub content: Option<String>,
}

/// Lifecycle position. `Withdrawn` submissions are deleted, so they are never
/// observed through a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionState {
    Collecting,
    AwaitingReview,
    Published,
}

/// Build the caption: the original text (if any) followed by an attribution line.
pub fn compose_description(content: Option<&str>, author_display_name: &str) -> String {
    let attribution = format!("Submitted by {}", author_display_name);
    match content.map(str::trim).filter(|c| !c.is_empty()) {
        Some(text) => format!("{}\n\n{}", text, attribution),
        None => attribution,
    }
}

impl Submission {
    /// Build an unsaved row from intake data.
    pub fn from_new(new: &NewSubmission) -> Self {
        Self {
            id: SubmissionId::new(),
            created_at: Utc::now(),
            origin_message_id: new.origin_message_id,
            thread_id: new.thread_id,
            approval_message_id: None,
            author_id: new.author_id,
            author_display_name: new.author_display_name.clone(),
            content: new.content.clone(),
            posted: false,
            posted_at: None,
            post_url: None,
        }
    }

    /// Caption handed to the publisher.
    pub fn description(&self) -> String {
        compose_description(self.content.as_deref(), &self.author_display_name)
    }

    pub fn state(&self) -> SubmissionState {
        if self.posted {
            SubmissionState::Published
        } else if self.approval_message_id.is_some() {
            SubmissionState::AwaitingReview
        } else {
            SubmissionState::Collecting
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Insert a submission and its stored attachments in one transaction.
    pub async fn create_with_attachments(
        new: &NewSubmission,
        attachments: &[NewAttachment],
        pool: &PgPool,
    ) -> Result<(Self, Vec<Attachment>)> {
        let mut tx = pool.begin().await?;

        let submission = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO submissions (id, origin_message_id, thread_id, author_id, author_display_name, content)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(SubmissionId::new())
        .bind(new.origin_message_id)
        .bind(new.thread_id)
        .bind(new.author_id)
        .bind(&new.author_display_name)
        .bind(&new.content)
        .fetch_one(&mut *tx)
        .await?;

        let mut saved = Vec::with_capacity(attachments.len());
        for (position, attachment) in attachments.iter().enumerate() {
            let row = sqlx::query_as::<_, Attachment>(
                r#"
                INSERT INTO attachments (id, submission_id, position, external_attachment_id, content_type, storage_ref)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
                "#,
            )
            .bind(AttachmentId::new())
            .bind(submission.id)
            .bind(position as i32)
            .bind(attachment.external_attachment_id)
            .bind(&attachment.content_type)
            .bind(&attachment.storage_ref)
            .fetch_one(&mut *tx)
            .await?;
            saved.push(row);
        }

        tx.commit().await?;
        Ok((submission, saved))
    }

    pub async fn find_by_id(id: SubmissionId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM submissions WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_origin_message(message_id: i64, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM submissions WHERE origin_message_id = $1")
            .bind(message_id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_approval_message(message_id: i64, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM submissions WHERE approval_message_id = $1")
            .bind(message_id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Record the approval prompt id. Only the first write wins.
    pub async fn set_approval_message(
        id: SubmissionId,
        message_id: i64,
        pool: &PgPool,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE submissions SET approval_message_id = $2 WHERE id = $1 AND approval_message_id IS NULL",
        )
        .bind(id)
        .bind(message_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Flip `posted` false -> true. Returns false when it was already set.
    pub async fn mark_posted(id: SubmissionId, post_url: &str, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE submissions
            SET posted = TRUE, posted_at = NOW(), post_url = $2
            WHERE id = $1 AND posted = FALSE
            "#,
        )
        .bind(id)
        .bind(post_url)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Hard delete; attachments and reviews cascade.
    pub async fn delete(id: SubmissionId, pool: &PgPool) -> Result<()> {
        sqlx::query("DELETE FROM submissions WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Unposted submissions with at least one approval and no rejections.
    pub async fn find_publish_eligible(pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT s.*
            FROM submissions s
            JOIN reviews r ON r.submission_id = s.id
            WHERE s.posted = FALSE
            GROUP BY s.id
            HAVING COUNT(*) FILTER (WHERE r.approval) > 0
               AND COUNT(*) FILTER (WHERE NOT r.approval) = 0
            ORDER BY s.created_at ASC
            "#,
        )
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
