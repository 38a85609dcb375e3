//! Postgres implementation of `BaseSubmissionRepository`.
//!
//! Thin delegation to the model queries; every call borrows a connection from
//! the pool for its own duration, so no session outlives a request or sweep.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;

use crate::common::SubmissionId;
use crate::domains::submissions::models::{
    Attachment, NewAttachment, NewReview, NewSubmission, Review, Submission,
};
use crate::kernel::BaseSubmissionRepository;

#[derive(Clone)]
pub struct PostgresSubmissionRepository {
    pool: PgPool,
}

impl PostgresSubmissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl BaseSubmissionRepository for PostgresSubmissionRepository {
    async fn create_submission(
        &self,
        new: &NewSubmission,
        attachments: &[NewAttachment],
    ) -> Result<(Submission, Vec<Attachment>)> {
        Submission::create_with_attachments(new, attachments, &self.pool).await
    }

    async fn find_submission(&self, id: SubmissionId) -> Result<Option<Submission>> {
        Submission::find_by_id(id, &self.pool).await
    }

    async fn find_by_origin_message(&self, message_id: i64) -> Result<Option<Submission>> {
        Submission::find_by_origin_message(message_id, &self.pool).await
    }

    async fn find_by_approval_message(&self, message_id: i64) -> Result<Option<Submission>> {
        Submission::find_by_approval_message(message_id, &self.pool).await
    }

    async fn set_approval_message(&self, id: SubmissionId, message_id: i64) -> Result<bool> {
        Submission::set_approval_message(id, message_id, &self.pool).await
    }

    async fn mark_posted(&self, id: SubmissionId, post_url: &str) -> Result<bool> {
        Submission::mark_posted(id, post_url, &self.pool).await
    }

    async fn delete_submission(&self, id: SubmissionId) -> Result<()> {
        Submission::delete(id, &self.pool).await
    }

    async fn attachments_for(&self, id: SubmissionId) -> Result<Vec<Attachment>> {
        Attachment::find_for_submission(id, &self.pool).await
    }

    async fn add_review(&self, new: &NewReview) -> Result<Review> {
        Review::create(new, &self.pool).await
    }

    async fn remove_review(
        &self,
        submission_id: SubmissionId,
        reviewer_id: i64,
        approval: bool,
    ) -> Result<bool> {
        Review::delete_matching(submission_id, reviewer_id, approval, &self.pool).await
    }

    async fn reviews_for(&self, id: SubmissionId) -> Result<Vec<Review>> {
        Review::find_for_submission(id, &self.pool).await
    }

    async fn find_publish_eligible(&self) -> Result<Vec<Submission>> {
        Submission::find_publish_eligible(&self.pool).await
    }
}
