use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{AttachmentId, SubmissionId};

/// A stored media item. `position` preserves upload order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Attachment {
    pub id: AttachmentId,
    pub submission_id: SubmissionId,
    pub position: i32,
    pub external_attachment_id: i64,
    pub content_type: String,
    /// Opaque reference returned by the media store.
    pub storage_ref: String,
}

/// An attachment whose bytes were already written to the media store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttachment {
    pub external_attachment_id: i64,
    pub content_type: String,
    pub storage_ref: String,
}

impl Attachment {
    pub fn is_video(&self) -> bool {
        self.content_type.starts_with("video/")
    }

    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }

    pub async fn find_for_submission(
        submission_id: SubmissionId,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM attachments WHERE submission_id = $1 ORDER BY position ASC",
        )
        .bind(submission_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
