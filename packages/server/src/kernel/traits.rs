// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Submission intake, quorum and publishing live in domains/* and talk to the
// outside world exclusively through these seams.
//
// Naming convention: Base* for trait names (e.g., BaseChatPlatform, BasePublisher)

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;

use crate::common::SubmissionId;
use crate::domains::submissions::models::{
    Attachment, NewAttachment, NewReview, NewSubmission, Review, Submission,
};

// =============================================================================
// Submission Repository (Infrastructure - durable store)
// =============================================================================

/// Durable CRUD over submissions, attachments and reviews.
///
/// Implementations must not cache rows across calls; every call reads the
/// current state of the store.
#[async_trait]
pub trait BaseSubmissionRepository: Send + Sync {
    /// Insert a submission together with its already-stored attachments
    /// (atomically; attachment order is preserved).
    async fn create_submission(
        &self,
        new: &NewSubmission,
        attachments: &[NewAttachment],
    ) -> Result<(Submission, Vec<Attachment>)>;

    async fn find_submission(&self, id: SubmissionId) -> Result<Option<Submission>>;

    async fn find_by_origin_message(&self, message_id: i64) -> Result<Option<Submission>>;

    async fn find_by_approval_message(&self, message_id: i64) -> Result<Option<Submission>>;

    /// Back-fill the approval prompt id. Returns false if one was already set.
    async fn set_approval_message(&self, id: SubmissionId, message_id: i64) -> Result<bool>;

    /// One-way `posted` transition. Returns false if it was already posted.
    async fn mark_posted(&self, id: SubmissionId, post_url: &str) -> Result<bool>;

    /// Hard delete, cascading to attachments and reviews.
    async fn delete_submission(&self, id: SubmissionId) -> Result<()>;

    async fn attachments_for(&self, id: SubmissionId) -> Result<Vec<Attachment>>;

    async fn add_review(&self, new: &NewReview) -> Result<Review>;

    /// Delete one review matching (submission, reviewer, verdict).
    /// Returns false when none matched.
    async fn remove_review(
        &self,
        submission_id: SubmissionId,
        reviewer_id: i64,
        approval: bool,
    ) -> Result<bool>;

    async fn reviews_for(&self, id: SubmissionId) -> Result<Vec<Review>>;

    /// All unposted submissions with >= 1 approving and 0 rejecting reviews,
    /// computed set-wise.
    async fn find_publish_eligible(&self) -> Result<Vec<Submission>>;
}

// =============================================================================
// Media Store (Infrastructure - attachment bytes)
// =============================================================================

#[async_trait]
pub trait BaseMediaStore: Send + Sync {
    /// Persist raw bytes and return an opaque storage reference.
    async fn save(&self, file_name: &str, data: Bytes) -> Result<String>;

    async fn read(&self, storage_ref: &str) -> Result<Bytes>;

    /// Store a derived rendition (e.g. a re-encoded image) next to the source
    /// object, under the same name with a new extension.
    async fn save_derived(&self, source_ref: &str, extension: &str, data: Bytes) -> Result<String>;

    /// Remove a stored object. Deleting a missing object is not an error.
    async fn delete(&self, storage_ref: &str) -> Result<()>;
}

// =============================================================================
// Chat Platform (Infrastructure - event source and notification sink)
// =============================================================================

/// The narrow slice of the chat platform the bot consumes.
#[async_trait]
pub trait BaseChatPlatform: Send + Sync {
    /// Send a plain-text message; returns the new message id.
    async fn send_message(&self, channel_id: i64, text: &str) -> Result<i64>;

    /// Open a thread anchored on `message_id`; returns the thread id.
    async fn create_thread(&self, channel_id: i64, message_id: i64, name: &str) -> Result<i64>;

    async fn add_reaction(&self, channel_id: i64, message_id: i64, emoji: &str) -> Result<()>;

    /// Names of the roles held by a member of the configured community.
    async fn member_role_names(&self, user_id: i64) -> Result<Vec<String>>;

    async fn display_name(&self, user_id: i64) -> Result<String>;

    async fn download_attachment(&self, url: &str) -> Result<Bytes>;
}

// =============================================================================
// Publisher (Infrastructure - external social platform)
// =============================================================================

/// A media item handed to the publisher, in post order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishMedia {
    pub storage_ref: String,
    pub content_type: String,
}

impl PublishMedia {
    pub fn is_video(&self) -> bool {
        self.content_type.starts_with("video/")
    }
}

#[async_trait]
pub trait BasePublisher: Send + Sync {
    /// Authenticate and open a session. Sessions are owned by a single sweep.
    async fn login(&self) -> Result<Box<dyn PublishSession>>;
}

/// An authenticated publishing session. Every call returns the public URL of
/// the created post.
#[async_trait]
pub trait PublishSession: Send + Sync {
    async fn publish_photo(&self, media: &PublishMedia, caption: &str) -> Result<String>;

    async fn publish_video(&self, media: &PublishMedia, caption: &str) -> Result<String>;

    async fn publish_album(&self, media: &[PublishMedia], caption: &str) -> Result<String>;
}
