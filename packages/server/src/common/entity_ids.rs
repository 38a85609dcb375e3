//! Typed ID definitions for the persisted entities.

pub use super::id::Id;

/// Marker type for Submission entities.
pub struct Submission;

/// Marker type for Attachment entities.
pub struct Attachment;

/// Marker type for Review entities.
pub struct Review;

pub type SubmissionId = Id<Submission>;

pub type AttachmentId = Id<Attachment>;

pub type ReviewId = Id<Review>;
