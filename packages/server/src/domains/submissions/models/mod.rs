pub mod attachment;
pub mod review;
pub mod submission;

pub use attachment::{Attachment, NewAttachment};
pub use review::{NewReview, Review};
pub use submission::{NewSubmission, Submission, SubmissionState};
