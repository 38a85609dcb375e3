//! Submission intake and review tracking.
//!
//! Inbound chat events are applied one at a time by the event worker:
//!
//! ```text
//! message_created  ─► intake::ingest_message   ─► Submission + Attachments, approval prompt
//! reaction_added   ─► review::record_reaction  ─► Review row appended
//! reaction_removed ─► review::retract_reaction ─► matching Review row deleted
//! message_deleted  ─► withdraw::withdraw_submission ─► Submission deleted (cascade)
//! ```
//!
//! Callers must deliver reaction add/remove events for the same message in
//! the order the platform produced them; nothing here reorders.

pub mod activities;
pub mod events;
pub mod models;
pub mod verdict;

pub use activities::handle_event;
pub use events::{ChatEvent, IncomingMedia, MessageCreated, MessageDeleted, ReactionEvent};
pub use models::{Attachment, Review, Submission, SubmissionState};
pub use verdict::Verdict;
