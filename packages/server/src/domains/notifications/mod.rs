//! Human-readable status messages mirrored into the submission thread.

pub mod notice;
pub mod notifier;

pub use notice::Notice;
pub use notifier::Notifier;
