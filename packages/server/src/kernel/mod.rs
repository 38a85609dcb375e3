//! Kernel module - server infrastructure and dependencies.

pub mod deps;
pub mod event_worker;
pub mod media_store;
pub mod publisher;
pub mod repository;
pub mod scheduled_tasks;
pub mod test_dependencies;
pub mod traits;

pub use deps::{BotSettings, DiscordAdapter, ServerDeps};
pub use event_worker::{event_channel, EventQueue, EventWorker, DEFAULT_QUEUE_CAPACITY};
pub use media_store::{LocalMediaStore, MediaStoreError};
pub use publisher::InstagramPublisher;
pub use repository::PostgresSubmissionRepository;
pub use scheduled_tasks::start_scheduler;
pub use test_dependencies::TestDependencies;
pub use traits::*;
