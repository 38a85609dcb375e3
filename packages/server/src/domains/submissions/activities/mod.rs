pub mod intake;
pub mod review;
pub mod withdraw;

pub use intake::{ingest_message, IgnoreReason, IntakeOutcome};
pub use review::{record_reaction, retract_reaction, ReviewOutcome};
pub use withdraw::{withdraw_submission, WithdrawOutcome};

use anyhow::Result;

use super::events::ChatEvent;
use crate::kernel::ServerDeps;

/// Apply one inbound event. Outcomes are logged by the individual activities.
pub async fn handle_event(event: ChatEvent, deps: &ServerDeps) -> Result<()> {
    match event {
        ChatEvent::MessageCreated(created) => {
            ingest_message(created, deps).await?;
        }
        ChatEvent::ReactionAdded(reaction) => {
            record_reaction(reaction, deps).await?;
        }
        ChatEvent::ReactionRemoved(reaction) => {
            retract_reaction(reaction, deps).await?;
        }
        ChatEvent::MessageDeleted(deleted) => {
            withdraw_submission(deleted, deps).await?;
        }
    }
    Ok(())
}
