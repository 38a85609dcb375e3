use anyhow::Result;
use tracing::{debug, info};

use crate::common::SubmissionId;
use crate::domains::notifications::Notice;
use crate::domains::submissions::events::MessageDeleted;
use crate::kernel::ServerDeps;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WithdrawOutcome {
    NotASubmission,
    Withdrawn(SubmissionId),
}

/// The origin message was deleted: drop the submission and everything it owns.
pub async fn withdraw_submission(
    event: MessageDeleted,
    deps: &ServerDeps,
) -> Result<WithdrawOutcome> {
    let Some(submission) = deps
        .repository
        .find_by_origin_message(event.message_id)
        .await?
    else {
        debug!(message_id = event.message_id, "Deleted message is not a submission");
        return Ok(WithdrawOutcome::NotASubmission);
    };

    deps.repository.delete_submission(submission.id).await?;

    info!(
        submission_id = %submission.id,
        message_id = event.message_id,
        previous_state = ?submission.state(),
        "Submission withdrawn"
    );
    deps.notifier()
        .notify(submission.thread_id, Notice::Withdrawn)
        .await;
    Ok(WithdrawOutcome::Withdrawn(submission.id))
}
