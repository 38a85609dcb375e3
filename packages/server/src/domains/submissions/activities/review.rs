//! Reviews arrive as reactions on a submission's approval prompt.

use anyhow::Result;
use tracing::{debug, info};

use crate::common::SubmissionId;
use crate::domains::notifications::Notice;
use crate::domains::publishing::QuorumEvaluator;
use crate::domains::submissions::events::ReactionEvent;
use crate::domains::submissions::models::NewReview;
use crate::domains::submissions::verdict::Verdict;
use crate::kernel::ServerDeps;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewOutcome {
    /// Reaction by the bot itself.
    SelfReaction,
    /// The reacted-to message is not an approval prompt.
    UnknownPrompt,
    /// Not one of the verdict markers.
    UnrecognizedSymbol,
    Recorded {
        submission_id: SubmissionId,
        verdict: Verdict,
    },
    Retracted {
        submission_id: SubmissionId,
        verdict: Verdict,
    },
    /// Retraction with no matching review on record.
    NothingToRetract {
        submission_id: SubmissionId,
        verdict: Verdict,
    },
}

/// Append a review for a verdict reaction.
///
/// A second identical reaction appends a second row; eligibility only
/// depends on whether any approval/rejection rows exist.
pub async fn record_reaction(event: ReactionEvent, deps: &ServerDeps) -> Result<ReviewOutcome> {
    if event.user_id == deps.settings.bot_user_id {
        return Ok(ReviewOutcome::SelfReaction);
    }

    let Some(submission) = deps
        .repository
        .find_by_approval_message(event.message_id)
        .await?
    else {
        debug!(message_id = event.message_id, "Could not find submission for reaction");
        return Ok(ReviewOutcome::UnknownPrompt);
    };

    let Some(verdict) = Verdict::classify(&event.emoji) else {
        return Ok(ReviewOutcome::UnrecognizedSymbol);
    };

    let reviewer_display_name = match event.user_display_name.clone() {
        Some(name) => name,
        None => resolve_display_name(event.user_id, deps).await,
    };

    let review = deps
        .repository
        .add_review(&NewReview {
            submission_id: submission.id,
            approval: verdict.approval(),
            reviewer_id: event.user_id,
            reviewer_display_name,
        })
        .await?;

    if tracing::enabled!(tracing::Level::INFO) {
        let eligible = publishable(submission.id, deps).await;
        info!(
            submission_id = %submission.id,
            review_id = %review.id,
            reviewer_id = event.user_id,
            ?verdict,
            state = ?submission.state(),
            eligible = ?eligible,
            "Review recorded"
        );
    }

    let notice = match verdict {
        Verdict::Approve => Notice::Approved {
            reviewer_id: event.user_id,
        },
        Verdict::Reject => Notice::Rejected {
            reviewer_id: event.user_id,
        },
    };
    deps.notifier().notify(submission.thread_id, notice).await;

    Ok(ReviewOutcome::Recorded {
        submission_id: submission.id,
        verdict,
    })
}

/// Delete the review matching a removed verdict reaction.
pub async fn retract_reaction(event: ReactionEvent, deps: &ServerDeps) -> Result<ReviewOutcome> {
    if event.user_id == deps.settings.bot_user_id {
        return Ok(ReviewOutcome::SelfReaction);
    }

    let Some(submission) = deps
        .repository
        .find_by_approval_message(event.message_id)
        .await?
    else {
        debug!(
            message_id = event.message_id,
            "Could not find submission for removed reaction"
        );
        return Ok(ReviewOutcome::UnknownPrompt);
    };

    let Some(verdict) = Verdict::classify(&event.emoji) else {
        return Ok(ReviewOutcome::UnrecognizedSymbol);
    };

    let removed = deps
        .repository
        .remove_review(submission.id, event.user_id, verdict.approval())
        .await?;

    if !removed {
        info!(
            submission_id = %submission.id,
            reviewer_id = event.user_id,
            ?verdict,
            "No matching review to retract"
        );
        return Ok(ReviewOutcome::NothingToRetract {
            submission_id: submission.id,
            verdict,
        });
    }

    if tracing::enabled!(tracing::Level::INFO) {
        let eligible = publishable(submission.id, deps).await;
        info!(
            submission_id = %submission.id,
            reviewer_id = event.user_id,
            ?verdict,
            state = ?submission.state(),
            eligible = ?eligible,
            "Review retracted"
        );
    }

    let notice = match verdict {
        Verdict::Approve => Notice::ApprovalRetracted {
            reviewer_id: event.user_id,
        },
        Verdict::Reject => Notice::RejectionRetracted {
            reviewer_id: event.user_id,
        },
    };
    deps.notifier().notify(submission.thread_id, notice).await;

    Ok(ReviewOutcome::Retracted {
        submission_id: submission.id,
        verdict,
    })
}

/// Eligibility after a review change, for the log line only. `None` if the
/// lookup failed.
async fn publishable(id: SubmissionId, deps: &ServerDeps) -> Option<bool> {
    QuorumEvaluator::new(deps.repository.clone())
        .is_eligible(id)
        .await
        .map_err(|e| debug!(submission_id = %id, error = %e, "Eligibility lookup failed"))
        .ok()
}

async fn resolve_display_name(user_id: i64, deps: &ServerDeps) -> String {
    match deps.chat.display_name(user_id).await {
        Ok(name) => name,
        Err(e) => {
            debug!(user_id, error = %e, "Display name lookup failed");
            user_id.to_string()
        }
    }
}
