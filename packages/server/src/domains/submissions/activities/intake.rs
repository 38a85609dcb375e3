//! Intake of new submissions from free-form channel messages.

use anyhow::Result;
use tracing::{debug, error, info, warn};

use crate::common::SubmissionId;
use crate::domains::notifications::Notice;
use crate::domains::submissions::events::{IncomingMedia, MessageCreated};
use crate::domains::submissions::models::{NewAttachment, NewSubmission};
use crate::domains::submissions::verdict::{Verdict, SEEN_SYMBOL};
use crate::kernel::{BotSettings, ServerDeps};

/// Why a creation event was dropped without creating state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    UnauthorizedChannel,
    SelfAuthored,
    Command,
    /// The origin message already has a submission (re-delivered event).
    Duplicate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeOutcome {
    Ignored(IgnoreReason),
    /// No media was supplied, or none of it could be stored.
    NoAttachments,
    Accepted {
        submission_id: SubmissionId,
        attachment_count: usize,
        /// `None` when the approval prompt could not be posted.
        approval_message_id: Option<i64>,
    },
}

/// Ingestion guards. Dropped events are not errors.
pub fn should_reject(event: &MessageCreated, settings: &BotSettings) -> Option<IgnoreReason> {
    if !settings.is_allowed_channel(&event.channel_name) {
        return Some(IgnoreReason::UnauthorizedChannel);
    }
    if event.author_id == settings.bot_user_id {
        return Some(IgnoreReason::SelfAuthored);
    }
    let prefix = settings.command_prefix.as_str();
    let is_command = !prefix.is_empty()
        && event
            .content
            .as_deref()
            .is_some_and(|c| c.trim_start().starts_with(prefix));
    if is_command {
        return Some(IgnoreReason::Command);
    }
    None
}

/// Turn a channel message into a submission awaiting review.
///
/// Each media item is written to the media store before its attachment row
/// exists; items that fail to store are dropped. The approval prompt id is
/// written back before this returns, so any later reaction can find it.
pub async fn ingest_message(event: MessageCreated, deps: &ServerDeps) -> Result<IntakeOutcome> {
    if let Some(reason) = should_reject(&event, &deps.settings) {
        debug!(message_id = event.message_id, ?reason, "Ignoring message");
        return Ok(IntakeOutcome::Ignored(reason));
    }

    if let Some(existing) = deps
        .repository
        .find_by_origin_message(event.message_id)
        .await?
    {
        debug!(
            message_id = event.message_id,
            submission_id = %existing.id,
            "Message already ingested"
        );
        return Ok(IntakeOutcome::Ignored(IgnoreReason::Duplicate));
    }

    let notifier = deps.notifier();

    let thread_name = format!("{}'s submission", event.author_display_name);
    let thread_id = match deps
        .chat
        .create_thread(event.channel_id, event.message_id, &thread_name)
        .await
    {
        Ok(id) => id,
        Err(e) => {
            warn!(
                message_id = event.message_id,
                error = %e,
                "Failed to open thread, replying in channel"
            );
            event.channel_id
        }
    };

    if let Err(e) = deps
        .chat
        .add_reaction(event.channel_id, event.message_id, SEEN_SYMBOL)
        .await
    {
        warn!(message_id = event.message_id, error = %e, "Failed to mark message as seen");
    }

    if event.attachments.is_empty() {
        notifier.notify(thread_id, Notice::NoAttachments).await;
        return Ok(IntakeOutcome::NoAttachments);
    }

    let mut stored = Vec::with_capacity(event.attachments.len());
    for media in &event.attachments {
        match store_media(media, deps).await {
            Ok(attachment) => stored.push(attachment),
            Err(e) => {
                warn!(
                    message_id = event.message_id,
                    attachment_id = media.attachment_id,
                    error = %e,
                    "Failed to store attachment, dropping it"
                );
            }
        }
    }

    if stored.is_empty() {
        notifier.notify(thread_id, Notice::NoAttachments).await;
        return Ok(IntakeOutcome::NoAttachments);
    }

    let new = NewSubmission {
        origin_message_id: event.message_id,
        thread_id,
        author_id: event.author_id,
        author_display_name: event.author_display_name.clone(),
        content: event.content.clone(),
    };
    let (submission, attachments) = match deps.repository.create_submission(&new, &stored).await {
        Ok(created) => created,
        Err(e) => {
            discard_stored(&stored, deps).await;
            return Err(e);
        }
    };

    info!(
        submission_id = %submission.id,
        message_id = event.message_id,
        attachments = attachments.len(),
        "Submission created"
    );

    notifier
        .notify(
            thread_id,
            Notice::Accepted {
                author_id: event.author_id,
                attachment_count: attachments.len(),
                caption: submission.description(),
            },
        )
        .await;

    let prompt = Notice::ApprovalRequested {
        role: deps.settings.approver_role.clone(),
    };
    let approval_message_id = match notifier.post(thread_id, prompt).await {
        Ok(id) => id,
        Err(e) => {
            error!(submission_id = %submission.id, error = %e, "Failed to post approval prompt");
            return Ok(IntakeOutcome::Accepted {
                submission_id: submission.id,
                attachment_count: attachments.len(),
                approval_message_id: None,
            });
        }
    };

    if !deps
        .repository
        .set_approval_message(submission.id, approval_message_id)
        .await?
    {
        warn!(submission_id = %submission.id, "Approval prompt was already recorded");
    }

    for verdict in [Verdict::Approve, Verdict::Reject] {
        if let Err(e) = deps
            .chat
            .add_reaction(thread_id, approval_message_id, verdict.symbol())
            .await
        {
            warn!(submission_id = %submission.id, error = %e, "Failed to seed verdict reaction");
        }
    }

    Ok(IntakeOutcome::Accepted {
        submission_id: submission.id,
        attachment_count: attachments.len(),
        approval_message_id: Some(approval_message_id),
    })
}

async fn store_media(media: &IncomingMedia, deps: &ServerDeps) -> Result<NewAttachment> {
    let data = deps.chat.download_attachment(&media.url).await?;
    let storage_ref = deps.media_store.save(&media.filename, data).await?;
    Ok(NewAttachment {
        external_attachment_id: media.attachment_id,
        content_type: media.resolved_content_type(),
        storage_ref,
    })
}

/// Remove media written for a submission that was never recorded.
async fn discard_stored(stored: &[NewAttachment], deps: &ServerDeps) {
    for attachment in stored {
        if let Err(e) = deps.media_store.delete(&attachment.storage_ref).await {
            warn!(
                storage_ref = %attachment.storage_ref,
                error = %e,
                "Failed to discard orphaned media"
            );
        }
    }
}
