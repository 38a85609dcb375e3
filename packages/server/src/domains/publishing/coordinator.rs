use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::normalize::{normalize_attachment, normalize_for_album};
use super::{PublishError, PublishStrategy, QuorumEvaluator};
use crate::domains::notifications::Notice;
use crate::domains::submissions::models::{Attachment, Submission};
use crate::kernel::{PublishMedia, PublishSession, ServerDeps};

/// What started a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SweepTrigger {
    Scheduled,
    Manual { requested_by: i64 },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub eligible: usize,
    pub published: usize,
    pub failed: usize,
    /// Benign no-ops: already posted, withdrawn mid-sweep, no attachments.
    pub skipped: usize,
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepOutcome {
    Completed(SweepReport),
    /// Another sweep holds the lock; nothing was attempted.
    AlreadyRunning,
}

/// How the most recent sweep that actually ran ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepRecord {
    pub trigger: SweepTrigger,
    pub finished_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<SweepReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Runs publish sweeps. Clones share one in-flight flag, so the scheduler and
/// the manual command can never overlap.
#[derive(Clone)]
pub struct PublishCoordinator {
    deps: ServerDeps,
    running: Arc<AtomicBool>,
    last_sweep: Arc<RwLock<Option<SweepRecord>>>,
}

/// Clears the in-flight flag when the sweep ends, however it ends.
struct SweepGuard(Arc<AtomicBool>);

impl Drop for SweepGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl PublishCoordinator {
    pub fn new(deps: ServerDeps) -> Self {
        Self {
            deps,
            running: Arc::new(AtomicBool::new(false)),
            last_sweep: Arc::new(RwLock::new(None)),
        }
    }

    pub fn is_sweep_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// `None` until a sweep has finished. Refused overlapping sweeps are not
    /// recorded.
    pub async fn last_sweep(&self) -> Option<SweepRecord> {
        self.last_sweep.read().await.clone()
    }

    fn begin_sweep(&self) -> Option<SweepGuard> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SweepGuard(self.running.clone()))
    }

    /// Publish every quorum-eligible submission.
    ///
    /// Only a failed login or a failed eligibility query aborts the sweep.
    /// Per-submission failures are reported in the returned `SweepReport`.
    pub async fn run_sweep(&self, trigger: SweepTrigger) -> Result<SweepOutcome, PublishError> {
        let Some(_guard) = self.begin_sweep() else {
            info!(?trigger, "Sweep already in progress, skipping");
            return Ok(SweepOutcome::AlreadyRunning);
        };

        let result = self.sweep(trigger).await;

        let record = SweepRecord {
            trigger,
            finished_at: Utc::now(),
            report: result.as_ref().ok().cloned(),
            error: result.as_ref().err().map(ToString::to_string),
        };
        *self.last_sweep.write().await = Some(record);

        result.map(SweepOutcome::Completed)
    }

    async fn sweep(&self, trigger: SweepTrigger) -> Result<SweepReport, PublishError> {
        info!(?trigger, "Starting publish sweep");

        let eligible = QuorumEvaluator::new(self.deps.repository.clone())
            .eligible()
            .await
            .map_err(PublishError::Repository)?;

        let mut report = SweepReport {
            eligible: eligible.len(),
            ..SweepReport::default()
        };

        if eligible.is_empty() {
            info!("No submissions eligible for publishing");
            return Ok(report);
        }

        let session = match self.deps.publisher.login().await {
            Ok(session) => session,
            Err(e) => {
                error!(error = %format!("{:#}", e), "Publishing login failed, aborting sweep");
                return Err(PublishError::Authentication(e));
            }
        };

        for submission in &eligible {
            match self.publish_one(session.as_ref(), submission).await {
                Ok(url) => {
                    report.published += 1;
                    report.urls.push(url);
                }
                Err(e) if e.is_benign() => {
                    info!(submission_id = %submission.id, reason = %e, "Skipped submission");
                    report.skipped += 1;
                }
                Err(e) => {
                    error!(
                        submission_id = %submission.id,
                        error = %e,
                        "Failed to publish submission"
                    );
                    report.failed += 1;
                }
            }
        }

        info!(
            eligible = report.eligible,
            published = report.published,
            failed = report.failed,
            skipped = report.skipped,
            "Publish sweep finished"
        );
        Ok(report)
    }

    /// Publish a single submission with an already authenticated session.
    ///
    /// `posted` is written before the success notice goes out; a crash
    /// between upload and that write is the only way to post twice.
    pub async fn publish_one(
        &self,
        session: &dyn PublishSession,
        submission: &Submission,
    ) -> Result<String, PublishError> {
        let current = self
            .deps
            .repository
            .find_submission(submission.id)
            .await
            .map_err(PublishError::Repository)?
            .ok_or(PublishError::Withdrawn)?;
        if current.posted {
            return Err(PublishError::AlreadyPublished);
        }

        let notifier = self.deps.notifier();

        let url = match self.upload(session, &current).await {
            Ok(url) => url,
            Err(e) => {
                if !e.is_benign() {
                    notifier.notify(current.thread_id, Notice::PublishFailed).await;
                }
                return Err(e);
            }
        };

        match self.deps.repository.mark_posted(current.id, &url).await {
            Ok(true) => {
                info!(submission_id = %current.id, url = %url, "Submission published");
                notifier
                    .notify(current.thread_id, Notice::Published { url: url.clone() })
                    .await;
                Ok(url)
            }
            Ok(false) => {
                error!(
                    submission_id = %current.id,
                    url = %url,
                    "Submission was marked posted by someone else during upload"
                );
                Err(PublishError::AlreadyPublished)
            }
            Err(e) => {
                error!(
                    submission_id = %current.id,
                    url = %url,
                    error = %format!("{:#}", e),
                    "Published but failed to record it; the next sweep may post again"
                );
                Err(PublishError::Repository(e))
            }
        }
    }

    async fn upload(
        &self,
        session: &dyn PublishSession,
        submission: &Submission,
    ) -> Result<String, PublishError> {
        let attachments = self
            .deps
            .repository
            .attachments_for(submission.id)
            .await
            .map_err(PublishError::Repository)?;

        let strategy = PublishStrategy::select(&attachments);
        if strategy == PublishStrategy::Nothing {
            warn!(submission_id = %submission.id, "Eligible submission has no attachments");
            return Err(PublishError::NoAttachments);
        }

        self.deps
            .notifier()
            .notify(submission.thread_id, Notice::PublishAttempted)
            .await;

        let caption = submission.description();
        info!(
            submission_id = %submission.id,
            ?strategy,
            attachments = attachments.len(),
            "Publishing submission"
        );

        match strategy {
            PublishStrategy::Nothing => Err(PublishError::NoAttachments),
            PublishStrategy::SinglePhoto => {
                let media = normalize_attachment(&attachments[0], &self.deps.media_store).await?;
                session
                    .publish_photo(&media, &caption)
                    .await
                    .map_err(PublishError::Upload)
            }
            PublishStrategy::SingleVideo => session
                .publish_video(&as_media(&attachments[0]), &caption)
                .await
                .map_err(PublishError::Upload),
            PublishStrategy::Album => {
                let media = normalize_for_album(&attachments, &self.deps.media_store).await?;
                session
                    .publish_album(&media, &caption)
                    .await
                    .map_err(PublishError::Upload)
            }
        }
    }
}

fn as_media(attachment: &Attachment) -> PublishMedia {
    PublishMedia {
        storage_ref: attachment.storage_ref.clone(),
        content_type: attachment.content_type.clone(),
    }
}
