//! Scheduled background tasks using tokio-cron-scheduler.
//!
//! One job: the daily publish sweep. The schedule is a 6-field cron
//! expression evaluated in a fixed local timezone, so the sweep keeps its
//! wall-clock time across DST changes.
//!
//! ```text
//! Scheduler (PUBLISH_SCHEDULE)
//!     │
//!     └─► PublishCoordinator::run_sweep(Scheduled)
//!             └─► skipped if a manual sweep is still running
//! ```

use anyhow::{Context, Result};
use chrono_tz::Tz;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::domains::publishing::{PublishCoordinator, SweepOutcome, SweepTrigger};

/// Start all scheduled tasks
pub async fn start_scheduler(
    coordinator: PublishCoordinator,
    schedule: &str,
    timezone: Tz,
) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let sweep_job = Job::new_async_tz(schedule, timezone, move |_uuid, _lock| {
        let coordinator = coordinator.clone();
        Box::pin(async move {
            run_scheduled_sweep(&coordinator).await;
        })
    })
    .with_context(|| format!("Invalid publish schedule '{}'", schedule))?;

    scheduler.add(sweep_job).await?;
    scheduler.start().await?;

    tracing::info!(
        schedule = %schedule,
        timezone = %timezone,
        "Scheduled tasks started (publish sweep)"
    );
    Ok(scheduler)
}

async fn run_scheduled_sweep(coordinator: &PublishCoordinator) {
    match coordinator.run_sweep(SweepTrigger::Scheduled).await {
        Ok(SweepOutcome::Completed(report)) => {
            tracing::info!(
                published = report.published,
                failed = report.failed,
                "Scheduled sweep completed"
            );
        }
        Ok(SweepOutcome::AlreadyRunning) => {
            tracing::info!("Scheduled sweep skipped, another sweep is running");
        }
        Err(e) => {
            tracing::error!(error = %e, "Scheduled sweep failed");
        }
    }
}
