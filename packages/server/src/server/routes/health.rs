use axum::{extract::Extension, http::StatusCode, Json};
use serde::Serialize;
use std::time::Duration;

use crate::domains::publishing::SweepRecord;
use crate::server::app::AppState;

const DB_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    database: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    database_error: Option<String>,
    /// Events accepted by `/events` but not yet applied.
    queued_events: usize,
    sweep_running: bool,
    last_sweep: Option<SweepRecord>,
}

/// Liveness of the bot: 200 when the database answers, 503 otherwise.
/// Sweep and queue state are informational and never fail the check.
pub async fn health_handler(
    Extension(state): Extension<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let check = sqlx::query("SELECT 1").execute(&state.db_pool);
    let database_error = match tokio::time::timeout(DB_CHECK_TIMEOUT, check).await {
        Ok(Ok(_)) => None,
        Ok(Err(e)) => Some(e.to_string()),
        Err(_) => Some(format!("no answer within {}s", DB_CHECK_TIMEOUT.as_secs())),
    };

    let (code, status, database) = match database_error {
        None => (StatusCode::OK, "healthy", "ok"),
        Some(_) => (StatusCode::SERVICE_UNAVAILABLE, "unhealthy", "unreachable"),
    };

    (
        code,
        Json(HealthResponse {
            status,
            database,
            database_error,
            queued_events: state.events.pending(),
            sweep_running: state.coordinator.is_sweep_running(),
            last_sweep: state.coordinator.last_sweep().await,
        }),
    )
}
