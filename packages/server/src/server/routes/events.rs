use axum::{extract::Extension, http::StatusCode, Json};
use tracing::error;

use crate::domains::submissions::ChatEvent;
use crate::server::app::AppState;

/// Queue a relayed chat event for the event worker.
///
/// Returns 202 once queued; 503 if the worker is gone.
pub async fn events_handler(
    Extension(state): Extension<AppState>,
    Json(event): Json<ChatEvent>,
) -> StatusCode {
    let kind = event.kind();
    match state.events.enqueue(event).await {
        Ok(()) => StatusCode::ACCEPTED,
        Err(e) => {
            error!(kind, error = %e, "Failed to queue event");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
