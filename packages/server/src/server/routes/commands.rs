use axum::{extract::Extension, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::domains::publishing::{PublishError, SweepOutcome, SweepReport, SweepTrigger};
use crate::domains::submissions::events::snowflake;
use crate::server::app::AppState;

pub const MISSING_ROLE_MESSAGE: &str = "You do not have the correct role.";

#[derive(Debug, Deserialize)]
pub struct PublishNowRequest {
    /// The member who invoked the command.
    #[serde(deserialize_with = "snowflake")]
    pub user_id: i64,
}

#[derive(Debug, Serialize)]
pub struct PublishNowResponse {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<SweepReport>,
}

impl PublishNowResponse {
    fn new(status: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            report: None,
        }
    }
}

/// Manual sweep trigger, restricted to members holding the approver role.
pub async fn publish_now_handler(
    Extension(state): Extension<AppState>,
    Json(request): Json<PublishNowRequest>,
) -> (StatusCode, Json<PublishNowResponse>) {
    let deps = &state.server_deps;

    let roles = match deps.chat.member_role_names(request.user_id).await {
        Ok(roles) => roles,
        Err(e) => {
            error!(user_id = request.user_id, error = %format!("{:#}", e), "Role lookup failed");
            return (
                StatusCode::BAD_GATEWAY,
                Json(PublishNowResponse::new("error", "Could not verify roles.")),
            );
        }
    };

    if !roles.iter().any(|r| r == &deps.settings.approver_role) {
        warn!(user_id = request.user_id, "Publish-now denied, missing approver role");
        return (
            StatusCode::FORBIDDEN,
            Json(PublishNowResponse::new("forbidden", MISSING_ROLE_MESSAGE)),
        );
    }

    info!(user_id = request.user_id, "Manual publish requested");
    let trigger = SweepTrigger::Manual {
        requested_by: request.user_id,
    };

    match state.coordinator.run_sweep(trigger).await {
        Ok(SweepOutcome::Completed(report)) => (
            StatusCode::OK,
            Json(PublishNowResponse {
                status: "completed",
                message: format!(
                    "Published {} of {} eligible submissions.",
                    report.published, report.eligible
                ),
                report: Some(report),
            }),
        ),
        Ok(SweepOutcome::AlreadyRunning) => (
            StatusCode::CONFLICT,
            Json(PublishNowResponse::new(
                "already_running",
                "A publish sweep is already running.",
            )),
        ),
        Err(e @ PublishError::Authentication(_)) => (
            StatusCode::BAD_GATEWAY,
            Json(PublishNowResponse::new("error", e.to_string())),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(PublishNowResponse::new("error", e.to_string())),
        ),
    }
}
