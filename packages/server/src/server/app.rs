//! Application setup and server configuration.

use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::Extension,
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::domains::publishing::PublishCoordinator;
use crate::kernel::{EventQueue, ServerDeps};
use crate::server::middleware::ingress_auth_middleware;
use crate::server::routes::{events_handler, health_handler, publish_now_handler};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub server_deps: ServerDeps,
    pub events: EventQueue,
    pub coordinator: PublishCoordinator,
}

/// Build the Axum application router
///
/// - `POST /events`: relayed chat events, applied by the event worker
/// - `POST /commands/publish-now`: manual sweep, approver role only
/// - `GET /health`
/// - `GET /media/*`: stored attachments, fetched by the publishing platform
pub fn build_app(state: AppState, media_root: &Path, ingress_token: Option<String>) -> Router {
    let token = ingress_token.map(Arc::new);

    let ingress = Router::new()
        .route("/events", post(events_handler))
        .route("/commands/publish-now", post(publish_now_handler))
        .layer(middleware::from_fn(move |req, next| {
            ingress_auth_middleware(token.clone(), req, next)
        }));

    Router::new()
        .merge(ingress)
        .route("/health", get(health_handler))
        .nest_service("/media", ServeDir::new(media_root))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(Extension(state)),
        )
}
