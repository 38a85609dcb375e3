use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::debug;

/// Shared-secret check for the ingress routes.
///
/// With no token configured every request passes.
pub async fn ingress_auth_middleware(
    token: Option<Arc<String>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(expected) = token else {
        return next.run(request).await;
    };

    if bearer_token(&request) == Some(expected.as_str()) {
        next.run(request).await
    } else {
        debug!(path = %request.uri().path(), "Rejected ingress request without valid token");
        StatusCode::UNAUTHORIZED.into_response()
    }
}

fn bearer_token(request: &Request<Body>) -> Option<&str> {
    let auth_str = request.headers().get("authorization")?.to_str().ok()?;
    Some(auth_str.strip_prefix("Bearer ").unwrap_or(auth_str))
}
