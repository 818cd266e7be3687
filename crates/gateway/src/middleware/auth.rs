//! Authentication middleware.

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::Response,
};

use common::AppError;

use crate::state::AppState;

/// Runs the auth gate and, on success, attaches the
/// [`AuthenticatedContext`](auth_service_lib::gate::AuthenticatedContext)
/// to the request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let context = state.auth_gate.authorize(header)?;
    tracing::debug!(user_id = %context.subject_id, "Request authenticated");

    request.extensions_mut().insert(context);

    Ok(next.run(request).await)
}
