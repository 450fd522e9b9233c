//! Global authorization-denied handling.
//!
//! Any backend call that comes back authorization-denied surfaces as a 401
//! response from the handler. This middleware watches for those, clears the
//! persisted credentials, and sends the visitor to the login page - except
//! when the request already targets the login page, which would loop.

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{UserRecord, session_keys};

/// Path prefix on which the auto-redirect is suppressed.
const LOGIN_PATH: &str = "/auth/login";

/// Middleware: on a 401 response, clear the session credentials and redirect
/// to the login entry point (unless already there).
pub async fn authorization_guard(session: Session, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let response = next.run(request).await;

    if response.status() != StatusCode::UNAUTHORIZED {
        return response;
    }

    tracing::warn!(%path, "authorization denied by a backend service, clearing session");
    clear_credentials(&session).await;

    // Redirect only if we're not already on the login page, to avoid loops.
    if path.starts_with(LOGIN_PATH) {
        return response;
    }

    Redirect::to(LOGIN_PATH).into_response()
}

async fn clear_credentials(session: &Session) {
    if let Err(e) = session.remove::<String>(session_keys::TOKEN).await {
        tracing::error!("failed to remove token: {e}");
    }
    if let Err(e) = session.remove::<UserRecord>(session_keys::CURRENT_USER).await {
        tracing::error!("failed to remove user: {e}");
    }
    if let Err(e) = session.save().await {
        tracing::error!("failed to persist session clear: {e}");
    }
}
