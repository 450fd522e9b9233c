//! Authentication middleware and extractors.
//!
//! Provides extractors for requiring an authenticated (or administrator)
//! visitor in route handlers. The session manager persists token and user
//! together; both must be present for a request to count as authenticated.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{UserRecord, session_keys};

/// The authenticated visitor: cached user record plus the bearer token to
/// attach to remote service calls.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub user: UserRecord,
    pub token: String,
}

/// Extractor that requires an authenticated visitor.
///
/// If the visitor is not logged in, returns a redirect to the login page.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(auth): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", auth.user.display_name())
/// }
/// ```
pub struct RequireAuth(pub Authenticated);

/// Error returned when authentication is required but the visitor is not
/// logged in.
pub enum AuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

async fn authenticated_from_session(session: &Session) -> Option<Authenticated> {
    let token: String = session.get(session_keys::TOKEN).await.ok().flatten()?;
    let user: UserRecord = session.get(session_keys::CURRENT_USER).await.ok().flatten()?;
    Some(Authenticated { user, token })
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::Unauthorized)?;

        let authenticated = authenticated_from_session(session).await.ok_or_else(|| {
            // Check if this is an API request
            if parts.uri.path().starts_with("/api/") {
                AuthRejection::Unauthorized
            } else {
                AuthRejection::RedirectToLogin
            }
        })?;

        Ok(Self(authenticated))
    }
}

/// Extractor that requires an administrator.
///
/// Non-admin visitors are sent back to the home page; anonymous visitors to
/// the login page.
pub struct RequireAdmin(pub Authenticated);

/// Error returned when the administrative panel is requested without the
/// ADMIN role.
pub enum AdminRejection {
    /// Not logged in at all.
    Auth(AuthRejection),
    /// Logged in, but not an administrator.
    RedirectHome,
}

impl IntoResponse for AdminRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Auth(rejection) => rejection.into_response(),
            Self::RedirectHome => Redirect::to("/").into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AdminRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireAuth(authenticated) = RequireAuth::from_request_parts(parts, state)
            .await
            .map_err(AdminRejection::Auth)?;

        if !authenticated.user.role.is_admin() {
            return Err(AdminRejection::RedirectHome);
        }

        Ok(Self(authenticated))
    }
}

/// Extractor that optionally gets the current visitor.
///
/// Unlike `RequireAuth`, this does not reject the request if the visitor is
/// not logged in. Used by the navbar and other shared chrome.
pub struct OptionalAuth(pub Option<Authenticated>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let authenticated = match parts.extensions.get::<Session>() {
            Some(session) => authenticated_from_session(session).await,
            None => None,
        };

        Ok(Self(authenticated))
    }
}
