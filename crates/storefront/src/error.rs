//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Authorization-denied responses (401) are deliberately passed through as
//! plain status codes: the `authorization_guard` middleware turns them into
//! a session clear plus a redirect to the login page.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::clients::ApiError;
use crate::services::cart::CartError;
use crate::services::session::SessionError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Session flow operation failed.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Remote service call failed.
    #[error("Service error: {0}")]
    Api(#[from] ApiError),

    /// Form input rejected before submission.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Visitor is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether this error is an authorization-denied response from a backend
    /// service (or a missing local session).
    #[must_use]
    pub const fn is_authorization_denied(&self) -> bool {
        matches!(
            self,
            Self::Api(ApiError::Unauthorized)
                | Self::Session(SessionError::Api(ApiError::Unauthorized))
                | Self::Unauthorized(_)
        )
    }

    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Internal(_)
                | Self::Cart(CartError::Store(_))
                | Self::Session(SessionError::Store(_))
                | Self::Api(ApiError::Http(_) | ApiError::Service { .. })
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server-side failures to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = if self.is_authorization_denied() {
            StatusCode::UNAUTHORIZED
        } else {
            match &self {
                Self::Session(err) => match err {
                    SessionError::InvalidCredentials
                    | SessionError::InvalidMfaCode
                    | SessionError::ChallengeExpired
                    | SessionError::NoUserData => StatusCode::UNAUTHORIZED,
                    SessionError::Api(inner) => api_status(inner),
                    SessionError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
                },
                Self::Api(err) => api_status(err),
                Self::Cart(CartError::Store(_)) | Self::Internal(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
                Self::NotFound(_) => StatusCode::NOT_FOUND,
                Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            }
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Cart(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Api(_) => "External service error".to_string(),
            Self::Session(err) => match err {
                SessionError::InvalidCredentials => "Invalid credentials".to_string(),
                SessionError::InvalidMfaCode => "Invalid MFA code".to_string(),
                SessionError::ChallengeExpired => {
                    "Session expired, please sign in again".to_string()
                }
                SessionError::NoUserData => {
                    "Could not load your account, please sign in again".to_string()
                }
                SessionError::Api(_) => "External service error".to_string(),
                SessionError::Store(_) => "Internal server error".to_string(),
            },
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}

const fn api_status(err: &ApiError) -> StatusCode {
    match err {
        ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
        ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        ApiError::Http(_) | ApiError::Service { .. } => StatusCode::BAD_GATEWAY,
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::Validation("shipping address is required".to_string());
        assert_eq!(
            err.to_string(),
            "Validation failed: shipping address is required"
        );
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Validation("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_authorization_denied_maps_to_401() {
        let err = AppError::Api(ApiError::Unauthorized);
        assert!(err.is_authorization_denied());
        assert_eq!(get_status(err), StatusCode::UNAUTHORIZED);

        let err = AppError::Session(SessionError::Api(ApiError::Unauthorized));
        assert!(err.is_authorization_denied());
        assert_eq!(get_status(err), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_service_errors_map_to_bad_gateway() {
        let err = AppError::Api(ApiError::Service {
            status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            message: "boom".to_string(),
        });
        assert_eq!(get_status(err), StatusCode::BAD_GATEWAY);
    }
}
