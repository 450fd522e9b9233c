//! Session flow error types.

use thiserror::Error;

use crate::clients::ApiError;

/// Errors that can occur during session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Wrong email or password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The 6-digit MFA code was rejected.
    #[error("invalid MFA code")]
    InvalidMfaCode,

    /// The third-party MFA challenge exceeded its server-side window.
    #[error("third-party sign-in challenge expired")]
    ChallengeExpired,

    /// The third-party redirect carried a token but no user profile could be
    /// resolved, neither from the authentication service nor from fallback
    /// parameters. The token stays persisted; the user must not be treated
    /// as authenticated.
    #[error("no user data available after third-party sign-in")]
    NoUserData,

    /// Remote service call failed.
    #[error("auth service error: {0}")]
    Api(#[from] ApiError),

    /// The session store rejected a read or write.
    #[error("session store error: {0}")]
    Store(#[from] tower_sessions::session::Error),
}

impl SessionError {
    /// Whether this error carries an authorization-denied status that should
    /// trigger the global session clear.
    #[must_use]
    pub const fn is_authorization_denied(&self) -> bool {
        matches!(self, Self::Api(ApiError::Unauthorized))
    }
}
