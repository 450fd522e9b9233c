//! Third-party sign-in route handlers.
//!
//! The identity provider redirects the browser back to the storefront:
//! - `/oauth2/callback` carries a bearer token and optionally a
//!   username/email fallback pair
//! - `/oauth2/mfa-verify` carries a short-lived session token and email when
//!   the account has MFA enabled
//!
//! The callback runs the token-first/retry/fallback protocol in
//! `services::session`; failure must never silently authenticate the user.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::services::session::{SessionError, SessionService};
use crate::state::AppState;

// =============================================================================
// Query Types
// =============================================================================

/// Query parameters on the identity-provider callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    /// Bearer token for the authenticated identity.
    pub token: Option<String>,
    /// Fallback username, in case the profile fetch fails.
    pub username: Option<String>,
    /// Fallback email, in case the profile fetch fails.
    pub email: Option<String>,
}

/// Query parameters on the third-party MFA challenge page.
#[derive(Debug, Deserialize)]
pub struct MfaVerifyQuery {
    #[serde(rename = "sessionToken")]
    pub session_token: Option<String>,
    pub email: Option<String>,
}

/// Third-party MFA challenge form. The ephemeral challenge rides along as
/// hidden fields; it is never written to the session store.
#[derive(Debug, Deserialize)]
pub struct MfaVerifyForm {
    pub session_token: String,
    pub email: String,
    pub code: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Sign-in failure page with a retry-to-login affordance.
#[derive(Template, WebTemplate)]
#[template(path = "oauth/error.html")]
pub struct OAuthErrorTemplate {
    pub message: String,
}

/// Third-party MFA challenge page.
#[derive(Template, WebTemplate)]
#[template(path = "oauth/mfa_verify.html")]
pub struct OAuthMfaTemplate {
    pub email: String,
    pub session_token: String,
    pub error: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle the identity-provider callback.
///
/// On success control goes back to the default authenticated landing page.
/// On `NoUserData` the token stays persisted but the visitor is shown a
/// failure page and must sign in again.
#[instrument(skip_all)]
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Result<Response> {
    let Some(token) = query.token else {
        tracing::warn!("third-party callback missing token");
        return Ok(OAuthErrorTemplate {
            message: "Sign-in token not found".to_string(),
        }
        .into_response());
    };

    let service = SessionService::new(&session, state.auth());
    match service
        .complete_oauth_redirect(
            &token,
            query.username.as_deref(),
            query.email.as_deref(),
            state.oauth_retry(),
        )
        .await
    {
        Ok(_) => Ok(Redirect::to("/").into_response()),
        Err(SessionError::NoUserData) => Ok(OAuthErrorTemplate {
            message: "Could not load your account information".to_string(),
        }
        .into_response()),
        Err(other) => Err(other.into()),
    }
}

/// Display the third-party MFA challenge page.
#[instrument(skip_all)]
pub async fn mfa_verify_page(Query(query): Query<MfaVerifyQuery>) -> Response {
    let (Some(session_token), Some(email)) = (query.session_token, query.email) else {
        tracing::warn!("third-party MFA page missing challenge parameters");
        return Redirect::to("/auth/login?error=invalid_session").into_response();
    };

    OAuthMfaTemplate {
        email,
        session_token,
        error: None,
    }
    .into_response()
}

/// Handle the third-party MFA challenge submission.
///
/// The challenge expires server-side after about five minutes; expiry is
/// only learned from the rejection and sends the visitor back to login.
#[instrument(skip_all)]
pub async fn mfa_verify(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<MfaVerifyForm>,
) -> Result<Response> {
    if form.code.len() != 6 || !form.code.chars().all(|c| c.is_ascii_digit()) {
        return Ok(OAuthMfaTemplate {
            email: form.email,
            session_token: form.session_token,
            error: Some("The code must be 6 digits".to_string()),
        }
        .into_response());
    }

    let service = SessionService::new(&session, state.auth());
    match service.complete_oauth_mfa(&form.session_token, &form.code).await {
        Ok(_) => Ok(Redirect::to("/").into_response()),
        Err(SessionError::ChallengeExpired) => {
            tracing::warn!("third-party MFA challenge expired");
            Ok(Redirect::to("/auth/login?error=expired").into_response())
        }
        Err(SessionError::InvalidMfaCode) => Ok(OAuthMfaTemplate {
            email: form.email,
            session_token: form.session_token,
            error: Some("Invalid MFA code".to_string()),
        }
        .into_response()),
        Err(other) => Err(other.into()),
    }
}
