//! Authentication route handlers.
//!
//! Handles email/password login (with its optional MFA stage), standalone
//! MFA code submission, registration, and logout. Third-party sign-in lives
//! in `routes::oauth`.

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

use crate::clients::auth::OAuthProvider;
use crate::clients::types::RegisterRequest;
use crate::error::Result;
use crate::services::session::{LoginOutcome, SessionError, SessionService};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data. `mfa_code` is filled on the second stage of an
/// MFA-enabled login.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub mfa_code: Option<String>,
}

/// Standalone MFA code form data.
#[derive(Debug, Deserialize)]
pub struct MfaForm {
    pub code: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

// =============================================================================
// Query Types
// =============================================================================

/// Query parameters for error/success display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub notice: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template. `mfa_stage` switches the form to the 6-digit code
/// input after a login came back MFA-required.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub notice: Option<String>,
    pub mfa_stage: bool,
    pub email: String,
    pub google_url: String,
    pub github_url: String,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub error: Option<String>,
}

fn login_template(state: &AppState, error: Option<String>, notice: Option<String>) -> LoginTemplate {
    LoginTemplate {
        error,
        notice,
        mfa_stage: false,
        email: String::new(),
        google_url: state.auth().authorize_url(OAuthProvider::Google),
        github_url: state.auth().authorize_url(OAuthProvider::Github),
    }
}

/// Human-readable copy for the login error codes carried in the query string.
fn login_error_message(code: &str) -> String {
    match code {
        "credentials" => "Invalid email or password".to_string(),
        "mfa" => "Invalid MFA code".to_string(),
        "expired" => "Your sign-in session expired, please try again".to_string(),
        "invalid_session" => "Invalid sign-in session".to_string(),
        other => other.replace('_', " "),
    }
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
) -> impl IntoResponse {
    login_template(
        &state,
        query.error.as_deref().map(login_error_message),
        query.notice,
    )
}

/// Handle login form submission.
///
/// On MFA-required the page is re-rendered with the code stage; nothing is
/// persisted until the code checks out.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let service = SessionService::new(&session, state.auth());

    let mfa_code = form.mfa_code.as_deref().filter(|code| !code.is_empty());
    match service.login(&form.email, &form.password, mfa_code).await {
        Ok(LoginOutcome::Success(_)) => Ok(Redirect::to("/").into_response()),
        Ok(LoginOutcome::MfaRequired) => Ok(LoginTemplate {
            error: None,
            notice: None,
            mfa_stage: true,
            email: form.email,
            google_url: state.auth().authorize_url(OAuthProvider::Google),
            github_url: state.auth().authorize_url(OAuthProvider::Github),
        }
        .into_response()),
        Err(SessionError::InvalidCredentials) => {
            tracing::warn!("login failed: invalid credentials");
            Ok(Redirect::to("/auth/login?error=credentials").into_response())
        }
        Err(SessionError::InvalidMfaCode) => {
            tracing::warn!("login failed: invalid MFA code");
            Ok(Redirect::to("/auth/login?error=mfa").into_response())
        }
        Err(other) => Err(other.into()),
    }
}

/// Handle the standalone MFA code submission that completes an MFA-gated
/// login.
#[instrument(skip_all)]
pub async fn verify_mfa(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<MfaForm>,
) -> Result<Response> {
    let service = SessionService::new(&session, state.auth());

    match service.verify_mfa(&form.code).await {
        Ok(_) => Ok(Redirect::to("/").into_response()),
        Err(SessionError::InvalidMfaCode) => {
            // Keep the visitor on the code stage rather than restarting login.
            Ok(LoginTemplate {
                error: Some("Invalid MFA code".to_string()),
                notice: None,
                mfa_stage: true,
                email: String::new(),
                google_url: state.auth().authorize_url(OAuthProvider::Google),
                github_url: state.auth().authorize_url(OAuthProvider::Github),
            }
            .into_response())
        }
        Err(other) => Err(other.into()),
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(Query(query): Query<MessageQuery>) -> impl IntoResponse {
    RegisterTemplate {
        error: query.error.as_deref().map(register_error_message),
    }
}

fn register_error_message(code: &str) -> String {
    match code {
        "password_mismatch" => "Passwords do not match".to_string(),
        "password_too_short" => "Password must be at least 8 characters".to_string(),
        "email_taken" => "An account with this email already exists".to_string(),
        other => other.replace('_', " "),
    }
}

/// Handle registration form submission. On success the visitor is logged in
/// exactly as after a login.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    // Validate before submission: these never reach the service.
    if form.password != form.password_confirm {
        return Ok(Redirect::to("/auth/register?error=password_mismatch").into_response());
    }
    if form.password.len() < 8 {
        return Ok(Redirect::to("/auth/register?error=password_too_short").into_response());
    }

    let service = SessionService::new(&session, state.auth());
    let request = RegisterRequest {
        username: form.username,
        email: form.email,
        password: form.password,
    };

    match service.register(&request).await {
        Ok(_) => Ok(Redirect::to("/").into_response()),
        Err(e) => {
            tracing::warn!("registration failed: {e}");
            let error_msg = e.to_string();
            if error_msg.contains("taken") || error_msg.contains("already") {
                Ok(Redirect::to("/auth/register?error=email_taken").into_response())
            } else {
                Ok(Redirect::to("/auth/register?error=registration_failed").into_response())
            }
        }
    }
}

// =============================================================================
// Logout Route
// =============================================================================

/// Handle logout. Clears the persisted credentials unconditionally.
#[instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, session: Session) -> Response {
    let service = SessionService::new(&session, state.auth());
    service.logout().await;

    Redirect::to("/").into_response()
}
