//! Profile route handlers.
//!
//! Account overview plus TOTP multi-factor management: setup shows the
//! secret and otpauth URL from the authentication service, enable confirms
//! the first code, disable turns it off. The cached user record is
//! refreshed after every MFA change so the toggle reflects reality.

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

use crate::clients::types::MfaSetup;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::routes::auth::MessageQuery;
use crate::services::session::SessionService;
use crate::state::AppState;

/// MFA enrolment form data.
#[derive(Debug, Deserialize)]
pub struct MfaEnableForm {
    pub code: String,
}

/// TOTP enrolment display data.
#[derive(Clone)]
pub struct MfaSetupView {
    pub secret: String,
    pub qr_code_url: String,
}

impl From<MfaSetup> for MfaSetupView {
    fn from(setup: MfaSetup) -> Self {
        Self {
            secret: setup.secret,
            qr_code_url: setup.qr_code_url,
        }
    }
}

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "profile/show.html")]
pub struct ProfileTemplate {
    pub username: String,
    pub email: String,
    pub role: String,
    pub provider: String,
    pub mfa_enabled: bool,
    pub setup: Option<MfaSetupView>,
    pub error: Option<String>,
    pub notice: Option<String>,
}

fn profile_template(user: &crate::models::UserRecord) -> ProfileTemplate {
    ProfileTemplate {
        username: user.display_name().to_string(),
        email: user.email.to_string(),
        role: format!("{:?}", user.role).to_uppercase(),
        provider: user
            .provider
            .map(|p| p.to_string())
            .unwrap_or_else(|| "LOCAL".to_string()),
        mfa_enabled: user.mfa_enabled,
        setup: None,
        error: None,
        notice: None,
    }
}

/// Display the profile page, refreshing the cached user record first.
///
/// A refresh failure falls back to the cached record - the user is not
/// logged out - unless the service denied the token outright.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    session: Session,
    Query(query): Query<MessageQuery>,
) -> Result<Response> {
    let service = SessionService::new(&session, state.auth());

    let user = match service.refresh_current_user().await {
        Ok(user) => user,
        Err(e) if e.is_authorization_denied() => return Err(e.into()),
        Err(e) => {
            tracing::warn!("user refresh failed, serving cached record: {e}");
            auth.user
        }
    };

    let mut template = profile_template(&user);
    template.error = query.error.map(|code| match code.as_str() {
        "invalid_code" => "Invalid MFA code".to_string(),
        "setup_failed" => "Could not start MFA setup".to_string(),
        "disable_failed" => "Could not disable MFA".to_string(),
        other => other.replace('_', " "),
    });
    template.notice = query.notice.map(|code| match code.as_str() {
        "mfa_enabled" => "Two-factor authentication enabled".to_string(),
        "mfa_disabled" => "Two-factor authentication disabled".to_string(),
        other => other.replace('_', " "),
    });

    Ok(template.into_response())
}

/// Begin TOTP enrolment: render the profile page with secret and QR URL.
#[instrument(skip_all)]
pub async fn mfa_setup(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
) -> Result<Response> {
    match state.auth().setup_mfa(&auth.token).await {
        Ok(setup) => {
            let mut template = profile_template(&auth.user);
            template.setup = Some(MfaSetupView::from(setup));
            Ok(template.into_response())
        }
        Err(crate::clients::ApiError::Unauthorized) => {
            Err(crate::clients::ApiError::Unauthorized.into())
        }
        Err(e) => {
            tracing::warn!("MFA setup failed: {e}");
            Ok(Redirect::to("/profile?error=setup_failed").into_response())
        }
    }
}

/// Confirm the first authenticator code and activate MFA.
#[instrument(skip_all)]
pub async fn mfa_enable(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    session: Session,
    Form(form): Form<MfaEnableForm>,
) -> Result<Response> {
    match state.auth().enable_mfa(&auth.token, &form.code).await {
        Ok(()) => {
            refresh_cached_user(&state, &session).await;
            Ok(Redirect::to("/profile?notice=mfa_enabled").into_response())
        }
        Err(crate::clients::ApiError::Unauthorized) => {
            Err(crate::clients::ApiError::Unauthorized.into())
        }
        Err(e) => {
            tracing::warn!("MFA enable failed: {e}");
            Ok(Redirect::to("/profile?error=invalid_code").into_response())
        }
    }
}

/// Turn MFA off.
#[instrument(skip_all)]
pub async fn mfa_disable(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    session: Session,
) -> Result<Response> {
    match state.auth().disable_mfa(&auth.token).await {
        Ok(()) => {
            refresh_cached_user(&state, &session).await;
            Ok(Redirect::to("/profile?notice=mfa_disabled").into_response())
        }
        Err(crate::clients::ApiError::Unauthorized) => {
            Err(crate::clients::ApiError::Unauthorized.into())
        }
        Err(e) => {
            tracing::warn!("MFA disable failed: {e}");
            Ok(Redirect::to("/profile?error=disable_failed").into_response())
        }
    }
}

/// Best-effort refresh of the cached user record after an MFA change.
async fn refresh_cached_user(state: &AppState, session: &Session) {
    let service = SessionService::new(session, state.auth());
    if let Err(e) = service.refresh_current_user().await {
        tracing::warn!("user refresh after MFA change failed: {e}");
    }
}
