//! Session manager.
//!
//! Owns login/logout/registration/refresh and the two-factor and third-party
//! challenge flows on top of the persisted session store and the
//! authentication service client.
//!
//! Persistence is write-through: every mutation calls `Session::save` before
//! returning, so the store is never behind the in-memory state observable by
//! the caller.

mod error;

pub use error::SessionError;

use std::time::Duration;

use tower_sessions::Session;
use tracing::instrument;

use copperleaf_core::{AuthProvider, Email, Role};

use crate::clients::AuthClient;
use crate::clients::types::{LoginRequest, RegisterRequest};
use crate::clients::ApiError;
use crate::models::{UserRecord, session_keys};

/// Outcome of a login attempt.
#[derive(Debug)]
pub enum LoginOutcome {
    /// Token and user persisted; the session is live.
    Success(UserRecord),
    /// The account requires a 6-digit code; nothing was persisted. The
    /// caller must re-invoke with the code once obtained.
    MfaRequired,
}

/// Outcome of the third-party profile resolution ladder.
///
/// One tagged value instead of nested conditionals so each branch is
/// independently testable.
#[derive(Debug)]
pub enum ProfileResolution {
    /// Authoritative profile fetched from the authentication service.
    Resolved(UserRecord),
    /// Profile synthesized from redirect fallback parameters; an
    /// approximation corrected by the next authoritative fetch.
    Fallback(UserRecord),
    /// Neither a profile nor fallback data was available.
    Failed,
}

/// Retry schedule for the third-party profile fetch: `max_attempts` total
/// attempts with exponential backoff between them (no delay before the
/// first attempt, none after the last).
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    /// 3 attempts with 1s, 2s (, 4s) waits - the schedule the identity
    /// handoff was tuned for.
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// A single attempt, no waiting. Used by tests and health probes.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
        }
    }

    /// Delay to sleep after the given 1-based attempt, or `None` when no
    /// further attempt follows.
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        Some(self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

/// Session manager bound to one request's session and the authentication
/// service.
pub struct SessionService<'a> {
    session: &'a Session,
    auth: &'a AuthClient,
}

impl<'a> SessionService<'a> {
    /// Create a new session service.
    #[must_use]
    pub const fn new(session: &'a Session, auth: &'a AuthClient) -> Self {
        Self { session, auth }
    }

    // =========================================================================
    // Persisted state
    // =========================================================================

    /// The persisted bearer token, if any.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Store` if the session store is unreachable.
    pub async fn token(&self) -> Result<Option<String>, SessionError> {
        Ok(self.session.get(session_keys::TOKEN).await?)
    }

    /// The cached user record, if any.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Store` if the session store is unreachable.
    pub async fn current_user(&self) -> Result<Option<UserRecord>, SessionError> {
        Ok(self.session.get(session_keys::CURRENT_USER).await?)
    }

    /// Whether a bearer token is present.
    pub async fn is_authenticated(&self) -> bool {
        self.token().await.ok().flatten().is_some()
    }

    /// Whether the cached user carries the ADMIN role.
    pub async fn is_admin(&self) -> bool {
        self.current_user()
            .await
            .ok()
            .flatten()
            .is_some_and(|user| user.role.is_admin())
    }

    /// Persist token and user together and flush to the store.
    ///
    /// The pair is never left half-written: both keys are inserted before
    /// the save.
    async fn save_credentials(&self, token: &str, user: &UserRecord) -> Result<(), SessionError> {
        self.session.insert(session_keys::TOKEN, token).await?;
        self.session.insert(session_keys::CURRENT_USER, user).await?;
        self.session.save().await?;
        Ok(())
    }

    // =========================================================================
    // Credential flows
    // =========================================================================

    /// Login with email and password, optionally carrying an MFA code.
    ///
    /// On [`LoginOutcome::MfaRequired`] nothing is persisted; the caller
    /// re-invokes with the code (or completes via [`Self::verify_mfa`]).
    ///
    /// # Errors
    ///
    /// `InvalidCredentials` or `InvalidMfaCode` surfaced from the service.
    #[instrument(skip_all, fields(email = %email))]
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        mfa_code: Option<&str>,
    ) -> Result<LoginOutcome, SessionError> {
        let response = self
            .auth
            .login(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
                mfa_code: mfa_code.map(str::to_string),
            })
            .await
            .map_err(|e| match e {
                ApiError::Unauthorized if mfa_code.is_some() => SessionError::InvalidMfaCode,
                ApiError::Unauthorized => SessionError::InvalidCredentials,
                other => SessionError::Api(other),
            })?;

        if response.mfa_required {
            tracing::debug!("MFA required, deferring session creation");
            return Ok(LoginOutcome::MfaRequired);
        }

        let Some((token, user)) = response.into_session() else {
            tracing::warn!("login response carried neither session nor MFA indicator");
            return Err(SessionError::InvalidCredentials);
        };

        self.save_credentials(&token, &user).await?;
        Ok(LoginOutcome::Success(user))
    }

    /// Complete a standalone MFA check with a 6-digit code and persist the
    /// resulting session.
    ///
    /// # Errors
    ///
    /// Returns `InvalidMfaCode` when the service rejects the code.
    #[instrument(skip_all)]
    pub async fn verify_mfa(&self, code: &str) -> Result<UserRecord, SessionError> {
        let response = self.auth.verify_mfa(code).await.map_err(|e| match e {
            ApiError::Unauthorized | ApiError::Service { .. } => SessionError::InvalidMfaCode,
            other => SessionError::Api(other),
        })?;

        let Some((token, user)) = response.into_session() else {
            return Err(SessionError::InvalidMfaCode);
        };

        self.save_credentials(&token, &user).await?;
        Ok(user)
    }

    /// Register a new account. On success behaves identically to login.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Api` when the email is taken or the form is
    /// rejected.
    #[instrument(skip_all, fields(email = %request.email))]
    pub async fn register(&self, request: &RegisterRequest) -> Result<UserRecord, SessionError> {
        let response = self.auth.register(request).await?;

        let Some((token, user)) = response.into_session() else {
            tracing::warn!("register response carried no session");
            return Err(SessionError::InvalidCredentials);
        };

        self.save_credentials(&token, &user).await?;
        Ok(user)
    }

    /// Clear the persisted credentials unconditionally. The anonymous cart
    /// survives. Store failures are logged, not surfaced - logout has no
    /// failure mode.
    #[instrument(skip_all)]
    pub async fn logout(&self) {
        if let Err(e) = self.session.remove::<String>(session_keys::TOKEN).await {
            tracing::error!("failed to remove token on logout: {e}");
        }
        if let Err(e) = self
            .session
            .remove::<UserRecord>(session_keys::CURRENT_USER)
            .await
        {
            tracing::error!("failed to remove user on logout: {e}");
        }
        if let Err(e) = self.session.save().await {
            tracing::error!("failed to persist logout: {e}");
        }
    }

    /// Re-fetch the user record from the authentication service and replace
    /// the cached copy. On failure the existing cached state is left
    /// untouched and the error reported - the user is not logged out.
    ///
    /// # Errors
    ///
    /// Returns the service error; `ApiError::Unauthorized` when no token is
    /// persisted.
    #[instrument(skip_all)]
    pub async fn refresh_current_user(&self) -> Result<UserRecord, SessionError> {
        let token = self.token().await?.ok_or(ApiError::Unauthorized)?;
        let user = self.auth.current_user(&token).await?;

        self.session
            .insert(session_keys::CURRENT_USER, &user)
            .await?;
        self.session.save().await?;
        Ok(user)
    }

    // =========================================================================
    // Third-party (OAuth2-style) flows
    // =========================================================================

    /// Complete a third-party redirect carrying a bearer token and an
    /// optional username/email fallback pair.
    ///
    /// The token is persisted immediately so subsequent authenticated calls
    /// succeed even if profile resolution fails. The profile is then
    /// resolved via [`resolve_profile`]; see [`ProfileResolution`] for the
    /// ladder.
    ///
    /// # Errors
    ///
    /// Returns `NoUserData` when no profile and no fallback pair is
    /// available; the token stays persisted but callers must treat the user
    /// as requiring re-login.
    #[instrument(skip_all)]
    pub async fn complete_oauth_redirect(
        &self,
        token: &str,
        fallback_username: Option<&str>,
        fallback_email: Option<&str>,
        policy: RetryPolicy,
    ) -> Result<UserRecord, SessionError> {
        // Save token first: later steps may fail, the token must not be lost.
        self.session.insert(session_keys::TOKEN, token).await?;
        self.session.save().await?;

        let resolution =
            resolve_profile(self.auth, token, fallback_username, fallback_email, policy).await;

        match resolution {
            ProfileResolution::Resolved(user) | ProfileResolution::Fallback(user) => {
                self.session
                    .insert(session_keys::CURRENT_USER, &user)
                    .await?;
                self.session.save().await?;
                Ok(user)
            }
            ProfileResolution::Failed => {
                tracing::error!("no user data available after third-party sign-in");
                Err(SessionError::NoUserData)
            }
        }
    }

    /// Complete a third-party MFA challenge and persist the resulting
    /// session.
    ///
    /// # Errors
    ///
    /// `ChallengeExpired` when the server-side window lapsed,
    /// `InvalidMfaCode` when the code is rejected.
    #[instrument(skip_all)]
    pub async fn complete_oauth_mfa(
        &self,
        session_token: &str,
        code: &str,
    ) -> Result<UserRecord, SessionError> {
        let response = self
            .auth
            .verify_oauth2_mfa(session_token, code)
            .await
            .map_err(|e| match e {
                // Expiry is only learned from the service's rejection.
                ApiError::Unauthorized => SessionError::ChallengeExpired,
                ApiError::Service { message, .. } if message.to_lowercase().contains("expired") => {
                    SessionError::ChallengeExpired
                }
                ApiError::Service { .. } | ApiError::NotFound(_) => SessionError::InvalidMfaCode,
                other => SessionError::Api(other),
            })?;

        let Some((token, user)) = response.into_session() else {
            return Err(SessionError::InvalidMfaCode);
        };

        self.save_credentials(&token, &user).await?;
        Ok(user)
    }
}

/// Fetch the authoritative profile, retrying per the policy.
async fn fetch_user_with_retry(
    auth: &AuthClient,
    token: &str,
    policy: RetryPolicy,
) -> Result<UserRecord, ApiError> {
    let mut attempt = 1;
    loop {
        match auth.current_user(token).await {
            Ok(user) => return Ok(user),
            Err(e) => {
                tracing::warn!(attempt, "profile fetch failed: {e}");
                match policy.delay_after(attempt) {
                    Some(delay) => tokio::time::sleep(delay).await,
                    None => return Err(e),
                }
            }
        }
        attempt += 1;
    }
}

/// The "fetch, else fallback, else fail" ladder of the third-party redirect
/// protocol.
pub async fn resolve_profile(
    auth: &AuthClient,
    token: &str,
    fallback_username: Option<&str>,
    fallback_email: Option<&str>,
    policy: RetryPolicy,
) -> ProfileResolution {
    if let Ok(user) = fetch_user_with_retry(auth, token, policy).await {
        return ProfileResolution::Resolved(user);
    }

    match (fallback_username, fallback_email) {
        (Some(username), Some(email)) => match Email::parse(email) {
            Ok(email) => ProfileResolution::Fallback(UserRecord {
                id: None,
                email,
                username: Some(username.to_string()),
                role: Role::User,
                // Corrected by the next authoritative /api/auth/me fetch.
                provider: Some(AuthProvider::Google),
                mfa_enabled: false,
                email_verified: Some(true),
            }),
            Err(e) => {
                tracing::warn!("fallback email rejected: {e}");
                ProfileResolution::Failed
            }
        },
        _ => ProfileResolution::Failed,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tower_sessions::{MemoryStore, Session};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn full_session_body(token: &str) -> serde_json::Value {
        serde_json::json!({
            "token": token,
            "type": "Bearer",
            "mfaRequired": false,
            "user": {"email": "ana@example.com", "username": "ana", "role": "USER"}
        })
    }

    #[tokio::test]
    async fn test_login_persists_token_and_user_together() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(full_session_body("jwt-abc")))
            .mount(&server)
            .await;

        let auth = AuthClient::new(&server.uri());
        let session = test_session();
        let service = SessionService::new(&session, &auth);

        let outcome = service.login("ana@example.com", "hunter22", None).await.unwrap();
        assert!(matches!(outcome, LoginOutcome::Success(_)));

        assert_eq!(service.token().await.unwrap().as_deref(), Some("jwt-abc"));
        assert!(service.current_user().await.unwrap().is_some());
        assert!(service.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_login_mfa_required_persists_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"mfaRequired": true})),
            )
            .mount(&server)
            .await;

        let auth = AuthClient::new(&server.uri());
        let session = test_session();
        let service = SessionService::new(&session, &auth);

        let outcome = service.login("ana@example.com", "hunter22", None).await.unwrap();
        assert!(matches!(outcome, LoginOutcome::MfaRequired));

        assert!(service.token().await.unwrap().is_none());
        assert!(service.current_user().await.unwrap().is_none());
        assert!(!service.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_login_invalid_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let auth = AuthClient::new(&server.uri());
        let session = test_session();
        let service = SessionService::new(&session, &auth);

        let err = service
            .login("ana@example.com", "wrong", None)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_verify_mfa_completes_pending_login() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/verify-mfa"))
            .respond_with(ResponseTemplate::new(200).set_body_json(full_session_body("jwt-mfa")))
            .mount(&server)
            .await;

        let auth = AuthClient::new(&server.uri());
        let session = test_session();
        let service = SessionService::new(&session, &auth);

        let user = service.verify_mfa("123456").await.unwrap();
        assert_eq!(user.email.as_str(), "ana@example.com");
        assert_eq!(service.token().await.unwrap().as_deref(), Some("jwt-mfa"));
    }

    #[tokio::test]
    async fn test_logout_clears_credentials_but_keeps_cart() {
        let session = test_session();
        session.insert(session_keys::TOKEN, "jwt-abc").await.unwrap();
        session
            .insert(session_keys::CART, serde_json::json!([]))
            .await
            .unwrap();

        let auth = AuthClient::new("http://localhost:1");
        let service = SessionService::new(&session, &auth);
        service.logout().await;

        assert!(!service.is_authenticated().await);
        let cart: Option<serde_json::Value> = session.get(session_keys::CART).await.unwrap();
        assert!(cart.is_some());
    }

    #[tokio::test]
    async fn test_refresh_failure_leaves_cached_user_untouched() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/auth/me"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let auth = AuthClient::new(&server.uri());
        let session = test_session();
        let service = SessionService::new(&session, &auth);

        let cached = UserRecord {
            id: None,
            email: Email::parse("ana@example.com").unwrap(),
            username: Some("ana".to_string()),
            role: Role::User,
            provider: None,
            mfa_enabled: false,
            email_verified: None,
        };
        session.insert(session_keys::TOKEN, "jwt-abc").await.unwrap();
        session
            .insert(session_keys::CURRENT_USER, &cached)
            .await
            .unwrap();

        assert!(service.refresh_current_user().await.is_err());
        assert_eq!(service.current_user().await.unwrap(), Some(cached));
    }

    #[tokio::test]
    async fn test_retry_policy_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1), Some(Duration::from_secs(1)));
        assert_eq!(policy.delay_after(2), Some(Duration::from_secs(2)));
        assert_eq!(policy.delay_after(3), None);

        assert_eq!(RetryPolicy::no_retry().delay_after(1), None);
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_oauth_redirect_resolves_after_transient_failure() {
        let server = MockServer::start().await;
        // First attempt fails, second succeeds, no third request is made.
        Mock::given(method("GET"))
            .and(path("/api/auth/me"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/auth/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"email": "ana@example.com", "role": "USER", "provider": "GITHUB"}),
            ))
            .expect(1)
            .mount(&server)
            .await;

        let auth = AuthClient::new(&server.uri());
        let session = test_session();
        let service = SessionService::new(&session, &auth);

        let user = service
            .complete_oauth_redirect("oauth-jwt", None, None, fast_policy())
            .await
            .unwrap();
        assert_eq!(user.provider, Some(copperleaf_core::AuthProvider::Github));
        assert_eq!(service.token().await.unwrap().as_deref(), Some("oauth-jwt"));
    }

    #[tokio::test]
    async fn test_oauth_redirect_synthesizes_fallback_profile() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/auth/me"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3) // all attempts exhausted
            .mount(&server)
            .await;

        let auth = AuthClient::new(&server.uri());
        let session = test_session();
        let service = SessionService::new(&session, &auth);

        let user = service
            .complete_oauth_redirect("oauth-jwt", Some("ana"), Some("ana@example.com"), fast_policy())
            .await
            .unwrap();

        assert_eq!(user.username.as_deref(), Some("ana"));
        assert_eq!(user.provider, Some(AuthProvider::Google));
        assert!(!user.mfa_enabled);
        assert_eq!(user.role, Role::User);
        assert!(user.id.is_none());
    }

    #[tokio::test]
    async fn test_oauth_redirect_no_user_data_keeps_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/auth/me"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let auth = AuthClient::new(&server.uri());
        let session = test_session();
        let service = SessionService::new(&session, &auth);

        let err = service
            .complete_oauth_redirect("oauth-jwt", None, None, fast_policy())
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::NoUserData));

        // Token persisted per protocol step 1, but no user for display.
        assert_eq!(service.token().await.unwrap().as_deref(), Some("oauth-jwt"));
        assert!(service.current_user().await.unwrap().is_none());
        assert!(!service.is_admin().await);
    }

    #[tokio::test]
    async fn test_oauth_mfa_expired_challenge() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/oauth2/verify-mfa"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let auth = AuthClient::new(&server.uri());
        let session = test_session();
        let service = SessionService::new(&session, &auth);

        let err = service
            .complete_oauth_mfa("stale-challenge", "123456")
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::ChallengeExpired));
    }

    #[tokio::test]
    async fn test_oauth_mfa_invalid_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/oauth2/verify-mfa"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(serde_json::json!({"message": "Invalid MFA code"})),
            )
            .mount(&server)
            .await;

        let auth = AuthClient::new(&server.uri());
        let session = test_session();
        let service = SessionService::new(&session, &auth);

        let err = service
            .complete_oauth_mfa("challenge", "000000")
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidMfaCode));
    }

    #[tokio::test]
    async fn test_session_rehydrates_from_store() {
        let store = Arc::new(MemoryStore::default());
        let session = Session::new(None, store.clone(), None);
        session.insert(session_keys::TOKEN, "jwt-abc").await.unwrap();
        session.save().await.unwrap();
        let id = session.id();

        // A fresh Session over the same store sees the persisted state.
        let rehydrated = Session::new(id, store, None);
        let token: Option<String> = rehydrated.get(session_keys::TOKEN).await.unwrap();
        assert_eq!(token.as_deref(), Some("jwt-abc"));
    }
}
