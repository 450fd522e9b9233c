//! Authentication service client.
//!
//! Covers credential login, registration, TOTP multi-factor management, the
//! current-user endpoint, and the two third-party (OAuth2-style) verification
//! endpoints. The browser-facing half of the third-party flow is a plain
//! redirect to the service's authorization URL; see [`AuthClient::authorize_url`].

use std::sync::Arc;

use crate::clients::types::{
    LoginRequest, LoginResponse, MfaCodeRequest, MfaSetup, OAuth2MfaRequest, RegisterRequest,
};
use crate::clients::{ApiError, check};
use crate::models::UserRecord;

/// Third-party identity providers the authentication service can delegate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProvider {
    Google,
    Github,
}

impl OAuthProvider {
    /// Path segment of the service's authorization endpoint.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Github => "github",
        }
    }
}

/// Client for the authentication service.
#[derive(Clone)]
pub struct AuthClient {
    inner: Arc<AuthClientInner>,
}

struct AuthClientInner {
    client: reqwest::Client,
    base_url: String,
}

impl AuthClient {
    /// Create a new authentication service client.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            inner: Arc::new(AuthClientInner {
                client: reqwest::Client::new(),
                base_url: base_url.trim_end_matches('/').to_string(),
            }),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// The URL to redirect the browser to for third-party sign-in.
    ///
    /// The identity provider redirects back to the storefront's
    /// `/oauth2/callback` (or `/oauth2/mfa-verify`) with credentials in the
    /// query string.
    #[must_use]
    pub fn authorize_url(&self, provider: OAuthProvider) -> String {
        self.url(&format!("/oauth2/authorization/{}", provider.slug()))
    }

    /// Register a new account.
    ///
    /// On success the service answers like a login: token plus user record.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Service`] when the email is already taken or the
    /// form fails validation.
    pub async fn register(&self, request: &RegisterRequest) -> Result<LoginResponse, ApiError> {
        let response = self
            .inner
            .client
            .post(self.url("/api/auth/register"))
            .json(request)
            .send()
            .await?;

        Ok(check(response).await?.json().await?)
    }

    /// Login with email and password, optionally carrying an MFA code.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] on wrong credentials or a rejected
    /// MFA code.
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        let response = self
            .inner
            .client
            .post(self.url("/api/auth/login"))
            .json(request)
            .send()
            .await?;

        Ok(check(response).await?.json().await?)
    }

    /// Complete a standalone MFA check with a 6-digit code.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] when the code is rejected.
    pub async fn verify_mfa(&self, code: &str) -> Result<LoginResponse, ApiError> {
        let response = self
            .inner
            .client
            .post(self.url("/api/auth/verify-mfa"))
            .json(&MfaCodeRequest {
                code: code.to_string(),
            })
            .send()
            .await?;

        Ok(check(response).await?.json().await?)
    }

    /// Begin TOTP enrolment for the authenticated user.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] when the token is rejected.
    pub async fn setup_mfa(&self, token: &str) -> Result<MfaSetup, ApiError> {
        let response = self
            .inner
            .client
            .post(self.url("/api/auth/mfa/setup"))
            .bearer_auth(token)
            .send()
            .await?;

        Ok(check(response).await?.json().await?)
    }

    /// Activate MFA by confirming the first code from the authenticator app.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Service`] when the code does not match the secret.
    pub async fn enable_mfa(&self, token: &str, code: &str) -> Result<(), ApiError> {
        let response = self
            .inner
            .client
            .post(self.url("/api/auth/mfa/enable"))
            .bearer_auth(token)
            .json(&MfaCodeRequest {
                code: code.to_string(),
            })
            .send()
            .await?;

        check(response).await?;
        Ok(())
    }

    /// Deactivate MFA for the authenticated user.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] when the token is rejected.
    pub async fn disable_mfa(&self, token: &str) -> Result<(), ApiError> {
        let response = self
            .inner
            .client
            .post(self.url("/api/auth/mfa/disable"))
            .bearer_auth(token)
            .send()
            .await?;

        check(response).await?;
        Ok(())
    }

    /// Fetch the authoritative user record for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] for an expired or invalid token.
    pub async fn current_user(&self, token: &str) -> Result<UserRecord, ApiError> {
        let response = self
            .inner
            .client
            .get(self.url("/api/auth/me"))
            .bearer_auth(token)
            .send()
            .await?;

        Ok(check(response).await?.json().await?)
    }

    /// Complete a third-party sign-in MFA challenge.
    ///
    /// The short-lived `session_token` comes from the `/oauth2/mfa-verify`
    /// redirect; the service swaps it for a full session once the code checks
    /// out.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] when the challenge has expired.
    pub async fn verify_oauth2_mfa(
        &self,
        session_token: &str,
        code: &str,
    ) -> Result<LoginResponse, ApiError> {
        let response = self
            .inner
            .client
            .post(self.url("/api/auth/oauth2/verify-mfa"))
            .json(&OAuth2MfaRequest {
                session_token: session_token.to_string(),
                mfa_code: code.to_string(),
            })
            .send()
            .await?;

        Ok(check(response).await?.json().await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, bearer_token, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_login_posts_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .and(body_json(
                serde_json::json!({"email": "ana@example.com", "password": "hunter22"}),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token": "jwt-abc",
                "type": "Bearer",
                "mfaRequired": false,
                "user": {"email": "ana@example.com", "role": "USER"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = AuthClient::new(&server.uri());
        let response = client
            .login(&LoginRequest {
                email: "ana@example.com".to_string(),
                password: "hunter22".to_string(),
                mfa_code: None,
            })
            .await
            .unwrap();

        let (token, user) = response.into_session().unwrap();
        assert_eq!(token, "jwt-abc");
        assert_eq!(user.email.as_str(), "ana@example.com");
    }

    #[tokio::test]
    async fn test_current_user_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/auth/me"))
            .and(bearer_token("jwt-abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"email": "ana@example.com", "role": "ADMIN"}),
            ))
            .expect(1)
            .mount(&server)
            .await;

        let client = AuthClient::new(&server.uri());
        let user = client.current_user("jwt-abc").await.unwrap();
        assert!(user.role.is_admin());
    }

    #[tokio::test]
    async fn test_login_maps_401() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = AuthClient::new(&server.uri());
        let err = client
            .login(&LoginRequest {
                email: "ana@example.com".to_string(),
                password: "wrong".to_string(),
                mfa_code: None,
            })
            .await
            .unwrap_err();
        assert!(err.is_authorization_denied());
    }

    #[test]
    fn test_authorize_url() {
        let client = AuthClient::new("http://auth.internal:8081/");
        assert_eq!(
            client.authorize_url(OAuthProvider::Google),
            "http://auth.internal:8081/oauth2/authorization/google"
        );
        assert_eq!(
            client.authorize_url(OAuthProvider::Github),
            "http://auth.internal:8081/oauth2/authorization/github"
        );
    }
}
