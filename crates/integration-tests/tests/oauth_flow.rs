//! Third-party redirect protocol through the full router: token-first
//! persistence, retry with backoff, fallback synthesis, and the MFA
//! challenge path.

use std::time::{Duration, Instant};

use copperleaf_integration_tests::{TestApp, body_string, login_session_body};
use copperleaf_storefront::services::session::RetryPolicy;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

fn me_body() -> serde_json::Value {
    serde_json::json!({
        "email": "ana@example.com",
        "username": "ana",
        "provider": "GITHUB",
        "role": "USER",
        "mfaEnabled": false
    })
}

#[tokio::test]
async fn callback_uses_authoritative_profile_after_one_transient_failure() {
    let app = TestApp::spawn_with_retry(RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(200),
    })
    .await;

    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&app.auth)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(me_body()))
        .expect(1) // success on attempt 2, no third attempt
        .mount(&app.auth)
        .await;

    let started = Instant::now();
    let response = app.get("/oauth2/callback?token=oauth-jwt", None).await;
    let elapsed = started.elapsed();

    assert!(response.status().is_redirection());
    assert_eq!(TestApp::location(&response).as_deref(), Some("/"));
    assert!(TestApp::session_cookie(&response).is_some());

    // One backoff interval was waited, and only one.
    assert!(elapsed >= Duration::from_millis(200), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_millis(700), "elapsed {elapsed:?}");
}

#[tokio::test]
async fn callback_synthesizes_profile_from_fallback_params() {
    let app = TestApp::spawn().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&app.auth)
        .await;

    let response = app
        .get(
            "/oauth2/callback?token=oauth-jwt&username=ana&email=ana%40example.com",
            None,
        )
        .await;

    assert!(response.status().is_redirection());
    assert_eq!(TestApp::location(&response).as_deref(), Some("/"));
    let cookie = TestApp::session_cookie(&response).expect("session cookie set");

    // The synthesized record is served (profile refresh fails and falls back
    // to the cached copy).
    let profile = app.get("/profile", Some(&cookie)).await;
    assert_eq!(profile.status(), 200);
    let html = body_string(profile).await;
    assert!(html.contains("ana@example.com"));
}

#[tokio::test]
async fn callback_with_no_profile_and_no_fallback_fails_visibly() {
    let app = TestApp::spawn().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3) // all attempts exhausted
        .mount(&app.auth)
        .await;

    let response = app.get("/oauth2/callback?token=oauth-jwt", None).await;

    // Never a silent authentication: the failure page offers retry-to-login.
    assert_eq!(response.status(), 200);
    let cookie = TestApp::session_cookie(&response);
    let html = body_string(response).await;
    assert!(html.contains("Could not load your account information"));
    assert!(html.contains("/auth/login"));

    // The token was persisted (protocol step 1), but without a user record
    // the visitor stays unauthenticated for protected pages.
    let orders = app.get("/orders", cookie.as_deref()).await;
    assert!(orders.status().is_redirection());
    assert_eq!(TestApp::location(&orders).as_deref(), Some("/auth/login"));
}

#[tokio::test]
async fn callback_without_token_shows_failure_page() {
    let app = TestApp::spawn().await;

    let response = app.get("/oauth2/callback", None).await;
    assert_eq!(response.status(), 200);
    let html = body_string(response).await;
    assert!(html.contains("Sign-in token not found"));
}

#[tokio::test]
async fn mfa_challenge_page_requires_both_parameters() {
    let app = TestApp::spawn().await;

    let response = app.get("/oauth2/mfa-verify?email=ana%40example.com", None).await;
    assert!(response.status().is_redirection());
    assert_eq!(
        TestApp::location(&response).as_deref(),
        Some("/auth/login?error=invalid_session")
    );
}

#[tokio::test]
async fn mfa_challenge_completion_creates_the_session() {
    let app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/oauth2/verify-mfa"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(login_session_body("jwt-oauth-mfa", "ana@example.com", "USER")),
        )
        .expect(1)
        .mount(&app.auth)
        .await;

    let page = app
        .get(
            "/oauth2/mfa-verify?sessionToken=challenge-jwt&email=ana%40example.com",
            None,
        )
        .await;
    assert_eq!(page.status(), 200);
    assert!(body_string(page).await.contains("ana@example.com"));

    let response = app
        .post_form(
            "/oauth2/mfa-verify",
            "session_token=challenge-jwt&email=ana%40example.com&code=123456",
            None,
        )
        .await;

    assert!(response.status().is_redirection());
    assert_eq!(TestApp::location(&response).as_deref(), Some("/"));
    assert!(TestApp::session_cookie(&response).is_some());
}

#[tokio::test]
async fn expired_mfa_challenge_bounces_to_login() {
    let app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/oauth2/verify-mfa"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&app.auth)
        .await;

    let response = app
        .post_form(
            "/oauth2/mfa-verify",
            "session_token=stale-jwt&email=ana%40example.com&code=123456",
            None,
        )
        .await;

    assert!(response.status().is_redirection());
    assert_eq!(
        TestApp::location(&response).as_deref(),
        Some("/auth/login?error=expired")
    );
}
