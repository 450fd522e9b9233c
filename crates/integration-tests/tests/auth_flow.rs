//! Login, MFA, and registration flows through the full router.

use copperleaf_integration_tests::{TestApp, body_string, login_session_body};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_login_success(auth: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(login_session_body("jwt-abc", "ana@example.com", "USER")),
        )
        .mount(auth)
        .await;
}

#[tokio::test]
async fn login_persists_session_and_unlocks_protected_pages() {
    let app = TestApp::spawn().await;
    mount_login_success(&app.auth).await;
    // The profile page refreshes the cached record on render.
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "email": "ana@example.com", "username": "ana", "role": "USER",
                "provider": "LOCAL", "mfaEnabled": false
            })),
        )
        .mount(&app.auth)
        .await;

    let response = app
        .post_form(
            "/auth/login",
            "email=ana%40example.com&password=hunter22",
            None,
        )
        .await;

    assert!(response.status().is_redirection());
    assert_eq!(TestApp::location(&response).as_deref(), Some("/"));
    let cookie = TestApp::session_cookie(&response).expect("session cookie set");

    let profile = app.get("/profile", Some(&cookie)).await;
    assert_eq!(profile.status(), 200);
    let html = body_string(profile).await;
    assert!(html.contains("ana@example.com"));
}

#[tokio::test]
async fn login_with_mfa_required_renders_code_stage_without_session() {
    let app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"mfaRequired": true})),
        )
        .mount(&app.auth)
        .await;

    let response = app
        .post_form(
            "/auth/login",
            "email=ana%40example.com&password=hunter22",
            None,
        )
        .await;

    assert_eq!(response.status(), 200);
    let cookie = TestApp::session_cookie(&response);
    let html = body_string(response).await;
    assert!(html.contains("MFA code"));

    // No session was persisted: protected pages still bounce to login.
    let orders = app.get("/orders", cookie.as_deref()).await;
    assert!(orders.status().is_redirection());
    assert_eq!(TestApp::location(&orders).as_deref(), Some("/auth/login"));
}

#[tokio::test]
async fn mfa_code_submission_completes_the_login() {
    let app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/verify-mfa"))
        .and(body_json(serde_json::json!({"code": "123456"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(login_session_body("jwt-mfa", "ana@example.com", "USER")),
        )
        .expect(1)
        .mount(&app.auth)
        .await;

    let response = app.post_form("/auth/mfa", "code=123456", None).await;
    assert!(response.status().is_redirection());
    assert_eq!(TestApp::location(&response).as_deref(), Some("/"));
    assert!(TestApp::session_cookie(&response).is_some());
}

#[tokio::test]
async fn invalid_credentials_bounce_back_with_error_code() {
    let app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&app.auth)
        .await;

    let response = app
        .post_form("/auth/login", "email=ana%40example.com&password=nope", None)
        .await;

    assert!(response.status().is_redirection());
    assert_eq!(
        TestApp::location(&response).as_deref(),
        Some("/auth/login?error=credentials")
    );
}

#[tokio::test]
async fn register_success_logs_the_visitor_in() {
    let app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(login_session_body("jwt-new", "jo@example.com", "USER")),
        )
        .expect(1)
        .mount(&app.auth)
        .await;

    let response = app
        .post_form(
            "/auth/register",
            "username=jo&email=jo%40example.com&password=longenough&password_confirm=longenough",
            None,
        )
        .await;

    assert!(response.status().is_redirection());
    assert_eq!(TestApp::location(&response).as_deref(), Some("/"));
    assert!(TestApp::session_cookie(&response).is_some());
}

#[tokio::test]
async fn register_password_mismatch_is_caught_before_submission() {
    let app = TestApp::spawn().await;
    // No auth mock mounted: the request must never reach the service.

    let response = app
        .post_form(
            "/auth/register",
            "username=jo&email=jo%40example.com&password=longenough&password_confirm=different",
            None,
        )
        .await;

    assert!(response.status().is_redirection());
    assert_eq!(
        TestApp::location(&response).as_deref(),
        Some("/auth/register?error=password_mismatch")
    );
}

#[tokio::test]
async fn logout_clears_the_session() {
    let app = TestApp::spawn().await;
    mount_login_success(&app.auth).await;

    let login = app
        .post_form(
            "/auth/login",
            "email=ana%40example.com&password=hunter22",
            None,
        )
        .await;
    let cookie = TestApp::session_cookie(&login).expect("session cookie set");

    let logout = app.post_form("/auth/logout", "", Some(&cookie)).await;
    assert!(logout.status().is_redirection());

    let orders = app.get("/orders", Some(&cookie)).await;
    assert!(orders.status().is_redirection());
    assert_eq!(TestApp::location(&orders).as_deref(), Some("/auth/login"));
}
