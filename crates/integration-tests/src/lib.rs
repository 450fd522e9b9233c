//! Integration test harness for Copperleaf.
//!
//! Each test gets a [`TestApp`]: the real storefront router over an
//! in-memory session store, with the three remote services replaced by
//! wiremock servers. Requests are driven in-process via `tower::ServiceExt`
//! with manual cookie threading, so no port binding or live backend is
//! needed.
//!
//! # Example
//!
//! ```rust,ignore
//! let app = TestApp::spawn().await;
//!
//! Mock::given(method("POST"))
//!     .and(path("/api/auth/login"))
//!     .respond_with(ResponseTemplate::new(200).set_body_json(login_body()))
//!     .mount(&app.auth)
//!     .await;
//!
//! let response = app.post_form("/auth/login", "email=a%40b.c&password=pw", None).await;
//! let cookie = TestApp::session_cookie(&response).unwrap();
//! ```

use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, header};
use tower::ServiceExt;
use tower_sessions::{MemoryStore, SessionManagerLayer};
use wiremock::MockServer;

use copperleaf_storefront::config::{ServiceUrls, StorefrontConfig};
use copperleaf_storefront::middleware::authorization_guard;
use copperleaf_storefront::routes;
use copperleaf_storefront::services::session::RetryPolicy;
use copperleaf_storefront::state::AppState;

/// The storefront under test plus its three fake backends.
pub struct TestApp {
    pub router: Router,
    pub auth: MockServer,
    pub catalog: MockServer,
    pub orders: MockServer,
}

impl TestApp {
    /// Spin up fake backends and assemble the router the way `main` does,
    /// minus the network listener. The third-party retry schedule is
    /// shortened so protocol tests stay fast.
    pub async fn spawn() -> Self {
        Self::spawn_with_retry(RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(5),
        })
        .await
    }

    /// Like [`Self::spawn`] but with an explicit retry schedule.
    pub async fn spawn_with_retry(retry: RetryPolicy) -> Self {
        let auth = MockServer::start().await;
        let catalog = MockServer::start().await;
        let orders = MockServer::start().await;

        let config = StorefrontConfig {
            host: "127.0.0.1".parse().expect("valid host"),
            port: 0,
            base_url: "http://localhost:3000".to_string(),
            session_db: "unused-in-tests.db".to_string(),
            services: ServiceUrls {
                auth: auth.uri(),
                catalog: catalog.uri(),
                orders: orders.uri(),
            },
            sentry_dsn: None,
            sentry_environment: None,
        };

        let state = AppState::with_retry_policy(config, retry);
        let session_layer = SessionManagerLayer::new(MemoryStore::default());

        let router = routes::routes()
            .layer(axum::middleware::from_fn(authorization_guard))
            .layer(session_layer)
            .with_state(state);

        Self {
            router,
            auth,
            catalog,
            orders,
        }
    }

    /// Issue a GET request, optionally with a session cookie.
    pub async fn get(&self, path: &str, cookie: Option<&str>) -> Response<Body> {
        let mut request = Request::builder().method("GET").uri(path);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }

        self.router
            .clone()
            .oneshot(request.body(Body::empty()).expect("valid request"))
            .await
            .expect("infallible service")
    }

    /// Issue a form POST, optionally with a session cookie.
    pub async fn post_form(
        &self,
        path: &str,
        body: &str,
        cookie: Option<&str>,
    ) -> Response<Body> {
        let mut request = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }

        self.router
            .clone()
            .oneshot(request.body(Body::from(body.to_string())).expect("valid request"))
            .await
            .expect("infallible service")
    }

    /// Extract the session cookie pair (`name=value`) from a response.
    pub fn session_cookie(response: &Response<Body>) -> Option<String> {
        response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .map(str::to_string)
    }

    /// The `Location` header of a redirect response.
    pub fn location(response: &Response<Body>) -> Option<String> {
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    }
}

/// Read a response body to a UTF-8 string.
pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    String::from_utf8_lossy(&bytes).into_owned()
}

/// A full-session login response body as the auth service would produce.
#[must_use]
pub fn login_session_body(token: &str, email: &str, role: &str) -> serde_json::Value {
    serde_json::json!({
        "token": token,
        "type": "Bearer",
        "mfaRequired": false,
        "user": {
            "id": uuid::Uuid::new_v4(),
            "email": email,
            "username": email.split('@').next().unwrap_or(email),
            "provider": "LOCAL",
            "role": role,
            "mfaEnabled": false,
            "emailVerified": true
        }
    })
}

/// A catalog product body.
#[must_use]
pub fn product_body(id: uuid::Uuid, name: &str, price: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "name": name,
        "description": "Integration test product",
        "price": price,
        "stock": 25,
        "status": "ACTIVE"
    })
}

/// An order body as the order service would produce.
#[must_use]
pub fn order_body(id: uuid::Uuid, status: &str, total: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "userId": uuid::Uuid::new_v4(),
        "items": [],
        "totalAmount": total,
        "status": status,
        "shippingAddress": "12 Alder Way",
        "createdAt": "2026-03-02T10:15:30"
    })
}
