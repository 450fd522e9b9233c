//! Administrative panel access control and privileged operations.

use copperleaf_integration_tests::{
    TestApp, body_string, login_session_body, order_body, product_body,
};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

async fn login_as(app: &TestApp, role: &str) -> String {
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(login_session_body("jwt-abc", "admin@example.com", role)),
        )
        .mount(&app.auth)
        .await;

    let response = app
        .post_form(
            "/auth/login",
            "email=admin%40example.com&password=hunter22",
            None,
        )
        .await;
    TestApp::session_cookie(&response).expect("session cookie")
}

async fn mount_dashboard_reads(app: &TestApp) {
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            product_body(uuid::Uuid::new_v4(), "Ceramic mug", "9.99")
        ])))
        .mount(&app.catalog)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&app.catalog)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&app.orders)
        .await;
}

#[tokio::test]
async fn dashboard_renders_for_administrators() {
    let app = TestApp::spawn().await;
    let cookie = login_as(&app, "ADMIN").await;
    mount_dashboard_reads(&app).await;

    let response = app.get("/admin", Some(&cookie)).await;
    assert_eq!(response.status(), 200);
    let html = body_string(response).await;
    assert!(html.contains("Ceramic mug"));
}

#[tokio::test]
async fn dashboard_bounces_regular_users_home() {
    let app = TestApp::spawn().await;
    let cookie = login_as(&app, "USER").await;

    let response = app.get("/admin", Some(&cookie)).await;
    assert!(response.status().is_redirection());
    assert_eq!(TestApp::location(&response).as_deref(), Some("/"));
}

#[tokio::test]
async fn dashboard_bounces_anonymous_visitors_to_login() {
    let app = TestApp::spawn().await;

    let response = app.get("/admin", None).await;
    assert!(response.status().is_redirection());
    assert_eq!(TestApp::location(&response).as_deref(), Some("/auth/login"));
}

#[tokio::test]
async fn order_status_update_goes_through_the_privileged_endpoint() {
    let app = TestApp::spawn().await;
    let cookie = login_as(&app, "ADMIN").await;
    let order_id = uuid::Uuid::new_v4();

    Mock::given(method("PATCH"))
        .and(path(format!("/api/orders/{order_id}/status")))
        .and(body_json(serde_json::json!({"status": "SHIPPED"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(order_body(order_id, "SHIPPED", "19.98")),
        )
        .expect(1)
        .mount(&app.orders)
        .await;

    let response = app
        .post_form(
            &format!("/admin/orders/{order_id}/status"),
            "status=SHIPPED",
            Some(&cookie),
        )
        .await;

    assert!(response.status().is_redirection());
    assert_eq!(
        TestApp::location(&response).as_deref(),
        Some("/admin?tab=orders&notice=status_updated")
    );
}

#[tokio::test]
async fn product_delete_requires_the_admin_role() {
    let app = TestApp::spawn().await;
    let cookie = login_as(&app, "USER").await;

    // No catalog mock mounted: the request must never reach the service.
    let response = app
        .post_form(
            &format!("/admin/products/{}/delete", uuid::Uuid::new_v4()),
            "",
            Some(&cookie),
        )
        .await;

    assert!(response.status().is_redirection());
    assert_eq!(TestApp::location(&response).as_deref(), Some("/"));
}

#[tokio::test]
async fn category_creation_posts_to_the_catalog() {
    let app = TestApp::spawn().await;
    let cookie = login_as(&app, "ADMIN").await;

    Mock::given(method("POST"))
        .and(path("/api/categories"))
        .and(body_json(serde_json::json!({"name": "Kitchen"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "id": uuid::Uuid::new_v4(),
            "name": "Kitchen"
        })))
        .expect(1)
        .mount(&app.catalog)
        .await;

    let response = app
        .post_form("/admin/categories", "name=Kitchen&description=", Some(&cookie))
        .await;

    assert!(response.status().is_redirection());
    assert_eq!(
        TestApp::location(&response).as_deref(),
        Some("/admin?notice=category_created")
    );
}
