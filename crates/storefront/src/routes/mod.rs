//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                        - Home page (default authenticated landing)
//!
//! # Products
//! GET  /products                - Product listing (search/category filters)
//! GET  /products/{id}           - Product detail with add-to-cart form
//!
//! # Cart
//! GET  /cart                    - Cart page
//! POST /cart/add                - Add item (quantity defaults to 1)
//! POST /cart/update             - Replace a line's quantity (0 removes)
//! POST /cart/remove             - Remove a line
//!
//! # Checkout (requires auth)
//! GET  /checkout                - Order summary + shipping form
//! POST /checkout                - Submit order, clear cart
//!
//! # Auth
//! GET  /auth/login              - Login page
//! POST /auth/login              - Login action (optional MFA code)
//! POST /auth/mfa                - Standalone MFA code submission
//! GET  /auth/register           - Register page
//! POST /auth/register           - Register action
//! POST /auth/logout             - Logout action
//!
//! # Third-party sign-in
//! GET  /oauth2/callback         - Identity-provider redirect target
//! GET  /oauth2/mfa-verify       - Third-party MFA challenge page
//! POST /oauth2/mfa-verify       - Challenge code submission
//!
//! # Orders (requires auth)
//! GET  /orders                  - Order history (?status= filter)
//! GET  /orders/{id}             - Order detail
//! POST /orders/{id}/cancel      - Cancel an order
//!
//! # Profile (requires auth)
//! GET  /profile                 - Account overview + MFA management
//! POST /profile/mfa/setup       - Begin TOTP enrolment
//! POST /profile/mfa/enable      - Confirm enrolment code
//! POST /profile/mfa/disable     - Turn MFA off
//!
//! # Admin (requires ADMIN role)
//! GET  /admin                   - Dashboard (products/orders tabs)
//! POST /admin/products/{id}/delete - Soft-delete a product
//! POST /admin/orders/{id}/status   - Update an order's status
//! POST /admin/categories        - Create a category
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod home;
pub mod oauth;
pub mod orders;
pub mod products;
pub mod profile;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/mfa", post(auth::verify_mfa))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", post(auth::logout))
}

/// Create the third-party sign-in routes router.
pub fn oauth_routes() -> Router<AppState> {
    Router::new()
        .route("/callback", get(oauth::callback))
        .route(
            "/mfa-verify",
            get(oauth::mfa_verify_page).post(oauth::mfa_verify),
        )
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
        .route("/{id}/cancel", post(orders::cancel))
}

/// Create the profile routes router.
pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(profile::show))
        .route("/mfa/setup", post(profile::mfa_setup))
        .route("/mfa/enable", post(profile::mfa_enable))
        .route("/mfa/disable", post(profile::mfa_disable))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin::dashboard))
        .route("/products/{id}/delete", post(admin::delete_product))
        .route("/orders/{id}/status", post(admin::update_order_status))
        .route("/categories", post(admin::create_category))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        // Product routes
        .nest("/products", product_routes())
        // Cart routes
        .nest("/cart", cart_routes())
        // Checkout
        .route("/checkout", get(checkout::show).post(checkout::submit))
        // Order routes
        .nest("/orders", order_routes())
        // Profile routes
        .nest("/profile", profile_routes())
        // Auth routes
        .nest("/auth", auth_routes())
        // Third-party sign-in
        .nest("/oauth2", oauth_routes())
        // Admin panel
        .nest("/admin", admin_routes())
}
