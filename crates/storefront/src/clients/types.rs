//! Request and response types for the remote service APIs.
//!
//! Field names follow the services' camelCase JSON. Timestamps arrive as
//! zone-less ISO-8601 (`LocalDateTime` on the Java side), hence
//! `NaiveDateTime`.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use copperleaf_core::{
    CategoryId, OrderId, OrderItemId, OrderStatus, ProductId, ProductStatus, UserId,
};

use crate::models::UserRecord;

// =============================================================================
// Authentication service
// =============================================================================

/// Credentials for `POST /api/auth/login`. `mfa_code` rides along when the
/// user already has a code at hand.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mfa_code: Option<String>,
}

/// Registration form for `POST /api/auth/register`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Response of login-shaped endpoints.
///
/// Either a full session (`token` + `user`) or an MFA-required indicator
/// with both absent.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
    /// Token scheme, `Bearer` in practice.
    #[serde(default, rename = "type")]
    pub token_type: Option<String>,
    #[serde(default)]
    pub mfa_required: bool,
    #[serde(default)]
    pub user: Option<UserRecord>,
}

impl LoginResponse {
    /// Split into a `(token, user)` pair when the service returned a full
    /// session.
    #[must_use]
    pub fn into_session(self) -> Option<(String, UserRecord)> {
        match (self.token, self.user) {
            (Some(token), Some(user)) => Some((token, user)),
            _ => None,
        }
    }
}

/// A standalone 6-digit code submission.
#[derive(Debug, Serialize)]
pub struct MfaCodeRequest {
    pub code: String,
}

/// TOTP enrolment secret returned by `POST /api/auth/mfa/setup`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MfaSetup {
    pub secret: String,
    /// otpauth:// URL to render as a QR code.
    pub qr_code_url: String,
}

/// Challenge completion for `POST /api/auth/oauth2/verify-mfa`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuth2MfaRequest {
    pub session_token: String,
    pub mfa_code: String,
}

// =============================================================================
// Catalog service
// =============================================================================

/// A product as served by the catalog service.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub status: ProductStatus,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Query filters for the product listing.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub status: Option<ProductStatus>,
    pub category_id: Option<CategoryId>,
    pub search: Option<String>,
}

impl ProductFilter {
    /// Render into `(key, value)` query pairs, omitting unset filters.
    #[must_use]
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(status) = self.status {
            query.push(("status", status.to_string()));
        }
        if let Some(category_id) = self.category_id {
            query.push(("categoryId", category_id.to_string()));
        }
        if let Some(search) = &self.search {
            query.push(("search", search.clone()));
        }
        query
    }

    /// Stable cache key for this filter combination.
    #[must_use]
    pub fn cache_key(&self) -> String {
        let mut key = String::from("products");
        for (name, value) in self.to_query() {
            key.push_str(&format!(":{name}={value}"));
        }
        key
    }
}

/// Payload for product create/update (admin).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub category_id: CategoryId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Payload for category creation (admin).
#[derive(Debug, Serialize)]
pub struct CategoryInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// =============================================================================
// Order service
// =============================================================================

/// An order as served by the order service.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub shipping_address: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
}

/// One line of an order.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub subtotal: Decimal,
}

/// Payload for `POST /api/orders`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItemRequest>,
    pub shipping_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// One requested line: the service resolves name and price itself.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Payload for `PATCH /api/orders/{id}/status` (admin).
#[derive(Debug, Serialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}
