//! Order history route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use copperleaf_core::OrderStatus;

use crate::clients::types::{Order, OrderItem};
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Order display data for templates.
#[derive(Clone)]
pub struct OrderView {
    pub id: String,
    pub status: String,
    pub total: String,
    pub created_at: String,
    pub item_count: usize,
    pub cancellable: bool,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            status: order.status.to_string(),
            total: format!("${:.2}", order.total_amount),
            created_at: order
                .created_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
            item_count: order.items.len(),
            cancellable: order.status.is_cancellable(),
        }
    }
}

/// Order line display data for the detail page.
#[derive(Clone)]
pub struct OrderItemView {
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: String,
    pub subtotal: String,
}

impl From<&OrderItem> for OrderItemView {
    fn from(item: &OrderItem) -> Self {
        Self {
            product_name: item.product_name.clone(),
            quantity: item.quantity,
            unit_price: format!("${:.2}", item.unit_price),
            subtotal: format!("${:.2}", item.subtotal),
        }
    }
}

/// Listing query parameters.
#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    pub status: Option<String>,
    pub notice: Option<String>,
    pub error: Option<String>,
}

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersTemplate {
    pub orders: Vec<OrderView>,
    pub statuses: Vec<String>,
    pub selected_status: String,
    pub notice: Option<String>,
    pub error: Option<String>,
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/show.html")]
pub struct OrderDetailTemplate {
    pub order: OrderView,
    pub items: Vec<OrderItemView>,
    pub shipping_address: String,
    pub notes: String,
}

/// Display the caller's order history, optionally filtered by status.
#[instrument(skip(state, auth))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Query(query): Query<OrdersQuery>,
) -> Result<impl IntoResponse> {
    // An unknown status filter is ignored rather than rejected.
    let status = query
        .status
        .as_deref()
        .and_then(|s| s.parse::<OrderStatus>().ok());

    let orders = state.orders().list_orders(&auth.token, status).await?;

    Ok(OrdersTemplate {
        orders: orders.iter().map(OrderView::from).collect(),
        statuses: OrderStatus::ALL.iter().map(ToString::to_string).collect(),
        selected_status: status.map(|s| s.to_string()).unwrap_or_default(),
        notice: query.notice.map(|code| notice_message(&code)),
        error: query.error.map(|code| error_message(&code)),
    })
}

fn notice_message(code: &str) -> String {
    match code {
        "created" => "Order placed successfully".to_string(),
        "cancelled" => "Order cancelled".to_string(),
        other => other.replace('_', " "),
    }
}

fn error_message(code: &str) -> String {
    match code {
        "cancel_failed" => "The order could not be cancelled".to_string(),
        other => other.replace('_', " "),
    }
}

/// Display one order.
#[instrument(skip(state, auth))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let order = state.orders().get_order(&auth.token, id.into()).await?;

    Ok(OrderDetailTemplate {
        order: OrderView::from(&order),
        items: order.items.iter().map(OrderItemView::from).collect(),
        shipping_address: order.shipping_address.clone(),
        notes: order.notes.clone().unwrap_or_default(),
    })
}

/// Cancel an order.
#[instrument(skip(state, auth))]
pub async fn cancel(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<Response> {
    match state.orders().cancel_order(&auth.token, id.into()).await {
        Ok(_) => Ok(Redirect::to("/orders?notice=cancelled").into_response()),
        Err(crate::clients::ApiError::Unauthorized) => {
            Err(crate::clients::ApiError::Unauthorized.into())
        }
        Err(e) => {
            tracing::warn!("order cancellation failed: {e}");
            Ok(Redirect::to("/orders?error=cancel_failed").into_response())
        }
    }
}
