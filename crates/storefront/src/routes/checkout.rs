//! Checkout route handlers.
//!
//! Builds the order payload from the cart, submits it to the order service,
//! and clears the cart only after the service confirmed the order.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::clients::ApiError;
use crate::clients::types::{CreateOrderRequest, OrderItemRequest};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::routes::cart::CartLineView;
use crate::services::cart::CartService;
use crate::state::AppState;

/// Checkout form data.
#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
    pub shipping_address: String,
    pub notes: Option<String>,
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub items: Vec<CartLineView>,
    pub total: rust_decimal::Decimal,
    pub error: Option<String>,
    pub shipping_address: String,
    pub notes: String,
}

/// Display the checkout page with the order summary and shipping form.
#[instrument(skip_all)]
pub async fn show(RequireAuth(_auth): RequireAuth, session: Session) -> Result<Response> {
    let cart = CartService::new(&session);
    let items = cart.items().await?;

    if items.is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }

    Ok(CheckoutTemplate {
        items: items.iter().map(CartLineView::from).collect(),
        total: cart.total().await?,
        error: None,
        shipping_address: String::new(),
        notes: String::new(),
    }
    .into_response())
}

/// Submit the order.
///
/// Validation failures are caught before submission; service failures are
/// surfaced on the page without touching the cart. The cart is cleared only
/// after a successful submission.
#[instrument(skip_all)]
pub async fn submit(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    session: Session,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let cart = CartService::new(&session);
    let items = cart.items().await?;

    if items.is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }

    let shipping_address = form.shipping_address.trim().to_string();
    let notes = form.notes.unwrap_or_default();

    if shipping_address.is_empty() {
        return Ok(render_with_error(
            &cart,
            "Shipping address is required",
            &shipping_address,
            &notes,
        )
        .await?
        .into_response());
    }

    let request = CreateOrderRequest {
        items: items
            .iter()
            .map(|line| OrderItemRequest {
                product_id: line.product_id,
                quantity: line.quantity,
            })
            .collect(),
        shipping_address,
        notes: Some(notes.clone()).filter(|n| !n.trim().is_empty()),
    };

    match state.orders().create_order(&auth.token, &request).await {
        Ok(order) => {
            cart.clear().await?;
            tracing::info!(order_id = %order.id, "order created");
            Ok(Redirect::to("/orders?notice=created").into_response())
        }
        // An expired token must flow through as 401 for the global handling.
        Err(ApiError::Unauthorized) => Err(ApiError::Unauthorized.into()),
        Err(e) => {
            tracing::warn!("order submission failed: {e}");
            let message = match e {
                ApiError::Service { message, .. } => message,
                _ => "Could not create the order, please try again".to_string(),
            };
            Ok(
                render_with_error(&cart, &message, &request.shipping_address, &notes)
                    .await?
                    .into_response(),
            )
        }
    }
}

async fn render_with_error(
    cart: &CartService<'_>,
    error: &str,
    shipping_address: &str,
    notes: &str,
) -> Result<CheckoutTemplate> {
    Ok(CheckoutTemplate {
        items: cart.items().await?.iter().map(CartLineView::from).collect(),
        total: cart.total().await?,
        error: Some(error.to_string()),
        shipping_address: shipping_address.to_string(),
        notes: notes.to_string(),
    })
}
