//! Cart route handlers.
//!
//! Plain form-POST + redirect flow over the session-persisted cart. The
//! catalog is consulted once per add to snapshot name and price into the
//! line.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use uuid::Uuid;

use crate::error::Result;
use crate::filters;
use crate::models::CartLine;
use crate::routes::auth::MessageQuery;
use crate::services::cart::CartService;
use crate::state::AppState;

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartLineView {
    pub product_id: String,
    pub name: String,
    pub price: String,
    pub quantity: u32,
    pub line_total: String,
    pub image_url: Option<String>,
}

impl From<&CartLine> for CartLineView {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id.to_string(),
            name: line.name.clone(),
            price: format!("${:.2}", line.price),
            quantity: line.quantity,
            line_total: format!("${:.2}", line.line_total()),
            image_url: line.image_url.clone(),
        }
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: Uuid,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: Uuid,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: Uuid,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub items: Vec<CartLineView>,
    pub total: rust_decimal::Decimal,
    pub item_count: u32,
    pub error: Option<String>,
}

fn cart_error_message(code: &str) -> String {
    match code {
        "product_unavailable" => "That product is currently unavailable".to_string(),
        other => other.replace('_', " "),
    }
}

/// Display cart page.
#[instrument(skip_all)]
pub async fn show(
    session: Session,
    Query(query): Query<MessageQuery>,
) -> Result<impl IntoResponse> {
    let cart = CartService::new(&session);

    Ok(CartShowTemplate {
        items: cart.items().await?.iter().map(CartLineView::from).collect(),
        total: cart.total().await?,
        item_count: cart.item_count().await?,
        error: query.error.as_deref().map(cart_error_message),
    })
}

/// Add an item to the cart.
///
/// Fetches the product from the catalog to snapshot its display fields.
#[instrument(skip_all, fields(product_id = %form.product_id))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let quantity = form.quantity.unwrap_or(1).max(1);

    let product = match state.catalog().get_product(form.product_id.into()).await {
        Ok(product) => product,
        Err(e) => {
            tracing::warn!("failed to fetch product for cart add: {e}");
            return Ok(Redirect::to("/cart?error=product_unavailable").into_response());
        }
    };

    let cart = CartService::new(&session);
    cart.add_item(&product, quantity).await?;

    Ok(Redirect::to("/cart").into_response())
}

/// Replace a line's quantity. Zero removes the line.
#[instrument(skip_all, fields(product_id = %form.product_id, quantity = form.quantity))]
pub async fn update(session: Session, Form(form): Form<UpdateCartForm>) -> Result<Response> {
    let cart = CartService::new(&session);
    cart.update_quantity(form.product_id.into(), form.quantity)
        .await?;

    Ok(Redirect::to("/cart").into_response())
}

/// Remove a line from the cart.
#[instrument(skip_all, fields(product_id = %form.product_id))]
pub async fn remove(session: Session, Form(form): Form<RemoveFromCartForm>) -> Result<Response> {
    let cart = CartService::new(&session);
    cart.remove_item(form.product_id.into()).await?;

    Ok(Redirect::to("/cart").into_response())
}
