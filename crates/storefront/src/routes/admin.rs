//! Administrative panel route handlers.
//!
//! A minimal dashboard: product management (list, soft-delete), order status
//! management, and category creation. The order service only lists the
//! caller's own orders - even for administrators - so the orders tab is
//! limited until a privileged listing endpoint exists; the template says so
//! instead of pretending otherwise.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use copperleaf_core::OrderStatus;

use crate::clients::types::{CategoryInput, ProductFilter};
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::routes::orders::OrderView;
use crate::routes::products::{CategoryView, ProductView};
use crate::state::AppState;

/// Dashboard query parameters.
#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub tab: Option<String>,
    pub error: Option<String>,
    pub notice: Option<String>,
}

/// Order status form data.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusForm {
    pub status: String,
}

/// Category creation form data.
#[derive(Debug, Deserialize)]
pub struct CategoryForm {
    pub name: String,
    pub description: Option<String>,
}

/// Admin dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub orders_tab: bool,
    pub products: Vec<ProductView>,
    pub categories: Vec<CategoryView>,
    pub orders: Vec<OrderView>,
    pub statuses: Vec<String>,
    pub error: Option<String>,
    pub notice: Option<String>,
}

/// Display the admin dashboard.
#[instrument(skip(state, auth))]
pub async fn dashboard(
    State(state): State<AppState>,
    RequireAdmin(auth): RequireAdmin,
    Query(query): Query<DashboardQuery>,
) -> Result<impl IntoResponse> {
    let orders_tab = query.tab.as_deref() == Some("orders");

    let products = state
        .catalog()
        .list_products(&ProductFilter::default())
        .await?;
    let categories = state.catalog().list_categories().await.unwrap_or_default();

    // Caller-scoped listing; see module docs for the contract gap.
    let orders = state.orders().list_orders(&auth.token, None).await?;

    Ok(DashboardTemplate {
        orders_tab,
        products: products.iter().map(ProductView::from).collect(),
        categories: categories.iter().map(CategoryView::from).collect(),
        orders: orders.iter().map(OrderView::from).collect(),
        statuses: OrderStatus::ALL.iter().map(ToString::to_string).collect(),
        error: query.error.map(|code| code.replace('_', " ")),
        notice: query.notice.map(|code| code.replace('_', " ")),
    })
}

/// Soft-delete a product.
#[instrument(skip(state, auth))]
pub async fn delete_product(
    State(state): State<AppState>,
    RequireAdmin(auth): RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<Response> {
    match state.catalog().delete_product(&auth.token, id.into()).await {
        Ok(()) => Ok(Redirect::to("/admin?notice=product_deleted").into_response()),
        Err(crate::clients::ApiError::Unauthorized) => {
            Err(crate::clients::ApiError::Unauthorized.into())
        }
        Err(e) => {
            tracing::warn!("product delete failed: {e}");
            Ok(Redirect::to("/admin?error=delete_failed").into_response())
        }
    }
}

/// Update an order's status via the privileged endpoint.
#[instrument(skip(state, auth, form))]
pub async fn update_order_status(
    State(state): State<AppState>,
    RequireAdmin(auth): RequireAdmin,
    Path(id): Path<Uuid>,
    Form(form): Form<UpdateStatusForm>,
) -> Result<Response> {
    let Ok(status) = form.status.parse::<OrderStatus>() else {
        return Ok(Redirect::to("/admin?tab=orders&error=invalid_status").into_response());
    };

    match state
        .orders()
        .update_status(&auth.token, id.into(), status)
        .await
    {
        Ok(_) => Ok(Redirect::to("/admin?tab=orders&notice=status_updated").into_response()),
        Err(crate::clients::ApiError::Unauthorized) => {
            Err(crate::clients::ApiError::Unauthorized.into())
        }
        Err(e) => {
            tracing::warn!("order status update failed: {e}");
            Ok(Redirect::to("/admin?tab=orders&error=update_failed").into_response())
        }
    }
}

/// Create a category.
#[instrument(skip(state, auth, form))]
pub async fn create_category(
    State(state): State<AppState>,
    RequireAdmin(auth): RequireAdmin,
    Form(form): Form<CategoryForm>,
) -> Result<Response> {
    let name = form.name.trim().to_string();
    if name.is_empty() {
        return Ok(Redirect::to("/admin?error=category_name_required").into_response());
    }

    let input = CategoryInput {
        name,
        description: form.description.filter(|d| !d.trim().is_empty()),
    };

    match state.catalog().create_category(&auth.token, &input).await {
        Ok(_) => Ok(Redirect::to("/admin?notice=category_created").into_response()),
        Err(crate::clients::ApiError::Unauthorized) => {
            Err(crate::clients::ApiError::Unauthorized.into())
        }
        Err(e) => {
            tracing::warn!("category creation failed: {e}");
            Ok(Redirect::to("/admin?error=category_failed").into_response())
        }
    }
}
