//! Product browsing route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::clients::types::{Category, Product, ProductFilter};
use crate::error::Result;
use crate::state::AppState;

/// Product display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub stock: i32,
    pub status: String,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub purchasable: bool,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            description: product.description.clone().unwrap_or_default(),
            price: format!("${:.2}", product.price),
            stock: product.stock,
            status: product.status.to_string(),
            category: product.category.as_ref().map(|c| c.name.clone()),
            image_url: product.image_url.clone(),
            purchasable: product.status.is_purchasable() && product.stock > 0,
        }
    }
}

/// Category display data for filter dropdowns.
#[derive(Clone)]
pub struct CategoryView {
    pub id: String,
    pub name: String,
}

impl From<&Category> for CategoryView {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id.to_string(),
            name: category.name.clone(),
        }
    }
}

/// Listing filter query parameters.
#[derive(Debug, Deserialize)]
pub struct ProductsQuery {
    pub search: Option<String>,
    #[serde(rename = "categoryId")]
    pub category_id: Option<Uuid>,
}

/// Product listing template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsTemplate {
    pub products: Vec<ProductView>,
    pub categories: Vec<CategoryView>,
    pub search: String,
    pub selected_category: String,
    pub notice: Option<String>,
}

/// Product detail template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductDetailTemplate {
    pub product: ProductView,
}

/// Display the product listing with optional search/category filters.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductsQuery>,
) -> impl IntoResponse {
    let filter = ProductFilter {
        status: None,
        category_id: query.category_id.map(Into::into),
        search: query.search.clone().filter(|s| !s.is_empty()),
    };

    // Page-level failures degrade to an empty list with a notice; they never
    // break the view.
    let (products, notice) = match state.catalog().list_products(&filter).await {
        Ok(products) => (products.iter().map(ProductView::from).collect(), None),
        Err(e) => {
            tracing::warn!("failed to list products: {e}");
            (Vec::new(), Some("Could not load products".to_string()))
        }
    };

    let categories = match state.catalog().list_categories().await {
        Ok(categories) => categories.iter().map(CategoryView::from).collect(),
        Err(e) => {
            tracing::warn!("failed to list categories: {e}");
            Vec::new()
        }
    };

    ProductsTemplate {
        products,
        categories,
        search: query.search.unwrap_or_default(),
        selected_category: query
            .category_id
            .map(|id| id.to_string())
            .unwrap_or_default(),
        notice,
    }
}

/// Display one product with its add-to-cart form.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let product = state.catalog().get_product(id.into()).await?;

    Ok(ProductDetailTemplate {
        product: ProductView::from(&product),
    })
}
