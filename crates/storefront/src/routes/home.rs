//! Home page.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::clients::types::ProductFilter;
use crate::middleware::OptionalAuth;
use crate::routes::products::ProductView;
use crate::state::AppState;

/// Number of products featured on the home page.
const FEATURED_COUNT: usize = 6;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub featured: Vec<ProductView>,
    pub display_name: Option<String>,
}

/// Display the home page with a handful of featured products.
#[instrument(skip_all)]
pub async fn home(
    State(state): State<AppState>,
    OptionalAuth(visitor): OptionalAuth,
) -> impl IntoResponse {
    let featured = match state.catalog().list_products(&ProductFilter::default()).await {
        Ok(products) => products
            .iter()
            .take(FEATURED_COUNT)
            .map(ProductView::from)
            .collect(),
        Err(e) => {
            tracing::warn!("failed to load featured products: {e}");
            Vec::new()
        }
    };

    HomeTemplate {
        featured,
        display_name: visitor.map(|auth| auth.user.display_name().to_string()),
    }
}
