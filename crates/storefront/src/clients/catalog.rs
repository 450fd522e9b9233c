//! Product catalog service client.
//!
//! Read endpoints are cached in-memory for five minutes (`moka`); admin
//! mutations invalidate the whole cache so the dashboard sees its own writes.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use copperleaf_core::ProductId;

use crate::clients::types::{Category, CategoryInput, Product, ProductFilter, ProductInput};
use crate::clients::{ApiError, check};

/// Cache TTL for catalog reads.
const CACHE_TTL: Duration = Duration::from_secs(300); // 5 minutes

/// Cached catalog responses.
#[derive(Clone)]
enum CacheValue {
    Products(Vec<Product>),
    Product(Box<Product>),
    Categories(Vec<Category>),
}

/// Client for the product catalog service.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    base_url: String,
    cache: Cache<String, CacheValue>,
}

impl CatalogClient {
    /// Create a new catalog service client.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(CACHE_TTL)
            .build();

        Self {
            inner: Arc::new(CatalogClientInner {
                client: reqwest::Client::new(),
                base_url: base_url.trim_end_matches('/').to_string(),
                cache,
            }),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// List products, optionally filtered by status, category, or a search
    /// term.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] on transport failure.
    pub async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, ApiError> {
        let key = filter.cache_key();
        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&key).await {
            return Ok(products);
        }

        let response = self
            .inner
            .client
            .get(self.url("/api/products"))
            .query(&filter.to_query())
            .send()
            .await?;

        let products: Vec<Product> = check(response).await?.json().await?;
        self.inner
            .cache
            .insert(key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// Fetch a single product by id.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] for an unknown id.
    pub async fn get_product(&self, id: ProductId) -> Result<Product, ApiError> {
        let key = format!("product:{id}");
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            return Ok(*product);
        }

        let response = self
            .inner
            .client
            .get(self.url(&format!("/api/products/{id}")))
            .send()
            .await?;

        let product: Product = check(response).await?.json().await?;
        self.inner
            .cache
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Create a product (admin).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] without a valid admin token.
    pub async fn create_product(
        &self,
        token: &str,
        input: &ProductInput,
    ) -> Result<Product, ApiError> {
        let response = self
            .inner
            .client
            .post(self.url("/api/products"))
            .bearer_auth(token)
            .json(input)
            .send()
            .await?;

        let product = check(response).await?.json().await?;
        self.inner.cache.invalidate_all();
        Ok(product)
    }

    /// Update a product (admin).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] for an unknown id.
    pub async fn update_product(
        &self,
        token: &str,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, ApiError> {
        let response = self
            .inner
            .client
            .put(self.url(&format!("/api/products/{id}")))
            .bearer_auth(token)
            .json(input)
            .send()
            .await?;

        let product = check(response).await?.json().await?;
        self.inner.cache.invalidate_all();
        Ok(product)
    }

    /// Soft-delete a product (admin). The catalog flips it to `INACTIVE`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] for an unknown id.
    pub async fn delete_product(&self, token: &str, id: ProductId) -> Result<(), ApiError> {
        let response = self
            .inner
            .client
            .delete(self.url(&format!("/api/products/{id}")))
            .bearer_auth(token)
            .send()
            .await?;

        check(response).await?;
        self.inner.cache.invalidate_all();
        Ok(())
    }

    /// List all categories.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] on transport failure.
    pub async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        let key = "categories".to_string();
        if let Some(CacheValue::Categories(categories)) = self.inner.cache.get(&key).await {
            return Ok(categories);
        }

        let response = self
            .inner
            .client
            .get(self.url("/api/categories"))
            .send()
            .await?;

        let categories: Vec<Category> = check(response).await?.json().await?;
        self.inner
            .cache
            .insert(key, CacheValue::Categories(categories.clone()))
            .await;

        Ok(categories)
    }

    /// Create a category (admin).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] without a valid admin token.
    pub async fn create_category(
        &self,
        token: &str,
        input: &CategoryInput,
    ) -> Result<Category, ApiError> {
        let response = self
            .inner
            .client
            .post(self.url("/api/categories"))
            .bearer_auth(token)
            .json(input)
            .send()
            .await?;

        let category = check(response).await?.json().await?;
        self.inner.cache.invalidate_all();
        Ok(category)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn product_json(name: &str) -> serde_json::Value {
        serde_json::json!({
            "id": uuid::Uuid::new_v4(),
            "name": name,
            "price": "19.99",
            "stock": 5,
            "status": "ACTIVE"
        })
    }

    #[tokio::test]
    async fn test_list_products_is_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/products"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!([product_json("Mug")])),
            )
            .expect(1) // second call must be served from cache
            .mount(&server)
            .await;

        let client = CatalogClient::new(&server.uri());
        let first = client.list_products(&ProductFilter::default()).await.unwrap();
        let second = client.list_products(&ProductFilter::default()).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 1);
    }

    #[tokio::test]
    async fn test_list_products_passes_filters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/products"))
            .and(query_param("search", "mug"))
            .and(query_param("status", "ACTIVE"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let client = CatalogClient::new(&server.uri());
        let filter = ProductFilter {
            status: Some(copperleaf_core::ProductStatus::Active),
            category_id: None,
            search: Some("mug".to_string()),
        };
        let products = client.list_products(&filter).await.unwrap();
        assert!(products.is_empty());
    }

    #[tokio::test]
    async fn test_mutation_invalidates_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/products"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!([product_json("Mug")])),
            )
            .expect(2) // refetched after the delete invalidates the cache
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = CatalogClient::new(&server.uri());
        let products = client.list_products(&ProductFilter::default()).await.unwrap();
        client
            .delete_product("admin-token", products[0].id)
            .await
            .unwrap();
        client.list_products(&ProductFilter::default()).await.unwrap();
    }

    #[tokio::test]
    async fn test_get_product_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({"message": "Product not found"})),
            )
            .mount(&server)
            .await;

        let client = CatalogClient::new(&server.uri());
        let err = client
            .get_product(uuid::Uuid::new_v4().into())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
