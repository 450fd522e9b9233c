//! Order service client.
//!
//! Every endpoint is caller-scoped: the service derives the user from the
//! bearer token. The listing endpoint filters by the caller's identity even
//! for administrators; there is deliberately no "all orders" call here (the
//! service does not offer one).

use std::sync::Arc;

use copperleaf_core::{OrderId, OrderStatus};

use crate::clients::types::{CreateOrderRequest, Order, UpdateOrderStatusRequest};
use crate::clients::{ApiError, check};

/// Client for the order service.
#[derive(Clone)]
pub struct OrderClient {
    inner: Arc<OrderClientInner>,
}

struct OrderClientInner {
    client: reqwest::Client,
    base_url: String,
}

impl OrderClient {
    /// Create a new order service client.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            inner: Arc::new(OrderClientInner {
                client: reqwest::Client::new(),
                base_url: base_url.trim_end_matches('/').to_string(),
            }),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// Submit an order.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Service`] when a product is unavailable or the
    /// payload fails validation.
    pub async fn create_order(
        &self,
        token: &str,
        request: &CreateOrderRequest,
    ) -> Result<Order, ApiError> {
        let response = self
            .inner
            .client
            .post(self.url("/api/orders"))
            .bearer_auth(token)
            .json(request)
            .send()
            .await?;

        Ok(check(response).await?.json().await?)
    }

    /// List the caller's own orders, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] for an expired token.
    pub async fn list_orders(
        &self,
        token: &str,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, ApiError> {
        let mut request = self
            .inner
            .client
            .get(self.url("/api/orders"))
            .bearer_auth(token);

        if let Some(status) = status {
            request = request.query(&[("status", status.to_string())]);
        }

        Ok(check(request.send().await?).await?.json().await?)
    }

    /// Fetch one order by id.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] for an unknown id.
    pub async fn get_order(&self, token: &str, id: OrderId) -> Result<Order, ApiError> {
        let response = self
            .inner
            .client
            .get(self.url(&format!("/api/orders/{id}")))
            .bearer_auth(token)
            .send()
            .await?;

        Ok(check(response).await?.json().await?)
    }

    /// Cancel an order. The service restocks the items and returns the
    /// updated order.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Service`] when the order is already delivered or
    /// cancelled.
    pub async fn cancel_order(&self, token: &str, id: OrderId) -> Result<Order, ApiError> {
        let response = self
            .inner
            .client
            .delete(self.url(&format!("/api/orders/{id}")))
            .bearer_auth(token)
            .send()
            .await?;

        Ok(check(response).await?.json().await?)
    }

    /// Update an order's status (admin).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] without a valid admin token.
    pub async fn update_status(
        &self,
        token: &str,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, ApiError> {
        let response = self
            .inner
            .client
            .patch(self.url(&format!("/api/orders/{id}/status")))
            .bearer_auth(token)
            .json(&UpdateOrderStatusRequest { status })
            .send()
            .await?;

        Ok(check(response).await?.json().await?)
    }
}
