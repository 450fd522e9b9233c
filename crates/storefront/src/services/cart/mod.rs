//! Cart manager.
//!
//! A small reducer over the persisted cart line list. Every mutation leaves
//! the session store consistent with in-memory state before returning - no
//! persistence lag is observable to the caller.

use rust_decimal::Decimal;
use thiserror::Error;
use tower_sessions::Session;
use tracing::instrument;

use copperleaf_core::ProductId;

use crate::clients::types::Product;
use crate::models::{CartLine, session_keys};

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The session store rejected a read or write.
    #[error("session store error: {0}")]
    Store(#[from] tower_sessions::session::Error),
}

/// Cart manager bound to one request's session.
pub struct CartService<'a> {
    session: &'a Session,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Current cart lines, rehydrated from the store (empty when absent).
    ///
    /// # Errors
    ///
    /// Returns `CartError::Store` if the session store is unreachable.
    pub async fn items(&self) -> Result<Vec<CartLine>, CartError> {
        Ok(self
            .session
            .get::<Vec<CartLine>>(session_keys::CART)
            .await?
            .unwrap_or_default())
    }

    async fn persist(&self, items: &[CartLine]) -> Result<(), CartError> {
        self.session.insert(session_keys::CART, items).await?;
        self.session.save().await?;
        Ok(())
    }

    /// Add a product to the cart. An existing line for the same product has
    /// its quantity incremented; otherwise a new line is appended. Never
    /// fails on input (quantity is caller-validated positive).
    ///
    /// # Errors
    ///
    /// Returns `CartError::Store` if persisting fails.
    #[instrument(skip_all, fields(product_id = %product.id, quantity))]
    pub async fn add_item(&self, product: &Product, quantity: u32) -> Result<(), CartError> {
        let mut items = self.items().await?;

        if let Some(line) = items.iter_mut().find(|line| line.product_id == product.id) {
            line.quantity += quantity;
        } else {
            items.push(CartLine::from_product(product, quantity));
        }

        self.persist(&items).await
    }

    /// Remove the line for a product; no-op when absent.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Store` if persisting fails.
    #[instrument(skip_all, fields(product_id = %product_id))]
    pub async fn remove_item(&self, product_id: ProductId) -> Result<(), CartError> {
        let mut items = self.items().await?;
        items.retain(|line| line.product_id != product_id);
        self.persist(&items).await
    }

    /// Replace a line's quantity. Zero removes the line, equivalently to
    /// [`Self::remove_item`].
    ///
    /// # Errors
    ///
    /// Returns `CartError::Store` if persisting fails.
    #[instrument(skip_all, fields(product_id = %product_id, quantity))]
    pub async fn update_quantity(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), CartError> {
        if quantity == 0 {
            return self.remove_item(product_id).await;
        }

        let mut items = self.items().await?;
        if let Some(line) = items.iter_mut().find(|line| line.product_id == product_id) {
            line.quantity = quantity;
        }
        self.persist(&items).await
    }

    /// Empty the cart. Called after successful order submission.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Store` if persisting fails.
    #[instrument(skip_all)]
    pub async fn clear(&self) -> Result<(), CartError> {
        self.persist(&[]).await
    }

    /// Sum of `price * quantity` over all lines.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Store` if the session store is unreachable.
    pub async fn total(&self) -> Result<Decimal, CartError> {
        Ok(self
            .items()
            .await?
            .iter()
            .map(CartLine::line_total)
            .sum())
    }

    /// Sum of quantities over all lines.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Store` if the session store is unreachable.
    pub async fn item_count(&self) -> Result<u32, CartError> {
        Ok(self.items().await?.iter().map(|line| line.quantity).sum())
    }
}
