//! `/cart` endpoints.

use greenshoes_core::CartItemId;
use serde::de::IgnoredAny;
use tracing::instrument;

use super::ApiClient;
use super::types::{AddToCart, Cart, VariantChange};
use crate::error::ApiError;

impl ApiClient {
    /// `GET /cart`: items and summary for the current credential.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn get_cart(&self) -> Result<Cart, ApiError> {
        let cart: Option<Cart> = self.get("/cart").await?;
        Ok(cart.unwrap_or_default())
    }

    /// `POST /cart/add`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the variant is unavailable or the request fails.
    #[instrument(skip(self), fields(product_id = %item.product_id))]
    pub async fn add_to_cart(&self, item: &AddToCart) -> Result<(), ApiError> {
        self.post::<IgnoredAny, _>("/cart/add", item)
            .await
            .map(drop)
    }

    /// `PATCH /cart/{id}/increase`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if stock is exhausted or the request fails.
    #[instrument(skip(self))]
    pub async fn increase_cart_item(&self, id: CartItemId) -> Result<(), ApiError> {
        self.patch(&format!("/cart/{id}/increase"), None::<&()>)
            .await
            .map(drop)
    }

    /// `PATCH /cart/{id}/decrease`. The API removes the line at zero.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn decrease_cart_item(&self, id: CartItemId) -> Result<(), ApiError> {
        self.patch(&format!("/cart/{id}/decrease"), None::<&()>)
            .await
            .map(drop)
    }

    /// `PATCH /cart/{id}/change-variant`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the combination has no stock or the request
    /// fails.
    #[instrument(skip(self))]
    pub async fn change_cart_variant(
        &self,
        id: CartItemId,
        variant: &VariantChange,
    ) -> Result<(), ApiError> {
        self.patch(&format!("/cart/{id}/change-variant"), Some(variant))
            .await
            .map(drop)
    }

    /// `DELETE /cart/{id}`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn remove_cart_item(&self, id: CartItemId) -> Result<(), ApiError> {
        self.delete(&format!("/cart/{id}")).await.map(drop)
    }

    /// `POST /cart/move-to-wishlist/{id}`. Signed-in accounts only.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn move_cart_item_to_wishlist(&self, id: CartItemId) -> Result<(), ApiError> {
        self.post_empty(&format!("/cart/move-to-wishlist/{id}"))
            .await
            .map(drop)
    }
}
