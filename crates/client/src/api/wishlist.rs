//! `/wishlist` endpoints.

use greenshoes_core::ProductId;
use serde::de::IgnoredAny;
use tracing::instrument;

use super::ApiClient;
use super::types::{AddToWishlist, MoveToCart, WishlistItem, WishlistResponse};
use crate::error::ApiError;

impl ApiClient {
    /// `GET /wishlist`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn get_wishlist(&self) -> Result<Vec<WishlistItem>, ApiError> {
        let response: Option<WishlistResponse> = self.get("/wishlist").await?;
        Ok(response.unwrap_or_default().items)
    }

    /// `POST /wishlist/add`. Saving an already saved product is a no-op
    /// server-side.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn add_to_wishlist(&self, product_id: ProductId) -> Result<(), ApiError> {
        self.post::<IgnoredAny, _>("/wishlist/add", &AddToWishlist { product_id })
            .await
            .map(drop)
    }

    /// `DELETE /wishlist/{productId}`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn remove_from_wishlist(&self, product_id: ProductId) -> Result<(), ApiError> {
        self.delete(&format!("/wishlist/{product_id}"))
            .await
            .map(drop)
    }

    /// `POST /wishlist/move-to-cart/{productId}` with one unit of the chosen
    /// variant.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the variant is unavailable or the request fails.
    #[instrument(skip(self))]
    pub async fn move_wishlist_item_to_cart(
        &self,
        product_id: ProductId,
        color: Option<&str>,
        size: &str,
    ) -> Result<(), ApiError> {
        let body = MoveToCart {
            color,
            size,
            quantity: 1,
        };
        self.post::<IgnoredAny, _>(&format!("/wishlist/move-to-cart/{product_id}"), &body)
            .await
            .map(drop)
    }
}
