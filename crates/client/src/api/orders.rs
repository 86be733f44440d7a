//! `/orders` endpoints.

use greenshoes_core::OrderId;
use tracing::instrument;

use super::ApiClient;
use super::types::{Order, OrderEnvelope, OrderList};
use crate::error::ApiError;

impl ApiClient {
    /// `GET /orders`: the account's order history.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<Order>, ApiError> {
        let list: Option<OrderList> = self.get("/orders").await?;
        Ok(list.unwrap_or_default().orders)
    }

    /// `GET /orders/{id}`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the order does not exist or the request fails.
    #[instrument(skip(self))]
    pub async fn get_order(&self, id: OrderId) -> Result<Order, ApiError> {
        let envelope: OrderEnvelope = self.get(&format!("/orders/{id}")).await?;
        Ok(envelope.into_order())
    }

    /// `POST /orders/{id}/reorder`: add the order's items to the cart again.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the items are unavailable or the request fails.
    #[instrument(skip(self))]
    pub async fn reorder(&self, id: OrderId) -> Result<(), ApiError> {
        self.post_empty(&format!("/orders/{id}/reorder"))
            .await
            .map(drop)
    }
}
