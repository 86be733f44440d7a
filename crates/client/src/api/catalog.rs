//! Catalog endpoints.
//!
//! Product lists and details are cached (5 minutes by default). Search
//! queries bypass the cache.

use greenshoes_core::ProductId;
use tracing::{debug, instrument};

use super::ApiClient;
use super::types::{Product, ProductDetail, ProductList, ProductQuery};
use crate::error::ApiError;

impl ApiClient {
    /// `GET /catalog` with optional filters and sort.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>, ApiError> {
        let cacheable = query.search.is_none();

        if cacheable && let Some(products) = self.inner.products.get(query).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let list: Option<ProductList> = self.get_with_query("/catalog", query).await?;
        let products = list.unwrap_or_default().products;

        if cacheable {
            self.inner
                .products
                .insert(query.clone(), products.clone())
                .await;
        }

        Ok(products)
    }

    /// `GET /products/{id}`: product, colors, images and per-size stock.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the product does not exist or the request fails.
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: ProductId) -> Result<ProductDetail, ApiError> {
        if let Some(detail) = self.inner.product_details.get(&id).await {
            debug!("Cache hit for product");
            return Ok(detail);
        }

        let detail: ProductDetail = self.get(&format!("/products/{id}")).await?;

        self.inner
            .product_details
            .insert(id, detail.clone())
            .await;

        Ok(detail)
    }

    /// Drop every cached catalog response.
    pub fn invalidate_catalog(&self) {
        self.inner.products.invalidate_all();
        self.inner.product_details.invalidate_all();
    }
}
