//! Wishlist state container.

use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

use greenshoes_core::ProductId;
use tracing::{debug, instrument, warn};

use super::{BUSY_MESSAGE, BusySet, Refetch, Resettable, SyncHandle, spawn_sync};
use crate::api::ApiClient;
use crate::api::types::{VariantChange, WishlistItem};
use crate::error::{ApiError, Failure, FailureKind, Outcome};

/// What the wishlist container currently holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WishlistState {
    /// Saved products; each product appears at most once.
    pub items: Vec<WishlistItem>,
    /// A fetch is in flight.
    pub loading: bool,
}

#[derive(Debug, Default)]
struct Inner {
    state: WishlistState,
    epoch: u64,
}

/// Mirror of the server-side wishlist for the session's current credential.
#[derive(Debug)]
pub struct WishlistStore {
    api: ApiClient,
    inner: RwLock<Inner>,
    busy: BusySet<ProductId>,
}

impl WishlistStore {
    /// Create an empty container. Call [`WishlistStore::fetch`] to load it.
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            inner: RwLock::new(Inner::default()),
            busy: BusySet::new(),
        }
    }

    /// Refetch on identity transitions until the handle is dropped.
    ///
    /// Must be called within a Tokio runtime.
    #[must_use]
    pub fn watch(self: &Arc<Self>) -> SyncHandle {
        spawn_sync(self, self.api.session(), "wishlist")
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> WishlistState {
        self.read(|inner| inner.state.clone())
    }

    /// Current saved products.
    #[must_use]
    pub fn items(&self) -> Vec<WishlistItem> {
        self.read(|inner| inner.state.items.clone())
    }

    /// Number of saved products.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.read(|inner| inner.state.items.len())
    }

    /// Whether `product` is saved, judged from the last fetch. Never makes
    /// a request.
    #[must_use]
    pub fn is_saved(&self, product: ProductId) -> bool {
        self.read(|inner| inner.state.items.iter().any(|i| i.product_id == product))
    }

    /// Whether a fetch is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.read(|inner| inner.state.loading)
    }

    /// Whether a mutation of `product` is in flight.
    #[must_use]
    pub fn is_busy(&self, product: ProductId) -> bool {
        self.busy.contains(product)
    }

    // =========================================================================
    // Fetch
    // =========================================================================

    /// Load the wishlist from the server.
    ///
    /// On failure the wishlist becomes empty rather than keeping stale
    /// entries.
    ///
    /// # Errors
    ///
    /// Returns a `Failure` describing why the wishlist could not be loaded.
    #[instrument(skip(self))]
    pub async fn fetch(&self) -> Outcome {
        let epoch = self.write(|inner| {
            inner.state.loading = true;
            inner.epoch
        });

        let result = self.api.get_wishlist().await;

        self.write(|inner| {
            if inner.epoch != epoch {
                debug!("Discarding wishlist fetched before reset");
                return result
                    .map(drop)
                    .map_err(|e| Failure::from_api(&e, "Failed to load wishlist"));
            }
            inner.state.loading = false;
            match result {
                Ok(items) => {
                    debug!(items = items.len(), "Fetched wishlist");
                    inner.state.items = dedup_by_product(items);
                    Ok(())
                }
                Err(e) => {
                    warn!(error = %e, "Failed to fetch wishlist; showing it empty");
                    inner.state.items.clear();
                    Err(Failure::from_api(&e, "Failed to load wishlist"))
                }
            }
        })
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Save a product.
    ///
    /// # Errors
    ///
    /// Returns a `Failure` if the product is busy or the API refuses.
    #[instrument(skip(self))]
    pub async fn add(&self, product: ProductId) -> Outcome {
        let _guard = self.busy.try_acquire(product).ok_or_else(busy)?;
        let result = self.api.add_to_wishlist(product).await;
        self.settle(result, "Failed to add to wishlist").await
    }

    /// Unsave a product.
    ///
    /// # Errors
    ///
    /// Returns a `Failure` if the product is busy or the API refuses.
    #[instrument(skip(self))]
    pub async fn remove(&self, product: ProductId) -> Outcome {
        let _guard = self.busy.try_acquire(product).ok_or_else(busy)?;
        let result = self.api.remove_from_wishlist(product).await;
        self.settle(result, "Failed to remove from wishlist").await
    }

    /// Put one unit of the chosen variant in the cart and unsave the
    /// product. A size is required; the color defaults server-side.
    ///
    /// Only the wishlist is refetched; the cart picks the line up on its next
    /// fetch.
    ///
    /// # Errors
    ///
    /// Returns a `Failure` if no size was chosen, the product is busy, or the
    /// variant is unavailable.
    #[instrument(skip(self))]
    pub async fn move_to_cart(&self, product: ProductId, variant: &VariantChange) -> Outcome {
        let size = variant
            .size
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Failure::validation("Please select a size"))?;
        let _guard = self.busy.try_acquire(product).ok_or_else(busy)?;
        let result = self
            .api
            .move_wishlist_item_to_cart(product, variant.color.as_deref(), size)
            .await;
        self.settle(result, "Failed to move to cart").await
    }

    /// Drop local contents.
    pub fn clear(&self) {
        self.write(|inner| inner.state.items.clear());
    }

    async fn settle(&self, result: Result<(), ApiError>, fallback: &str) -> Outcome {
        let _ = self.fetch().await;
        result.map_err(|e| Failure::from_api(&e, fallback))
    }

    fn read<T>(&self, f: impl FnOnce(&Inner) -> T) -> T {
        f(&self.inner.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn write<T>(&self, f: impl FnOnce(&mut Inner) -> T) -> T {
        f(&mut self.inner.write().unwrap_or_else(PoisonError::into_inner))
    }
}

/// Keep the first entry per product.
fn dedup_by_product(items: Vec<WishlistItem>) -> Vec<WishlistItem> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.product_id))
        .collect()
}

fn busy() -> Failure {
    Failure::new(FailureKind::Busy, BUSY_MESSAGE)
}

impl Resettable for WishlistStore {
    fn reset(&self) {
        self.write(|inner| {
            inner.state = WishlistState::default();
            inner.epoch += 1;
        });
    }
}

impl Refetch for WishlistStore {
    fn refetch(&self) -> impl Future<Output = ()> + Send {
        async move {
            let _ = self.fetch().await;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::session::Session;
    use greenshoes_core::{Price, WishlistItemId};

    fn store() -> WishlistStore {
        let config = ClientConfig::new("http://127.0.0.1:9").unwrap();
        WishlistStore::new(ApiClient::new(&config, Session::in_memory()).unwrap())
    }

    fn item(product: ProductId) -> WishlistItem {
        WishlistItem {
            wishlist_item_id: WishlistItemId::new(uuid::Uuid::new_v4()),
            product_id: product,
            name: "Ocean Drift".to_string(),
            category: "sneakers".to_string(),
            selling_price: Price::from_cents(12999),
            sale_price: None,
            on_sale: false,
            image_url: None,
            color: None,
            available_sizes: vec![],
            available_colors: vec![],
        }
    }

    #[test]
    fn test_is_saved_reads_local_state() {
        let wishlist = store();
        let product = ProductId::new(uuid::Uuid::new_v4());
        assert!(!wishlist.is_saved(product));

        wishlist.write(|inner| inner.state.items.push(item(product)));
        assert!(wishlist.is_saved(product));
        assert_eq!(wishlist.item_count(), 1);
    }

    #[test]
    fn test_dedup_keeps_one_entry_per_product() {
        let product = ProductId::new(uuid::Uuid::new_v4());
        let other = ProductId::new(uuid::Uuid::new_v4());
        let items = dedup_by_product(vec![item(product), item(other), item(product)]);
        assert_eq!(items.len(), 2);
    }

    #[tokio::test]
    async fn test_move_to_cart_requires_size() {
        let wishlist = store();
        let err = wishlist
            .move_to_cart(ProductId::new(uuid::Uuid::new_v4()), &VariantChange::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::Validation);
        assert_eq!(err.message(), "Please select a size");
    }

    #[tokio::test]
    async fn test_failed_fetch_empties_wishlist() {
        let wishlist = store();
        let product = ProductId::new(uuid::Uuid::new_v4());
        wishlist.write(|inner| inner.state.items.push(item(product)));

        assert!(wishlist.fetch().await.is_err());
        assert!(wishlist.items().is_empty());
        assert!(!wishlist.is_saved(product));
    }

    #[tokio::test]
    async fn test_fetch_discarded_by_reset_still_reports_failure() {
        let wishlist = store();
        let product = ProductId::new(uuid::Uuid::new_v4());
        wishlist.write(|inner| inner.state.items.push(item(product)));

        let (fetched, ()) = tokio::join!(wishlist.fetch(), async { wishlist.reset() });

        assert_eq!(fetched.unwrap_err().kind(), FailureKind::Network);
        assert_eq!(wishlist.snapshot(), WishlistState::default());
    }

    #[test]
    fn test_reset_clears_items() {
        let wishlist = store();
        let product = ProductId::new(uuid::Uuid::new_v4());
        wishlist.write(|inner| inner.state.items.push(item(product)));
        wishlist.reset();
        assert_eq!(wishlist.snapshot(), WishlistState::default());
    }
}
