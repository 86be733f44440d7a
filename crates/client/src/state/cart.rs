//! Cart state container.

use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

use greenshoes_core::CartItemId;
use tracing::{debug, instrument, warn};

use super::{BUSY_MESSAGE, BusySet, Refetch, Resettable, SyncHandle, spawn_sync};
use crate::api::ApiClient;
use crate::api::types::{AddToCart, CartItem, CartSummary, VariantChange};
use crate::error::{ApiError, Failure, FailureKind, Outcome};

/// Message returned to guests trying to save a cart line for later.
pub const WISHLIST_LOGIN_MESSAGE: &str = "Please log in to save items to your wishlist";

/// What the cart container currently holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartState {
    pub items: Vec<CartItem>,
    /// Totals from the last successful fetch; `None` when empty or unknown.
    pub summary: Option<CartSummary>,
    /// A fetch is in flight.
    pub loading: bool,
}

#[derive(Debug, Default)]
struct Inner {
    state: CartState,
    /// Bumped by `reset`; fetches started under an older epoch are dropped.
    epoch: u64,
}

/// Mirror of the server-side cart for the session's current credential.
#[derive(Debug)]
pub struct CartStore {
    api: ApiClient,
    inner: RwLock<Inner>,
    busy: BusySet<CartItemId>,
}

impl CartStore {
    /// Create an empty container. Call [`CartStore::fetch`] to load it.
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
        spawn_sync(self, self.api.session(), "cart")
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> CartState {
        self.read(|inner| inner.state.clone())
    }

    /// Current line items.
    #[must_use]
    pub fn items(&self) -> Vec<CartItem> {
        self.read(|inner| inner.state.items.clone())
    }

    /// Number of lines (not units), for the header badge.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.read(|inner| inner.state.items.len())
    }

    /// Whether a fetch is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.read(|inner| inner.state.loading)
    }

    /// Whether a mutation of `item` is in flight.
    #[must_use]
    pub fn is_busy(&self, item: CartItemId) -> bool {
        self.busy.contains(item)
    }

    // =========================================================================
    // Fetch
    // =========================================================================

    /// Load the cart from the server.
    ///
    /// On failure the cart becomes empty rather than keeping stale lines.
    ///
    /// # Errors
    ///
    /// Returns a `Failure` describing why the cart could not be loaded.
    #[instrument(skip(self))]
    pub async fn fetch(&self) -> Outcome {
        let epoch = self.write(|inner| {
            inner.state.loading = true;
            inner.epoch
        });

        let result = self.api.get_cart().await;

        self.write(|inner| {
            if inner.epoch != epoch {
                debug!("Discarding cart fetched before reset");
                return result
                    .map(drop)
                    .map_err(|e| Failure::from_api(&e, "Failed to load cart"));
            }
            inner.state.loading = false;
            match result {
                Ok(cart) => {
                    debug!(items = cart.items.len(), "Fetched cart");
                    inner.state.items = cart.items;
                    inner.state.summary = cart.summary;
                    Ok(())
                }
                Err(e) => {
                    warn!(error = %e, "Failed to fetch cart; showing it empty");
                    inner.state.items.clear();
                    inner.state.summary = None;
                    Err(Failure::from_api(&e, "Failed to load cart"))
                }
            }
        })
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add a product variant.
    ///
    /// # Errors
    ///
    /// Returns a `Failure` with the server's reason (e.g. out of stock) or
    /// "Failed to add to cart".
    #[instrument(skip(self), fields(product_id = %item.product_id))]
    pub async fn add_item(&self, item: &AddToCart) -> Outcome {
        if item.quantity == 0 {
            return Err(Failure::validation("Quantity must be at least 1"));
        }
        let result = self.api.add_to_cart(item).await;
        self.settle(result, "Failed to add to cart").await
    }

    /// Add one unit of `item`.
    ///
    /// # Errors
    ///
    /// Returns a `Failure` if the item is busy or the API refuses.
    #[instrument(skip(self))]
    pub async fn increase_quantity(&self, item: CartItemId) -> Outcome {
        let _guard = self.busy.try_acquire(item).ok_or_else(busy)?;
        let result = self.api.increase_cart_item(item).await;
        self.settle(result, "Failed to update quantity").await
    }

    /// Remove one unit of `item`; the server drops the line at zero.
    ///
    /// # Errors
    ///
    /// Returns a `Failure` if the item is busy or the API refuses.
    #[instrument(skip(self))]
    pub async fn decrease_quantity(&self, item: CartItemId) -> Outcome {
        let _guard = self.busy.try_acquire(item).ok_or_else(busy)?;
        let result = self.api.decrease_cart_item(item).await;
        self.settle(result, "Failed to update quantity").await
    }

    /// Remove the line entirely.
    ///
    /// # Errors
    ///
    /// Returns a `Failure` if the item is busy or the API refuses.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, item: CartItemId) -> Outcome {
        let _guard = self.busy.try_acquire(item).ok_or_else(busy)?;
        let result = self.api.remove_cart_item(item).await;
        self.settle(result, "Failed to remove item").await
    }

    /// Switch the line to another color and/or size.
    ///
    /// # Errors
    ///
    /// Returns a `Failure` if nothing was requested, the item is busy, or the
    /// combination has no stock.
    #[instrument(skip(self))]
    pub async fn change_variant(&self, item: CartItemId, variant: &VariantChange) -> Outcome {
        if variant.color.is_none() && variant.size.is_none() {
            return Err(Failure::validation("Choose a color or size"));
        }
        let _guard = self.busy.try_acquire(item).ok_or_else(busy)?;
        let result = self.api.change_cart_variant(item, variant).await;
        self.settle(result, "Failed to change variant").await
    }

    /// Move the line to the wishlist. Signed-in accounts only; guests get a
    /// failure without any request being made.
    ///
    /// # Errors
    ///
    /// Returns a `Failure` for guests, when busy, or if the API refuses.
    #[instrument(skip(self))]
    pub async fn move_to_wishlist(&self, item: CartItemId) -> Outcome {
        if !self.api.session().is_authenticated() {
            return Err(Failure::unauthorized(WISHLIST_LOGIN_MESSAGE));
        }
        let _guard = self.busy.try_acquire(item).ok_or_else(busy)?;
        let result = self.api.move_cart_item_to_wishlist(item).await;
        self.settle(result, "Failed to move to wishlist").await
    }

    /// Drop local contents after a successful checkout. The server empties
    /// the cart itself.
    pub fn clear(&self) {
        self.write(|inner| {
            inner.state.items.clear();
            inner.state.summary = None;
        });
    }

    /// Refetch after a mutation reached the API, then report the mutation's
    /// own result.
    ///
    /// The refetch runs whether or not the API accepted the mutation. Its
    /// failure is logged by `fetch` and leaves the cart empty; it never
    /// replaces the mutation's result.
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

fn busy() -> Failure {
    Failure::new(FailureKind::Busy, BUSY_MESSAGE)
}

impl Resettable for CartStore {
    fn reset(&self) {
        self.write(|inner| {
            inner.state = CartState::default();
            inner.epoch += 1;
        });
    }
}

impl Refetch for CartStore {
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

    fn store() -> CartStore {
        // Port 9 (discard) refuses connections, so any request fails fast.
        let config = ClientConfig::new("http://127.0.0.1:9").unwrap();
        CartStore::new(ApiClient::new(&config, Session::in_memory()).unwrap())
    }

    #[tokio::test]
    async fn test_guest_cannot_move_to_wishlist() {
        let cart = store();
        let err = cart
            .move_to_wishlist(CartItemId::new(uuid::Uuid::new_v4()))
            .await
            .unwrap_err();
        assert_eq!(err.message(), WISHLIST_LOGIN_MESSAGE);
        assert_eq!(err.kind(), FailureKind::Unauthorized);
    }

    #[tokio::test]
    async fn test_busy_item_is_refused() {
        let cart = store();
        let item = CartItemId::new(uuid::Uuid::new_v4());
        let _guard = cart.busy.try_acquire(item).unwrap();

        assert!(cart.is_busy(item));
        let err = cart.increase_quantity(item).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Busy);
        assert_eq!(err.message(), BUSY_MESSAGE);
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_cart_empty() {
        let cart = store();
        let summary = CartSummary {
            subtotal: greenshoes_core::Price::from_cents(100),
            tax: greenshoes_core::Price::ZERO,
            shipping: greenshoes_core::Price::ZERO,
            total: greenshoes_core::Price::from_cents(100),
        };
        cart.write(|inner| inner.state.summary = Some(summary));

        let err = cart.fetch().await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Network);
        assert_eq!(cart.snapshot(), CartState::default());
    }

    #[tokio::test]
    async fn test_zero_quantity_is_rejected_locally() {
        let cart = store();
        let err = cart
            .add_item(&AddToCart {
                product_id: greenshoes_core::ProductId::new(uuid::Uuid::new_v4()),
                color: "Blue".to_string(),
                size: "9".to_string(),
                quantity: 0,
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::Validation);
    }

    #[tokio::test]
    async fn test_fetch_discarded_by_reset_still_reports_failure() {
        let cart = store();

        let (fetched, ()) = tokio::join!(cart.fetch(), async { cart.reset() });

        let err = fetched.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Network);
        assert_eq!(cart.snapshot(), CartState::default());
    }

    #[test]
    fn test_reset_bumps_epoch() {
        let cart = store();
        let before = cart.read(|inner| inner.epoch);
        cart.reset();
        assert_eq!(cart.read(|inner| inner.epoch), before + 1);
        assert_eq!(cart.item_count(), 0);
    }
}
