//! One shopper's view of the store.
//!
//! [`Storefront`] wires a [`Session`] to the API client, the identity
//! resolver, and the cart and wishlist containers, and keeps those
//! containers synchronized for as long as it lives. Every operation returns
//! an [`Outcome`]; nothing here panics or surfaces raw transport errors.

use std::sync::Arc;

use greenshoes_core::{AddressId, CardNumber, CartItemId, GuestId, OrderId, ProductId, UserProfile};
use tracing::{debug, instrument, warn};

use crate::api::types::{
    Address, AddressForm, Order, OrderConfirmation, Product, ProductDetail, ProductQuery,
    SavedCard, VariantChange,
};
use crate::api::{ApiClient, CheckoutError, CheckoutRequest};
use crate::config::{ClientConfig, ConfigError};
use crate::error::{ApiError, Failure, FailureKind, Outcome};
use crate::identity::{Identity, RegisterForm};
use crate::session::Session;
use crate::state::{CartStore, SyncHandle, WishlistStore};

/// Errors that can occur while building a [`Storefront`].
#[derive(Debug, thiserror::Error)]
pub enum StorefrontError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// A session plus everything that acts on its behalf.
#[derive(Debug)]
pub struct Storefront {
    api: ApiClient,
    identity: Identity,
    cart: Arc<CartStore>,
    wishlist: Arc<WishlistStore>,
    _sync: [SyncHandle; 2],
}

impl Storefront {
    /// Build a storefront for `session` and start container sync.
    ///
    /// Containers start empty; call [`Storefront::refresh`] to load them.
    /// Must be called within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError` if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig, session: Session) -> Result<Self, StorefrontError> {
        let api = ApiClient::new(config, session)?;
        let identity = Identity::new(api.clone());
        let cart = Arc::new(CartStore::new(api.clone()));
        let wishlist = Arc::new(WishlistStore::new(api.clone()));

        identity.register_container(&cart);
        identity.register_container(&wishlist);
        let sync = [cart.watch(), wishlist.watch()];

        Ok(Self {
            api,
            identity,
            cart,
            wishlist,
            _sync: sync,
        })
    }

    /// Build from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError` if configuration is missing or invalid.
    pub fn from_env(session: Session) -> Result<Self, StorefrontError> {
        Self::new(&ClientConfig::from_env()?, session)
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        self.api.session()
    }

    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    #[must_use]
    pub const fn identity(&self) -> &Identity {
        &self.identity
    }

    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.cart
    }

    #[must_use]
    pub fn wishlist(&self) -> &WishlistStore {
        &self.wishlist
    }

    /// Load both containers.
    ///
    /// # Errors
    ///
    /// Returns the first failure; both fetches always run.
    pub async fn refresh(&self) -> Outcome {
        let (cart, wishlist) = tokio::join!(self.cart.fetch(), self.wishlist.fetch());
        cart.and(wishlist)
    }

    // =========================================================================
    // Identity
    // =========================================================================

    /// See [`Identity::login`].
    ///
    /// # Errors
    ///
    /// Returns a `Failure` if the credentials are refused.
    pub async fn login(&self, email_or_username: &str, password: &str) -> Outcome<UserProfile> {
        self.identity.login(email_or_username, password).await
    }

    /// See [`Identity::register`].
    ///
    /// # Errors
    ///
    /// Returns a `Failure` if the form is invalid or the API refuses it.
    pub async fn register(&self, form: &RegisterForm) -> Outcome<UserProfile> {
        self.identity.register(form).await
    }

    /// See [`Identity::logout`].
    pub fn logout(&self) -> GuestId {
        self.identity.logout()
    }

    // =========================================================================
    // Cross-container moves
    // =========================================================================

    /// Move a saved product into the cart; both containers are refetched.
    ///
    /// # Errors
    ///
    /// Returns a `Failure` if no size was chosen or the API refuses.
    #[instrument(skip(self))]
    pub async fn move_wishlist_to_cart(
        &self,
        product: ProductId,
        variant: &VariantChange,
    ) -> Outcome {
        self.wishlist.move_to_cart(product, variant).await?;
        let _ = self.cart.fetch().await;
        Ok(())
    }

    /// Move a cart line into the wishlist; both containers are refetched.
    ///
    /// # Errors
    ///
    /// Returns a `Failure` for guests or if the API refuses.
    #[instrument(skip(self))]
    pub async fn move_cart_item_to_wishlist(&self, item: CartItemId) -> Outcome {
        self.cart.move_to_wishlist(item).await?;
        let _ = self.wishlist.fetch().await;
        Ok(())
    }

    // =========================================================================
    // Checkout and orders
    // =========================================================================

    /// Place an order. On success the local cart is emptied.
    ///
    /// # Errors
    ///
    /// Returns a validation `Failure` for an incomplete form or invalid card,
    /// otherwise the server's reason or "Checkout failed".
    #[instrument(skip_all, fields(flow = request.flow()))]
    pub async fn checkout(&self, request: &CheckoutRequest) -> Outcome<OrderConfirmation> {
        let confirmation = self.api.checkout(request).await.map_err(checkout_failure)?;
        self.cart.clear();
        debug!("Cleared local cart after checkout");
        Ok(confirmation)
    }

    /// # Errors
    ///
    /// Returns a `Failure` if the orders cannot be loaded.
    pub async fn orders(&self) -> Outcome<Vec<Order>> {
        self.api
            .list_orders()
            .await
            .map_err(|e| Failure::from_api(&e, "Failed to load orders"))
    }

    /// # Errors
    ///
    /// Returns a `Failure` if the order cannot be loaded.
    pub async fn order(&self, id: OrderId) -> Outcome<Order> {
        self.api
            .get_order(id)
            .await
            .map_err(|e| Failure::from_api(&e, "Failed to load order"))
    }

    /// Put a past order's items back in the cart, then refetch the cart.
    ///
    /// # Errors
    ///
    /// Returns a `Failure` if the API refuses.
    #[instrument(skip(self))]
    pub async fn reorder(&self, id: OrderId) -> Outcome {
        self.api
            .reorder(id)
            .await
            .map_err(|e| Failure::from_api(&e, "Failed to reorder"))?;
        let _ = self.cart.fetch().await;
        Ok(())
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// # Errors
    ///
    /// Returns a `Failure` if the products cannot be loaded.
    pub async fn products(&self, query: &ProductQuery) -> Outcome<Vec<Product>> {
        self.api
            .list_products(query)
            .await
            .map_err(|e| Failure::from_api(&e, "Failed to load products"))
    }

    /// # Errors
    ///
    /// Returns a `Failure` if the product cannot be loaded.
    pub async fn product(&self, id: ProductId) -> Outcome<ProductDetail> {
        self.api
            .get_product(id)
            .await
            .map_err(|e| Failure::from_api(&e, "Failed to load product"))
    }

    // =========================================================================
    // Addresses
    // =========================================================================

    /// # Errors
    ///
    /// Returns a `Failure` if the addresses cannot be loaded.
    pub async fn addresses(&self) -> Outcome<Vec<Address>> {
        self.api
            .list_addresses()
            .await
            .map_err(|e| Failure::from_api(&e, "Failed to load addresses"))
    }

    /// # Errors
    ///
    /// Returns a `Failure` if required fields are blank or the API refuses.
    pub async fn add_address(&self, form: &AddressForm) -> Outcome<Address> {
        require_address_fields(form)?;
        self.api
            .add_address(form)
            .await
            .map_err(|e| Failure::from_api(&e, "Failed to save address"))
    }

    /// # Errors
    ///
    /// Returns a `Failure` if required fields are blank or the API refuses.
    pub async fn update_address(&self, id: AddressId, form: &AddressForm) -> Outcome {
        require_address_fields(form)?;
        self.api
            .update_address(id, form)
            .await
            .map_err(|e| Failure::from_api(&e, "Failed to save address"))
    }

    /// # Errors
    ///
    /// Returns a `Failure` if the API refuses.
    pub async fn delete_address(&self, id: AddressId) -> Outcome {
        self.api
            .delete_address(id)
            .await
            .map_err(|e| Failure::from_api(&e, "Failed to delete address"))
    }

    /// # Errors
    ///
    /// Returns a `Failure` if the API refuses.
    pub async fn set_default_address(&self, id: AddressId) -> Outcome {
        self.api
            .set_default_address(id)
            .await
            .map_err(|e| Failure::from_api(&e, "Failed to set default address"))
    }

    // =========================================================================
    // Saved card
    // =========================================================================

    /// # Errors
    ///
    /// Returns a `Failure` if the card cannot be loaded.
    pub async fn saved_card(&self) -> Outcome<Option<SavedCard>> {
        self.api
            .get_saved_card()
            .await
            .map_err(|e| Failure::from_api(&e, "Failed to load saved card"))
    }

    /// Store a card for future checkouts, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns a validation `Failure` if a field is blank or the number
    /// fails the Luhn check; otherwise the server's reason.
    pub async fn save_card(&self, number: &str, expiry: &str, cvc: &str) -> Outcome {
        if [number, expiry, cvc].iter().any(|f| f.trim().is_empty()) {
            return Err(Failure::validation("Please fill in all payment fields"));
        }
        let number = CardNumber::parse(number).map_err(|e| Failure::validation(e.to_string()))?;
        self.api
            .save_card(&number, expiry.trim(), cvc.trim())
            .await
            .map_err(|e| Failure::from_api(&e, "Failed to save card"))
    }

    /// # Errors
    ///
    /// Returns a `Failure` if the API refuses.
    pub async fn delete_saved_card(&self) -> Outcome {
        self.api
            .delete_saved_card()
            .await
            .map_err(|e| Failure::from_api(&e, "Failed to remove card"))
    }
}

fn checkout_failure(err: CheckoutError) -> Failure {
    match err {
        CheckoutError::Api(e) => Failure::from_api(&e, "Checkout failed"),
        CheckoutError::MissingOrder => {
            warn!("Checkout succeeded without an order in the response");
            Failure::new(FailureKind::Unexpected, "Checkout failed")
        }
        local => Failure::validation(local.to_string()),
    }
}

fn require_address_fields(form: &AddressForm) -> Outcome {
    let required = [
        &form.full_name,
        &form.phone,
        &form.address1,
        &form.city,
        &form.state,
        &form.postal_code,
    ];
    if required.iter().any(|field| field.trim().is_empty()) {
        return Err(Failure::validation("Please fill in all required fields"));
    }
    Ok(())
}
