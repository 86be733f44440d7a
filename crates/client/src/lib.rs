//! Greenshoes storefront client library.
//!
//! Session identity, the REST client, and the cart and wishlist containers
//! that keep themselves synchronized with the server across identity
//! changes. [`Storefront`] bundles them for one shopper.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod identity;
pub mod notifier;
pub mod session;
pub mod state;
pub mod storefront;

pub use api::ApiClient;
pub use config::{ClientConfig, ConfigError};
pub use error::{ApiError, Failure, FailureKind, Outcome};
pub use identity::{Identity, RegisterForm};
pub use notifier::{IdentityTransition, Notifier};
pub use session::Session;
pub use state::{CartState, CartStore, SyncHandle, WishlistState, WishlistStore};
pub use storefront::{Storefront, StorefrontError};
