//! Command implementations.

pub mod account;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod output;
pub mod wishlist;

use std::path::PathBuf;
use std::sync::Arc;

use greenshoes_client::session::{FileDurableStore, FileGuestStore, StoreError};
use greenshoes_client::{Failure, Session, Storefront, StorefrontError};
use thiserror::Error;

pub use account::{AddressAction, CardAction, OrderAction};
pub use cart::CartAction;
pub use checkout::CheckoutFlow;
pub use wishlist::WishlistAction;

/// Errors that can end a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The storefront refused or could not complete the operation.
    #[error(transparent)]
    Failure(#[from] Failure),

    /// The client could not be set up.
    #[error(transparent)]
    Setup(#[from] StorefrontError),

    /// The session file could not be opened.
    #[error(transparent)]
    Session(#[from] StoreError),
}

/// Open the persisted session and build a storefront around it.
///
/// The durable file holds the sign-in and outlives the guest file, which
/// lives in the temp directory like a browser tab's session storage.
pub fn open_storefront() -> Result<Storefront, CommandError> {
    let durable = FileDurableStore::open(durable_path())?;
    let guest = FileGuestStore::open(guest_path());
    let session = Session::new(Arc::new(durable), Arc::new(guest));
    Ok(Storefront::from_env(session)?)
}

fn durable_path() -> PathBuf {
    std::env::var_os("GREENSHOES_SESSION_FILE").map_or_else(
        || {
            std::env::var_os("HOME")
                .map_or_else(std::env::temp_dir, PathBuf::from)
                .join(".greenshoes")
                .join("session.json")
        },
        PathBuf::from,
    )
}

fn guest_path() -> PathBuf {
    std::env::var_os("GREENSHOES_GUEST_FILE").map_or_else(
        || std::env::temp_dir().join("greenshoes-guest.json"),
        PathBuf::from,
    )
}
