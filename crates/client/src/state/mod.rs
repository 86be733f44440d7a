//! Server-backed state containers.
//!
//! A container mirrors one server-side collection for the current
//! credential. Mutations never patch local state: every call that reaches
//! the API is followed by a full refetch, accepted or not, so what a
//! container holds always lags the server by exactly one round trip.
//!
//! Containers resynchronize on their own once [watched](CartStore::watch):
//! on every identity transition published in their session, and whenever
//! another session sharing the durable store changes the bearer token.

mod busy;
mod cart;
mod wishlist;

pub use cart::{CartState, CartStore, WISHLIST_LOGIN_MESSAGE};
pub use wishlist::{WishlistState, WishlistStore};

pub(crate) use busy::BusySet;

use std::future::Future;
use std::sync::{Arc, Weak};

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info_span};

use crate::session::{Session, TOKEN_KEY};

/// Message returned when a mutation targets an item that is already being
/// updated.
pub const BUSY_MESSAGE: &str = "Another update for this item is still in progress";

/// A container that can drop everything it holds, synchronously.
///
/// Sign-out calls this on every registered container before any request for
/// the new guest session is made.
pub trait Resettable: Send + Sync {
    /// Forget all state, as if freshly created.
    fn reset(&self);
}

/// A container that can re-read its collection from the server.
pub trait Refetch: Send + Sync + 'static {
    /// Replace local state with the server's current view.
    fn refetch(&self) -> impl Future<Output = ()> + Send;
}

/// Keeps a container's sync task alive. Dropping it unsubscribes.
#[derive(Debug)]
pub struct SyncHandle {
    task: JoinHandle<()>,
}

impl SyncHandle {
    /// Whether the sync task has stopped.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawn the task that refetches `container` on identity changes.
///
/// The task holds only a weak reference and stops once the container is
/// dropped. Storage changes made by this same session are ignored: a local
/// sign-in is already announced through the notifier.
///
/// Must be called within a Tokio runtime.
pub(crate) fn spawn_sync<C: Refetch>(
    container: &Arc<C>,
    session: &Session,
    name: &'static str,
) -> SyncHandle {
    let weak: Weak<C> = Arc::downgrade(container);
    let mut transitions = session.notifier().subscribe();
    let mut changes = session.storage_changes();
    let own_session = session.id();

    let task = tokio::spawn(
        async move {
            loop {
                let should_refetch = tokio::select! {
                    received = transitions.recv() => match received {
                        Ok(_) | Err(RecvError::Lagged(_)) => true,
                        Err(RecvError::Closed) => break,
                    },
                    received = changes.recv() => match received {
                        Ok(change) => change.key == TOKEN_KEY && change.origin != own_session,
                        Err(RecvError::Lagged(_)) => true,
                        Err(RecvError::Closed) => break,
                    },
                };
                if !should_refetch {
                    continue;
                }
                let Some(container) = weak.upgrade() else {
                    break;
                };
                debug!("Identity changed; refetching");
                container.refetch().await;
            }
            debug!("Sync task stopped");
        }
        .instrument(info_span!("container_sync", container = name)),
    );

    SyncHandle { task }
}
