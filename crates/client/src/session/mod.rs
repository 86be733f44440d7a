//! Session identity: who the current shopper is.
//!
//! A [`Session`] is the explicit context every API call reads its credential
//! from. It combines:
//!
//! - a **durable store** (bearer token + cached profile) that may be shared
//!   with other sessions, like `localStorage` between browser tabs
//! - a **guest store** private to this session, like `sessionStorage`
//! - the [`Notifier`] that announces identity transitions to this
//!   session's state containers
//! - a `login_required` flag raised when the API rejects the credential
//! - the containers to empty whenever the shopper stops being signed in
//!
//! # Example
//!
//! ```rust
//! use greenshoes_client::session::Session;
//!
//! let session = Session::in_memory();
//! let first = session.guest_id();
//! assert_eq!(first, session.guest_id());
//! assert!(!session.resolve_credential().is_authenticated());
//! ```

mod ephemeral;
mod store;

pub use ephemeral::{FileGuestStore, GuestStore, MemoryGuestStore};
pub use store::{DurableStore, FileDurableStore, MemoryDurableStore, StorageChange, StoreError};

use core::fmt;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use greenshoes_core::{BearerToken, Credential, GuestId, UserProfile};
use tokio::sync::{broadcast, watch};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::notifier::Notifier;
use crate::state::Resettable;

/// Durable key holding the bearer token.
pub const TOKEN_KEY: &str = "greenshoes_token";

/// Durable key holding the cached profile (JSON).
pub const USER_KEY: &str = "greenshoes_user";

/// Guest store key holding the guest identifier.
pub const GUEST_ID_KEY: &str = "greenshoes_guest_id";

/// Identifies one session handle as the origin of a storage change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Mint a new random session ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Shared session context.
///
/// Cheaply cloneable via `Arc`; clones refer to the same session.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    id: SessionId,
    durable: Arc<dyn DurableStore>,
    guest: Arc<dyn GuestStore>,
    notifier: Notifier,
    login_required: watch::Sender<bool>,
    containers: Mutex<Vec<Weak<dyn Resettable>>>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.inner.id)
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create a session over the given stores.
    #[must_use]
    pub fn new(durable: Arc<dyn DurableStore>, guest: Arc<dyn GuestStore>) -> Self {
        let (login_required, _) = watch::channel(false);
        Self {
            inner: Arc::new(SessionInner {
                id: SessionId::new(),
                durable,
                guest,
                notifier: Notifier::new(),
                login_required,
                containers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// A fully in-memory session with its own stores.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryDurableStore::new()),
            Arc::new(MemoryGuestStore::new()),
        )
    }

    /// Open another session sharing this one's durable store but with a
    /// fresh guest store, like opening a second browser tab.
    #[must_use]
    pub fn new_tab(&self) -> Self {
        Self::new(
            Arc::clone(&self.inner.durable),
            Arc::new(MemoryGuestStore::new()),
        )
    }

    /// This session's origin tag.
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.inner.id
    }

    /// Identity-transition channel for this session.
    #[must_use]
    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }

    // =========================================================================
    // Credential resolution
    // =========================================================================

    /// The credential to attach to the next request.
    ///
    /// A stored bearer token wins; otherwise the guest ID, created on first
    /// use. Reads only in-memory state.
    #[must_use]
    pub fn resolve_credential(&self) -> Credential {
        self.bearer_token()
            .map_or_else(|| Credential::Guest(self.guest_id()), Credential::Bearer)
    }

    /// The stored bearer token, if signed in.
    #[must_use]
    pub fn bearer_token(&self) -> Option<BearerToken> {
        self.inner
            .durable
            .get(TOKEN_KEY)
            .filter(|token| !token.is_empty())
            .map(BearerToken::new)
    }

    /// Whether a bearer token is stored.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.bearer_token().is_some()
    }

    /// This session's guest ID, minted and stored on first use.
    ///
    /// Stable until [`Session::regenerate_guest_id`].
    #[must_use]
    pub fn guest_id(&self) -> GuestId {
        if let Some(id) = self.inner.guest.load() {
            return id;
        }
        let id = GuestId::generate();
        if let Err(e) = self.inner.guest.store(id) {
            warn!(error = %e, "Failed to persist guest id; using it for this session only");
        }
        debug!(guest_id = %id, "Created guest session");
        id
    }

    /// Replace the guest ID with a new one. The old ID is never reused.
    pub fn regenerate_guest_id(&self) -> GuestId {
        let id = GuestId::generate();
        if let Err(e) = self.inner.guest.store(id) {
            warn!(error = %e, "Failed to persist regenerated guest id");
        }
        id
    }

    /// The cached profile of the signed-in account.
    ///
    /// `None` for guests, even if a stale profile is still stored.
    #[must_use]
    pub fn current_user(&self) -> Option<UserProfile> {
        if !self.is_authenticated() {
            return None;
        }
        let raw = self.inner.durable.get(USER_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable cached profile");
                None
            }
        }
    }

    // =========================================================================
    // Credential persistence
    // =========================================================================

    /// Persist a freshly issued token and profile.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if either value could not be persisted.
    pub fn store_auth(&self, token: &BearerToken, user: &UserProfile) -> Result<(), StoreError> {
        let profile = serde_json::to_string(user)?;
        self.inner
            .durable
            .set(TOKEN_KEY, token.expose().to_string(), self.inner.id)?;
        self.inner.durable.set(USER_KEY, profile, self.inner.id)
    }

    /// Forget the stored token and profile.
    ///
    /// Storage errors are logged; the in-memory credential is gone either way.
    pub fn clear_auth(&self) {
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.inner.durable.remove(key, self.inner.id) {
                warn!(key, error = %e, "Failed to persist credential removal");
            }
        }
    }

    /// Listen for changes to the durable store from any session.
    #[must_use]
    pub fn storage_changes(&self) -> broadcast::Receiver<StorageChange> {
        self.inner.durable.subscribe()
    }

    // =========================================================================
    // Login prompt
    // =========================================================================

    /// Watch the "credential rejected, send the shopper to login" flag.
    #[must_use]
    pub fn login_required(&self) -> watch::Receiver<bool> {
        self.inner.login_required.subscribe()
    }

    /// Whether the shopper must sign in again.
    #[must_use]
    pub fn needs_login(&self) -> bool {
        *self.inner.login_required.borrow()
    }

    /// Drop the credential after the API rejected it and raise the login
    /// prompt.
    ///
    /// Registered containers are emptied before this returns, then told to
    /// resync under the guest identity.
    pub fn invalidate(&self) {
        self.clear_auth();
        let reset = self.reset_containers();
        self.inner.login_required.send_replace(true);
        self.inner.notifier.publish();
        debug!(containers = reset, "Session invalidated");
    }

    /// Lower the login prompt after a successful sign-in.
    pub fn clear_login_required(&self) {
        self.inner.login_required.send_replace(false);
    }

    // =========================================================================
    // Per-user containers
    // =========================================================================

    /// Reset `container` whenever this session loses its account, for as
    /// long as the container is alive.
    pub fn register_container<C: Resettable + 'static>(&self, container: &Arc<C>) {
        let container: Arc<dyn Resettable> = container.clone();
        let mut containers = self
            .inner
            .containers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        containers.retain(|c| c.strong_count() > 0);
        containers.push(Arc::downgrade(&container));
    }

    /// Synchronously reset every live registered container.
    ///
    /// Returns how many were reset.
    pub fn reset_containers(&self) -> usize {
        let containers: Vec<Arc<dyn Resettable>> = self
            .inner
            .containers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter_map(Weak::upgrade)
            .collect();
        for container in &containers {
            container.reset();
        }
        containers.len()
    }
}
