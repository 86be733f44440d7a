//! Tab-scoped storage for the guest identifier.
//!
//! Unlike the durable store, nothing here is shared between sessions and no
//! change is ever announced: guest carts are deliberately local to the
//! session that created them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use greenshoes_core::GuestId;
use tracing::warn;

use super::GUEST_ID_KEY;
use super::store::{StoreError, load_map, write_map};

/// Holder of one session's guest identifier.
pub trait GuestStore: Send + Sync {
    /// The stored guest ID, if any.
    fn load(&self) -> Option<GuestId>;

    /// Replace the stored guest ID.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the ID could not be persisted. The in-memory
    /// value is updated regardless.
    fn store(&self, id: GuestId) -> Result<(), StoreError>;
}

/// Guest ID kept only in memory; gone when the session is dropped.
#[derive(Debug, Default)]
pub struct MemoryGuestStore {
    id: RwLock<Option<GuestId>>,
}

impl MemoryGuestStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl GuestStore for MemoryGuestStore {
    fn load(&self) -> Option<GuestId> {
        *self.id.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn store(&self, id: GuestId) -> Result<(), StoreError> {
        *self.id.write().unwrap_or_else(PoisonError::into_inner) = Some(id);
        Ok(())
    }
}

/// Guest ID persisted to a scratch file.
///
/// Lets one terminal session behave like one browser tab across separate
/// CLI invocations. Point it at a temporary directory so the guest session
/// ends with the machine session.
#[derive(Debug)]
pub struct FileGuestStore {
    path: PathBuf,
    id: RwLock<Option<GuestId>>,
}

impl FileGuestStore {
    /// Open the store at `path`.
    ///
    /// A missing or unreadable file simply means no guest ID yet; a new one
    /// is minted on first use.
    #[must_use]
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let id = match load_map(&path) {
            Ok(values) => values.get(GUEST_ID_KEY).and_then(|raw| raw.parse().ok()),
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable guest session file");
                None
            }
        };
        Self {
            path,
            id: RwLock::new(id),
        }
    }
}

impl GuestStore for FileGuestStore {
    fn load(&self) -> Option<GuestId> {
        *self.id.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn store(&self, id: GuestId) -> Result<(), StoreError> {
        *self.id.write().unwrap_or_else(PoisonError::into_inner) = Some(id);
        let values = HashMap::from([(GUEST_ID_KEY.to_string(), id.to_string())]);
        write_map(&self.path, &values)
    }
}
