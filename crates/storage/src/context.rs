//! Application context shared by the tracker, the engine and the session.

use folio_core::{Clock, SessionId, SystemClock};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Storage handle shared between components.
pub type SharedStorage<S> = Arc<Mutex<S>>;

/// Keys the persisted blobs live under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageKeys {
    /// Interaction statistics
    pub interactions: String,
    /// Evolution history
    pub history: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            interactions: "portfolioInteractions".to_string(),
            history: "portfolioEvolutionHistory".to_string(),
        }
    }
}

/// Everything a component needs from its surroundings.
///
/// Built once per session and cloned into each component; clones share
/// the same storage and clock.
pub struct AppContext<S> {
    /// Shared storage backend
    pub storage: SharedStorage<S>,
    /// Time source
    pub clock: Arc<dyn Clock>,
    /// Current session
    pub session: SessionId,
    /// Blob keys
    pub keys: StorageKeys,
}

impl<S> AppContext<S> {
    /// Context over `storage` with the wall clock and default keys.
    pub fn new(storage: S) -> Self {
        Self::with_clock(storage, Arc::new(SystemClock))
    }

    /// Context over `storage` with a specific clock.
    pub fn with_clock(storage: S, clock: Arc<dyn Clock>) -> Self {
        Self {
            storage: Arc::new(Mutex::new(storage)),
            clock,
            session: SessionId::new(),
            keys: StorageKeys::default(),
        }
    }

    /// Replace the storage keys.
    pub fn with_keys(mut self, keys: StorageKeys) -> Self {
        self.keys = keys;
        self
    }
}

impl<S> Clone for AppContext<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            clock: Arc::clone(&self.clock),
            session: self.session,
            keys: self.keys.clone(),
        }
    }
}

impl<S> std::fmt::Debug for AppContext<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("session", &self.session)
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}
