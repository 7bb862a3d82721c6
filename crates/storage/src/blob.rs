//! Typed JSON blobs on top of [`Storage`].

use crate::{Result, Storage};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

/// Result of reading a typed blob.
///
/// Loading never fails; callers decide what to do with each case.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome<T> {
    /// Value read and parsed
    Loaded(T),
    /// Nothing stored under the key
    Absent,
    /// Stored value could not be parsed
    Corrupt(String),
    /// Backend failed to read
    Unavailable(String),
}

impl<T> LoadOutcome<T> {
    /// Whether a value was loaded.
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadOutcome::Loaded(_))
    }

    /// The loaded value, if any.
    pub fn loaded(self) -> Option<T> {
        match self {
            LoadOutcome::Loaded(value) => Some(value),
            _ => None,
        }
    }
}

impl<T: Default> LoadOutcome<T> {
    /// Take the loaded value or fall back to defaults, logging why.
    pub fn or_default_logged(self, key: &str) -> T {
        match self {
            LoadOutcome::Loaded(value) => value,
            LoadOutcome::Absent => {
                debug!(key, "nothing stored, starting from defaults");
                T::default()
            }
            LoadOutcome::Corrupt(reason) => {
                warn!(key, %reason, "stored value is corrupt, resetting to defaults");
                T::default()
            }
            LoadOutcome::Unavailable(reason) => {
                warn!(key, %reason, "storage unavailable, using defaults");
                T::default()
            }
        }
    }
}

/// Read and parse the JSON blob under `key`.
pub async fn load_json<T, S>(storage: &S, key: &str) -> LoadOutcome<T>
where
    T: DeserializeOwned,
    S: Storage + ?Sized,
{
    match storage.get(key).await {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(value) => LoadOutcome::Loaded(value),
            Err(e) => LoadOutcome::Corrupt(e.to_string()),
        },
        Ok(None) => LoadOutcome::Absent,
        Err(e) => LoadOutcome::Unavailable(e.to_string()),
    }
}

/// Serialize `value` as JSON and store it under `key`.
pub async fn save_json<T, S>(storage: &mut S, key: &str, value: &T) -> Result<()>
where
    T: Serialize + ?Sized + Sync,
    S: Storage + ?Sized,
{
    let json = serde_json::to_string(value)?;
    storage.set(key, &json).await
}
