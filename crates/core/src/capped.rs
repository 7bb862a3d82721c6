//! Bounded, oldest-first-evicting log.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::VecDeque;

/// An ordered log that holds at most `N` entries.
///
/// Pushing past capacity drops the oldest entries. Deserializing an
/// over-long sequence keeps only the newest `N`, so a stored blob written
/// by an older build can never break the bound.
#[derive(Debug, Clone, PartialEq)]
pub struct CappedLog<T, const N: usize> {
    items: VecDeque<T>,
}

impl<T, const N: usize> CappedLog<T, N> {
    /// Create an empty log.
    pub fn new() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }

    /// Maximum number of entries kept.
    pub const fn capacity() -> usize {
        N
    }

    /// Append an entry, evicting the oldest ones if over capacity.
    pub fn push(&mut self, item: T) {
        self.items.push_back(item);
        while self.items.len() > N {
            self.items.pop_front();
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.items.iter()
    }

    /// Oldest entry.
    pub fn first(&self) -> Option<&T> {
        self.items.front()
    }

    /// Newest entry.
    pub fn last(&self) -> Option<&T> {
        self.items.back()
    }
}

impl<T, const N: usize> Default for CappedLog<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> FromIterator<T> for CappedLog<T, N> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut log = Self::new();
        for item in iter {
            log.push(item);
        }
        log
    }
}

impl<T: Serialize, const N: usize> Serialize for CappedLog<T, N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.items.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>, const N: usize> Deserialize<'de> for CappedLog<T, N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let items = VecDeque::<T>::deserialize(deserializer)?;
        Ok(items.into_iter().collect())
    }
}
