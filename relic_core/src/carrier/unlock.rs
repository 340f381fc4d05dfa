//! UnlockSet - Monotonic set of achieved milestone/synergy keys

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Keys of achieved milestones (`stat/threshold`) or synergies (synergy id).
///
/// There is no removal API: a key, once inserted, stays for the lifetime of
/// the carrier it belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnlockSet {
    keys: HashSet<String>,
}

impl UnlockSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Insert a key, returning true if it was not present before
    pub fn unlock(&mut self, key: impl Into<String>) -> bool {
        self.keys.insert(key.into())
    }

    /// Copy of this set with `key` added
    pub fn seeded_with(&self, key: impl Into<String>) -> UnlockSet {
        let mut seeded = self.clone();
        seeded.unlock(key);
        seeded
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    /// Keys in sorted order
    pub fn sorted(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.keys.iter().cloned().collect();
        keys.sort();
        keys
    }
}

impl FromIterator<String> for UnlockSet {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        UnlockSet {
            keys: iter.into_iter().collect(),
        }
    }
}
