//! StatStore - Immutable stat id → value mapping attached to a carrier

mod merge;
mod provider;

pub use merge::MergePolicy;
pub use provider::{DefaultStatProvider, DurabilityProvider, ProviderChain, StatProvider};

use crate::types::StatId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Copy-on-write stat mapping. Absent keys read as 0.
///
/// Every write produces a fresh store; existing clones keep seeing the
/// values they were created with.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "HashMap<StatId, i64>", into = "HashMap<StatId, i64>")]
pub struct StatStore {
    values: Arc<HashMap<StatId, i64>>,
}

impl StatStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value for a stat, 0 when absent
    pub fn get(&self, id: &StatId) -> i64 {
        self.values.get(id).copied().unwrap_or(0)
    }

    pub fn contains(&self, id: &StatId) -> bool {
        self.values.contains_key(id)
    }

    /// New store with `id` set to `value`
    pub fn with(&self, id: &StatId, value: i64) -> StatStore {
        let mut values = HashMap::clone(&self.values);
        values.insert(id.clone(), value);
        StatStore {
            values: Arc::new(values),
        }
    }

    /// New store where `policy(old, delta)` replaces the entry for `id`
    pub fn merge(&self, id: &StatId, delta: i64, policy: MergePolicy) -> StatStore {
        self.with(id, policy.apply(self.get(id), delta))
    }

    /// Pairwise SUM of two stores
    pub fn merged_with(&self, other: &StatStore) -> StatStore {
        let mut values = HashMap::clone(&self.values);
        for (id, value) in other.iter() {
            let entry = values.entry(id.clone()).or_insert(0);
            *entry = entry.saturating_add(value);
        }
        StatStore {
            values: Arc::new(values),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StatId, i64)> {
        self.values.iter().map(|(k, v)| (k, *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Entries sorted by stat id, for display
    pub fn sorted(&self) -> Vec<(StatId, i64)> {
        let mut entries: Vec<_> = self.iter().map(|(k, v)| (k.clone(), v)).collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}

impl PartialEq for StatStore {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl Eq for StatStore {}

impl FromIterator<(StatId, i64)> for StatStore {
    fn from_iter<T: IntoIterator<Item = (StatId, i64)>>(iter: T) -> Self {
        StatStore {
            values: Arc::new(iter.into_iter().collect()),
        }
    }
}

impl From<HashMap<StatId, i64>> for StatStore {
    fn from(values: HashMap<StatId, i64>) -> Self {
        StatStore {
            values: Arc::new(values),
        }
    }
}

impl From<StatStore> for HashMap<StatId, i64> {
    fn from(store: StatStore) -> Self {
        Arc::try_unwrap(store.values).unwrap_or_else(|shared| HashMap::clone(&shared))
    }
}

/// Pairwise SUM merge of two stat mappings
pub fn merge_stats(a: &StatStore, b: &StatStore) -> StatStore {
    a.merged_with(b)
}
