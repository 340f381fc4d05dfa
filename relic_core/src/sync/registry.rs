//! StatRegistry - deterministic stat id <-> index mapping

use super::SyncError;
use crate::catalog::{parse_entries, ReloadReport, RewardAction, RuleEntry, RuleSnapshot};
use crate::types::StatId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// A declared stat from `stats.toml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatDefinition {
    pub id: StatId,
    #[serde(default)]
    pub name: Option<String>,
}

impl RuleEntry for StatDefinition {
    const KIND: &'static str = "stat";

    fn label(&self) -> String {
        self.id.to_string()
    }
}

/// Stats known to the session, indexed in sorted id order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatRegistry {
    ids: Vec<StatId>,
    index: HashMap<StatId, u32>,
    names: HashMap<StatId, String>,
}

impl StatRegistry {
    /// Declared stats plus every stat the loaded rules refer to
    pub fn build(raw: Vec<toml::Value>, rules: &RuleSnapshot) -> (Self, ReloadReport) {
        let (definitions, report) = parse_entries::<StatDefinition>(raw);

        let mut ids: BTreeSet<StatId> = definitions.iter().map(|d| d.id.clone()).collect();
        let reward_stats = |rewards: &[RewardAction]| -> Vec<StatId> {
            rewards
                .iter()
                .filter_map(|r| match r {
                    RewardAction::AddStat { stat, .. } => Some(stat.clone()),
                    _ => None,
                })
                .collect()
        };
        for milestone in rules.milestones.iter() {
            ids.insert(milestone.stat.clone());
            ids.extend(reward_stats(&milestone.rewards));
        }
        for synergy in rules.synergies.iter() {
            ids.extend(synergy.requires.keys().cloned());
            ids.extend(reward_stats(&synergy.rewards));
        }
        for echo in rules.echoes.iter() {
            ids.extend(echo.conditions.iter().map(|c| c.stat.clone()));
        }
        for decay in rules.decay.iter() {
            ids.insert(decay.stat.clone());
        }

        let mut registry = StatRegistry::from_ids(ids);
        for definition in definitions {
            if let Some(name) = definition.name {
                registry.names.insert(definition.id, name);
            }
        }
        (registry, report)
    }

    /// Registry over `ids`, deduplicated and sorted
    pub fn from_ids(ids: impl IntoIterator<Item = StatId>) -> Self {
        let ids: Vec<StatId> = ids.into_iter().collect::<BTreeSet<_>>().into_iter().collect();
        let index = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i as u32))
            .collect();
        StatRegistry {
            ids,
            index,
            names: HashMap::new(),
        }
    }

    /// Copy of this registry with `stat` appended after the existing
    /// indices, which stay stable for observers already holding them
    pub fn with_stat(&self, stat: &StatId) -> StatRegistry {
        let mut next = self.clone();
        next.push(stat.clone());
        next
    }

    /// Append every stat of `previous` this registry lacks
    pub fn carry_over(&mut self, previous: &StatRegistry) {
        for stat in &previous.ids {
            self.push(stat.clone());
        }
        for (stat, name) in &previous.names {
            self.names.entry(stat.clone()).or_insert_with(|| name.clone());
        }
    }

    fn push(&mut self, stat: StatId) {
        if self.index.contains_key(&stat) {
            return;
        }
        self.index.insert(stat.clone(), self.ids.len() as u32);
        self.ids.push(stat);
    }

    pub fn index_of(&self, stat: &StatId) -> Option<u32> {
        self.index.get(stat).copied()
    }

    pub fn stat_at(&self, index: u32) -> Option<&StatId> {
        self.ids.get(index as usize)
    }

    /// Declared display name, or the id's path
    pub fn display_name(&self, stat: &StatId) -> String {
        self.names
            .get(stat)
            .cloned()
            .unwrap_or_else(|| stat.path().replace('_', " "))
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &StatId)> {
        self.ids.iter().enumerate().map(|(i, id)| (i as u32, id))
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn to_sync(&self) -> RegistrySync {
        RegistrySync {
            entries: self.iter().map(|(i, id)| (i, id.clone())).collect(),
        }
    }

    /// Observer-side registry from a received payload.
    ///
    /// Indices must cover `0..entries.len()` exactly once each.
    pub fn from_sync(payload: RegistrySync) -> Result<Self, SyncError> {
        let count = payload.entries.len();
        let mut registry = StatRegistry::default();
        let mut slots: Vec<Option<StatId>> = vec![None; count];
        for (index, stat) in payload.entries {
            let i = index as usize;
            if i >= count {
                return Err(SyncError::UnknownIndex(index));
            }
            if slots[i].is_some() {
                return Err(SyncError::DuplicateIndex(index));
            }
            registry.index.insert(stat.clone(), index);
            slots[i] = Some(stat);
        }
        for (i, slot) in slots.into_iter().enumerate() {
            registry.ids.push(slot.ok_or(SyncError::UnknownIndex(i as u32))?);
        }
        Ok(registry)
    }
}

/// Registry payload sent on session join and after every reload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySync {
    pub entries: Vec<(u32, StatId)>,
}

impl RegistrySync {
    pub fn encode(&self) -> Result<Vec<u8>, SyncError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, SyncError> {
        Ok(bincode::deserialize(bytes)?)
    }
}
