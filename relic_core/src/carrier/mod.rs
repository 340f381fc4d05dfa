//! Carrier - An item that owns stat, unlock and cooldown state

mod cooldown;
mod host;
mod unlock;

pub use cooldown::CooldownLedger;
pub use host::{CarrierHost, CarrierSlot, Inventory, SlotParseError};
pub use unlock::UnlockSet;

use crate::stat_store::StatStore;
use crate::types::{CarrierId, StatId, Tick};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Provenance of a carrier across transformations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarrierHistory {
    /// Tick at which the carrier first received an identity
    #[serde(default)]
    pub created_at: Option<Tick>,
    /// Kinds this carrier's lineage has been, oldest first
    #[serde(default)]
    pub lineage: Vec<String>,
    /// Number of transformations in the lineage
    #[serde(default)]
    pub transformations: u32,
    /// Identities this carrier replaced without keeping their progress
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub superseded: Vec<CarrierId>,
}

/// An addressable item that can hold per-item state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Carrier {
    /// Item type, e.g. `relic:iron_pickaxe`
    pub kind: String,
    /// Stack size. Only single-unit stacks can hold state.
    pub count: u32,
    /// Item tags used by shape filters, e.g. `pickaxes`
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub custom_name: Option<String>,
    /// Durability used so far
    #[serde(default)]
    pub damage: u32,
    /// 0 means the item has no durability
    #[serde(default)]
    pub max_damage: u32,

    #[serde(default)]
    identity: Option<CarrierId>,
    #[serde(default)]
    stats: StatStore,
    #[serde(default)]
    unlocked_milestones: UnlockSet,
    #[serde(default)]
    unlocked_synergies: UnlockSet,
    #[serde(default)]
    echo_cooldowns: CooldownLedger,
    #[serde(default)]
    history: CarrierHistory,
}

impl Carrier {
    /// Single-unit carrier of the given kind
    pub fn new(kind: impl Into<String>) -> Self {
        Carrier {
            kind: kind.into(),
            count: 1,
            tags: BTreeSet::new(),
            custom_name: None,
            damage: 0,
            max_damage: 0,
            identity: None,
            stats: StatStore::new(),
            unlocked_milestones: UnlockSet::new(),
            unlocked_synergies: UnlockSet::new(),
            echo_cooldowns: CooldownLedger::new(),
            history: CarrierHistory::default(),
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    pub fn with_durability(mut self, max_damage: u32) -> Self {
        self.max_damage = max_damage;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.custom_name = Some(name.into());
        self
    }

    /// Empty slots and air hold nothing
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Whether per-item state can be attached to this carrier
    pub fn can_hold_state(&self) -> bool {
        self.count == 1
    }

    pub fn display_name(&self) -> &str {
        self.custom_name.as_deref().unwrap_or(&self.kind)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    // === Identity ===

    pub fn identity(&self) -> Option<CarrierId> {
        self.identity
    }

    pub(crate) fn set_identity(&mut self, identity: Option<CarrierId>) {
        self.identity = identity;
    }

    /// Identity of this carrier, assigning a fresh one on first use
    pub fn ensure_identity(&mut self, now: Tick) -> CarrierId {
        match self.identity {
            Some(id) => id,
            None => {
                let id = CarrierId::new_random();
                self.identity = Some(id);
                self.history.created_at.get_or_insert(now);
                id
            }
        }
    }

    // === Stats ===

    pub fn stats(&self) -> &StatStore {
        &self.stats
    }

    /// Read a value straight from the built-in store
    pub fn stat(&self, id: &StatId) -> i64 {
        self.stats.get(id)
    }

    /// Swap in a new stat store
    pub fn replace_stats(&mut self, stats: StatStore) {
        self.stats = stats;
    }

    // === Unlocks ===

    pub fn unlocked_milestones(&self) -> &UnlockSet {
        &self.unlocked_milestones
    }

    pub fn unlocked_synergies(&self) -> &UnlockSet {
        &self.unlocked_synergies
    }

    pub(crate) fn replace_milestones(&mut self, set: UnlockSet) {
        self.unlocked_milestones = set;
    }

    pub(crate) fn replace_synergies(&mut self, set: UnlockSet) {
        self.unlocked_synergies = set;
    }

    pub(crate) fn unlock_synergy(&mut self, key: &str) -> bool {
        self.unlocked_synergies.unlock(key)
    }

    // === Cooldowns ===

    pub fn echo_cooldowns(&self) -> &CooldownLedger {
        &self.echo_cooldowns
    }

    pub(crate) fn replace_cooldowns(&mut self, ledger: CooldownLedger) {
        self.echo_cooldowns = ledger;
    }

    pub fn history(&self) -> &CarrierHistory {
        &self.history
    }

    /// Build the replacement for this carrier from a template.
    ///
    /// The replacement's milestone set always contains `unlocked_key`. With
    /// `keep_progress` it also inherits stats, both unlock sets, cooldowns,
    /// identity and history; otherwise it starts fresh apart from that key.
    pub fn transform_into(&self, template: &CarrierTemplate, unlocked_key: &str, keep_progress: bool) -> Carrier {
        let mut next = template.instantiate();

        if keep_progress {
            next.identity = self.identity;
            next.stats = self.stats.clone();
            next.unlocked_milestones = self.unlocked_milestones.seeded_with(unlocked_key);
            next.unlocked_synergies = self.unlocked_synergies.clone();
            next.echo_cooldowns = self.echo_cooldowns.clone();
            next.history = self.history.clone();
            if next.custom_name.is_none() {
                next.custom_name = self.custom_name.clone();
            }
        } else {
            next.unlocked_milestones = UnlockSet::new().seeded_with(unlocked_key);
            next.history.lineage = self.history.lineage.clone();
            next.history.transformations = self.history.transformations;
            next.history.superseded = self.history.superseded.clone();
            next.history.superseded.extend(self.identity);
        }

        next.history.lineage.push(self.kind.clone());
        next.history.transformations += 1;
        next
    }
}

/// Data-defined blueprint for a replacement carrier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarrierTemplate {
    pub kind: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub max_damage: u32,
}

impl CarrierTemplate {
    pub fn instantiate(&self) -> Carrier {
        let mut carrier = Carrier::new(self.kind.clone()).with_durability(self.max_damage);
        carrier.custom_name = self.name.clone();
        carrier.tags = self.tags.iter().cloned().collect();
        carrier
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kills() -> StatId {
        StatId::parse("kills").unwrap()
    }

    fn veteran_blade() -> CarrierTemplate {
        CarrierTemplate {
            kind: "relic:veteran_blade".to_string(),
            name: None,
            tags: vec!["swords".to_string()],
            max_damage: 500,
        }
    }

    #[test]
    fn test_state_requires_single_unit() {
        assert!(Carrier::new("relic:sword").can_hold_state());
        assert!(!Carrier::new("relic:arrow").with_count(16).can_hold_state());
        assert!(Carrier::new("relic:air").with_count(0).is_empty());
    }

    #[test]
    fn test_identity_is_assigned_once() {
        let mut carrier = Carrier::new("relic:sword");
        assert!(carrier.identity().is_none());
        let first = carrier.ensure_identity(7);
        let second = carrier.ensure_identity(9);
        assert_eq!(first, second);
        assert_eq!(carrier.history().created_at, Some(7));
    }

    #[test]
    fn test_transform_keeping_progress() {
        let mut old = Carrier::new("relic:iron_sword").with_name("Biter");
        old.ensure_identity(0);
        old.replace_stats(old.stats().with(&kills(), 100));

        let next = old.transform_into(&veteran_blade(), "kills/100", true);

        assert_eq!(next.kind, "relic:veteran_blade");
        assert_eq!(next.identity(), old.identity());
        assert_eq!(next.stat(&kills()), 100);
        assert!(next.unlocked_milestones().contains("kills/100"));
        assert_eq!(next.display_name(), "Biter");
        assert_eq!(next.history().lineage, vec!["relic:iron_sword".to_string()]);
        assert_eq!(next.history().transformations, 1);
        assert!(next.has_tag("swords"));
    }

    #[test]
    fn test_transform_without_progress_still_seeds_key() {
        let mut old = Carrier::new("relic:iron_sword");
        old.ensure_identity(0);
        old.replace_stats(old.stats().with(&kills(), 100));

        let next = old.transform_into(&veteran_blade(), "kills/100", false);

        assert_eq!(next.identity(), None);
        assert_eq!(next.stat(&kills()), 0);
        assert_eq!(next.unlocked_milestones().len(), 1);
        assert!(next.unlocked_milestones().contains("kills/100"));
    }
}
