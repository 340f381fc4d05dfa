//! CooldownLedger - Per-rule expiry ticks on a carrier

use crate::types::Tick;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Mapping rule id → absolute expiry tick
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CooldownLedger {
    expiries: HashMap<String, Tick>,
}

impl CooldownLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while `expiry > now`
    pub fn is_cooling(&self, rule_id: &str, now: Tick) -> bool {
        self.expiries
            .get(rule_id)
            .is_some_and(|expiry| *expiry > now)
    }

    pub fn expiry(&self, rule_id: &str) -> Option<Tick> {
        self.expiries.get(rule_id).copied()
    }

    /// Ticks left before the rule may fire again
    pub fn remaining(&self, rule_id: &str, now: Tick) -> Tick {
        self.expiry(rule_id)
            .map(|expiry| expiry.saturating_sub(now))
            .unwrap_or(0)
    }

    /// Start a cooldown of `length` ticks from `now`
    pub fn start(&mut self, rule_id: impl Into<String>, now: Tick, length: Tick) {
        self.expiries.insert(rule_id.into(), now.saturating_add(length));
    }

    /// Drop entries that have expired by `now`
    pub fn prune(&mut self, now: Tick) {
        self.expiries.retain(|_, expiry| *expiry > now);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Tick)> {
        self.expiries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.expiries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expiries.is_empty()
    }
}

impl FromIterator<(String, Tick)> for CooldownLedger {
    fn from_iter<T: IntoIterator<Item = (String, Tick)>>(iter: T) -> Self {
        CooldownLedger {
            expiries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cooldown_window() {
        let mut ledger = CooldownLedger::new();
        assert!(!ledger.is_cooling("thunder", 0));

        ledger.start("thunder", 5, 20);
        assert!(ledger.is_cooling("thunder", 5));
        assert!(ledger.is_cooling("thunder", 24));
        assert!(!ledger.is_cooling("thunder", 25));
        assert_eq!(ledger.remaining("thunder", 10), 15);
    }

    #[test]
    fn test_prune_removes_expired() {
        let mut ledger = CooldownLedger::new();
        ledger.start("a", 0, 5);
        ledger.start("b", 0, 50);
        ledger.prune(10);
        assert_eq!(ledger.len(), 1);
        assert!(ledger.expiry("b").is_some());
    }
}
