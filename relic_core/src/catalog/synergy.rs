//! Synergies - unlocks that need several stats at once

use super::{Catalog, RewardAction, RuleEntry, ShapeFilter};
use crate::carrier::Carrier;
use crate::types::StatId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Synergy {
    pub id: String,
    /// Every stat must be at least its minimum
    #[serde(default)]
    pub requires: HashMap<StatId, i64>,
    #[serde(default)]
    pub filter: Option<ShapeFilter>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sound: Option<String>,
    #[serde(default)]
    pub rewards: Vec<RewardAction>,
}

impl Synergy {
    pub fn matches(&self, carrier: &Carrier) -> bool {
        self.filter.as_ref().map_or(true, |f| f.matches(carrier))
    }

    pub fn title(&self) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| "Synergy unlocked".to_string())
    }

    pub fn description(&self) -> String {
        self.description.clone().unwrap_or_else(|| self.id.clone())
    }
}

impl RuleEntry for Synergy {
    const KIND: &'static str = "synergy";

    fn label(&self) -> String {
        self.id.clone()
    }

    fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("id is empty".to_string());
        }
        if self.requires.is_empty() {
            return Err("requires at least one stat".to_string());
        }
        Ok(())
    }
}

/// Synergies in load order
#[derive(Debug, Clone, Default)]
pub struct SynergyCatalog {
    synergies: Vec<Synergy>,
}

impl SynergyCatalog {
    pub fn iter(&self) -> impl Iterator<Item = &Synergy> {
        self.synergies.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Synergy> {
        self.synergies.iter().find(|s| s.id == id)
    }
}

impl Catalog for SynergyCatalog {
    type Entry = Synergy;

    fn build(entries: Vec<Synergy>) -> Self {
        SynergyCatalog { synergies: entries }
    }

    fn len(&self) -> usize {
        self.synergies.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::parse_entries;

    #[test]
    fn test_parse_synergy() {
        let file: crate::config::RuleFile = toml::from_str(
            r#"
[[synergy]]
id = "warlord"
title = "Warlord"

[synergy.requires]
kills = 50
"relic:blocks_mined" = 200

[[synergy]]
id = "empty"
"#,
        )
        .unwrap();

        let (entries, report) = parse_entries::<Synergy>(file.synergies);
        assert_eq!(entries.len(), 1);
        assert_eq!(report.rejected.len(), 1);
        let warlord = &entries[0];
        assert_eq!(warlord.requires.get(&"kills".parse().unwrap()), Some(&50));
        assert_eq!(warlord.description(), "warlord");

        let catalog = SynergyCatalog::build(entries);
        assert!(catalog.get("warlord").is_some());
    }
}
