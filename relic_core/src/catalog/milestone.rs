//! Milestones - one-time unlocks when a stat crosses a threshold

use super::{Catalog, RewardAction, RuleEntry, ShapeFilter};
use crate::carrier::{Carrier, CarrierTemplate};
use crate::types::StatId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub stat: StatId,
    pub threshold: i64,
    #[serde(default)]
    pub filter: Option<ShapeFilter>,
    /// New custom name for the carrier
    #[serde(default)]
    pub rename: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sound: Option<String>,
    #[serde(default)]
    pub rewards: Vec<RewardAction>,
    /// Replace the carrier with a new one built from this template
    #[serde(default)]
    pub replace_with: Option<CarrierTemplate>,
    /// Carry stats, unlocks and identity over to the replacement
    #[serde(default = "default_keep_progress")]
    pub keep_progress: bool,
}

fn default_keep_progress() -> bool {
    true
}

impl Milestone {
    /// Unlock key, `stat/threshold`, e.g. `kills/10` or `farming:crops/25`
    pub fn key(&self) -> String {
        format!("{}/{}", self.stat.short(), self.threshold)
    }

    pub fn matches(&self, carrier: &Carrier) -> bool {
        self.filter.as_ref().map_or(true, |f| f.matches(carrier))
    }

    pub fn transforms(&self) -> bool {
        self.replace_with.is_some()
    }

    pub fn title(&self) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| "Milestone reached".to_string())
    }

    pub fn description(&self) -> String {
        self.description
            .clone()
            .unwrap_or_else(|| format!("{} {}", self.threshold, self.stat.path().replace('_', " ")))
    }
}

impl RuleEntry for Milestone {
    const KIND: &'static str = "milestone";

    fn label(&self) -> String {
        self.key()
    }

    fn validate(&self) -> Result<(), String> {
        if self.threshold <= 0 {
            return Err(format!("threshold must be positive, got {}", self.threshold));
        }
        if let Some(template) = &self.replace_with {
            if template.kind.trim().is_empty() {
                return Err("replace_with.kind is empty".to_string());
            }
        }
        Ok(())
    }
}

/// Milestones grouped by stat, each group in load order
#[derive(Debug, Clone, Default)]
pub struct MilestoneCatalog {
    by_stat: HashMap<StatId, Vec<Milestone>>,
    count: usize,
}

impl MilestoneCatalog {
    pub fn for_stat(&self, stat: &StatId) -> &[Milestone] {
        self.by_stat.get(stat).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn stats(&self) -> impl Iterator<Item = &StatId> {
        self.by_stat.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Milestone> {
        self.by_stat.values().flatten()
    }
}

impl Catalog for MilestoneCatalog {
    type Entry = Milestone;

    fn build(entries: Vec<Milestone>) -> Self {
        let count = entries.len();
        let mut by_stat: HashMap<StatId, Vec<Milestone>> = HashMap::new();
        for milestone in entries {
            by_stat.entry(milestone.stat.clone()).or_default().push(milestone);
        }
        MilestoneCatalog { by_stat, count }
    }

    fn len(&self) -> usize {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::parse_entries;

    #[test]
    fn test_parse_transforming_milestone() {
        let file: crate::config::RuleFile = toml::from_str(
            r#"
[[milestone]]
stat = "kills"
threshold = 100
title = "Veteran"
sound = "relic:fanfare"
replace_with = { kind = "relic:veteran_blade", tags = ["swords"] }

[milestone.filter]
tags = ["swords"]

[[milestone.rewards]]
type = "experience"
amount = 50
"#,
        )
        .unwrap();

        let (entries, report) = parse_entries::<Milestone>(file.milestones);
        assert!(report.is_clean());
        let milestone = &entries[0];
        assert_eq!(milestone.key(), "kills/100");
        assert!(milestone.transforms());
        assert!(milestone.keep_progress);
        assert_eq!(milestone.title(), "Veteran");
        assert_eq!(milestone.rewards, vec![RewardAction::Experience { amount: 50 }]);
    }

    #[test]
    fn test_catalog_keeps_load_order_per_stat() {
        let kills: StatId = "kills".parse().unwrap();
        let make = |threshold| Milestone {
            stat: kills.clone(),
            threshold,
            filter: None,
            rename: None,
            title: None,
            description: None,
            sound: None,
            rewards: Vec::new(),
            replace_with: None,
            keep_progress: true,
        };

        let catalog = MilestoneCatalog::build(vec![make(50), make(10), make(100)]);
        let thresholds: Vec<_> = catalog.for_stat(&kills).iter().map(|m| m.threshold).collect();
        assert_eq!(thresholds, vec![50, 10, 100]);
        assert_eq!(catalog.len(), 3);
        assert_eq!(make(10).description(), "10 kills");
    }
}
