//! Building blocks shared by several rule kinds

use crate::carrier::Carrier;
use crate::types::StatId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Restricts a rule to carriers of certain kinds or tags.
///
/// An empty filter accepts every carrier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeFilter {
    #[serde(default)]
    pub items: HashSet<String>,
    #[serde(default)]
    pub tags: HashSet<String>,
}

impl ShapeFilter {
    pub fn matches(&self, carrier: &Carrier) -> bool {
        if self.items.is_empty() && self.tags.is_empty() {
            return true;
        }
        self.items.contains(&carrier.kind) || carrier.tags.iter().any(|t| self.tags.contains(t))
    }
}

/// `stat >= min`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatRequirement {
    pub stat: StatId,
    pub min: i64,
}

/// Reward granted when a milestone or synergy unlocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RewardAction {
    GiveItem {
        item: String,
        #[serde(default = "default_count")]
        count: u32,
    },
    Experience {
        amount: u32,
    },
    Command {
        command: String,
    },
    /// Status effect on the owning actor
    Effect {
        effect: String,
        #[serde(default = "default_effect_duration")]
        duration: u32,
        #[serde(default)]
        amplifier: u8,
    },
    /// Add to a stat on the same carrier, through the normal mutation path
    AddStat {
        stat: StatId,
        amount: i64,
    },
}

fn default_count() -> u32 {
    1
}

fn default_effect_duration() -> u32 {
    200
}

/// Loosely typed action parameters with per-key defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamBag(pub toml::Table);

impl ParamBag {
    pub fn str_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.0.get(key).and_then(toml::Value::as_str).unwrap_or(default)
    }

    /// Integers are accepted where a float is expected
    pub fn f64_or(&self, key: &str, default: f64) -> f64 {
        match self.0.get(key) {
            Some(toml::Value::Float(f)) => *f,
            Some(toml::Value::Integer(i)) => *i as f64,
            _ => default,
        }
    }

    /// Negative or oversized integers fall back to the default
    pub fn u32_or(&self, key: &str, default: u32) -> u32 {
        self.0
            .get(key)
            .and_then(toml::Value::as_integer)
            .and_then(|i| u32::try_from(i).ok())
            .unwrap_or(default)
    }

    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        self.0.get(key).and_then(toml::Value::as_bool).unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_accepts_all() {
        assert!(ShapeFilter::default().matches(&Carrier::new("relic:anything")));
    }

    #[test]
    fn test_filter_by_item_or_tag() {
        let filter: ShapeFilter = toml::from_str(
            r#"
items = ["relic:diamond_pickaxe"]
tags = ["swords"]
"#,
        )
        .unwrap();

        assert!(filter.matches(&Carrier::new("relic:diamond_pickaxe")));
        assert!(filter.matches(&Carrier::new("relic:iron_sword").with_tag("swords")));
        assert!(!filter.matches(&Carrier::new("relic:iron_pickaxe").with_tag("pickaxes")));
    }

    #[test]
    fn test_param_bag_defaults() {
        let bag: ParamBag = toml::from_str(
            r#"
radius = 6
count = -3
sound = "relic:bell"
"#,
        )
        .unwrap();

        assert!((bag.f64_or("radius", 4.0) - 6.0).abs() < f64::EPSILON);
        assert_eq!(bag.u32_or("count", 16), 16);
        assert_eq!(bag.str_or("sound", "relic:echo"), "relic:bell");
        assert_eq!(bag.str_or("particle", "relic:spark"), "relic:spark");
        assert!(!bag.bool_or("visual_only", false));
    }

    #[test]
    fn test_reward_actions_parse() {
        #[derive(Deserialize)]
        struct Holder {
            rewards: Vec<RewardAction>,
        }
        let holder: Holder = toml::from_str(
            r#"
[[rewards]]
type = "give_item"
item = "relic:emerald"

[[rewards]]
type = "add_stat"
stat = "prestige"
amount = 1
"#,
        )
        .unwrap();

        assert_eq!(
            holder.rewards[0],
            RewardAction::GiveItem {
                item: "relic:emerald".to_string(),
                count: 1
            }
        );
        assert!(matches!(holder.rewards[1], RewardAction::AddStat { amount: 1, .. }));
    }
}
