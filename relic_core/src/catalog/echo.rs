//! Echo rules - cooldown-gated side effects fired by gameplay moments

use super::{Catalog, ParamBag, RuleEntry, ShapeFilter, StatRequirement};
use crate::carrier::Carrier;
use crate::types::Tick;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Gameplay moment reported by an external collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    Attack,
    Mine,
    Jump,
    Land,
    Interact,
}

impl TriggerKind {
    pub fn all() -> &'static [TriggerKind] {
        &[
            TriggerKind::Attack,
            TriggerKind::Mine,
            TriggerKind::Jump,
            TriggerKind::Land,
            TriggerKind::Interact,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            TriggerKind::Attack => "attack",
            TriggerKind::Mine => "mine",
            TriggerKind::Jump => "jump",
            TriggerKind::Land => "land",
            TriggerKind::Interact => "interact",
        }
    }
}

impl std::str::FromStr for TriggerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TriggerKind::all()
            .iter()
            .copied()
            .find(|k| k.name() == s)
            .ok_or_else(|| format!("unknown trigger '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EchoActionKind {
    AreaEffect,
    Strike,
    Spawn,
    PlaySound,
    ParticleBurst,
}

/// What an echo does; each kind reads its own subset of `params`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EchoAction {
    #[serde(rename = "type")]
    pub kind: EchoActionKind,
    #[serde(default)]
    pub params: ParamBag,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EchoRule {
    pub id: String,
    pub trigger: TriggerKind,
    /// Checked in order; all must hold
    #[serde(default)]
    pub conditions: Vec<StatRequirement>,
    pub action: EchoAction,
    /// Ticks before the rule may fire again on the same carrier
    #[serde(default)]
    pub cooldown: Tick,
    #[serde(default)]
    pub filter: Option<ShapeFilter>,
}

impl EchoRule {
    /// Cheap shape check done before any stat is read
    pub fn allows(&self, carrier: &Carrier) -> bool {
        self.filter.as_ref().map_or(true, |f| f.matches(carrier))
    }
}

impl RuleEntry for EchoRule {
    const KIND: &'static str = "echo";

    fn label(&self) -> String {
        self.id.clone()
    }

    fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("id is empty".to_string());
        }
        Ok(())
    }
}

/// Echo rules indexed by trigger, each list in load order
#[derive(Debug, Clone, Default)]
pub struct EchoCatalog {
    by_trigger: HashMap<TriggerKind, Vec<EchoRule>>,
    count: usize,
}

impl EchoCatalog {
    pub fn for_trigger(&self, trigger: TriggerKind) -> &[EchoRule] {
        self.by_trigger.get(&trigger).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = &EchoRule> {
        self.by_trigger.values().flatten()
    }
}

impl Catalog for EchoCatalog {
    type Entry = EchoRule;

    fn build(entries: Vec<EchoRule>) -> Self {
        let count = entries.len();
        let mut by_trigger: HashMap<TriggerKind, Vec<EchoRule>> = HashMap::new();
        for rule in entries {
            by_trigger.entry(rule.trigger).or_default().push(rule);
        }
        EchoCatalog { by_trigger, count }
    }

    fn len(&self) -> usize {
        self.count
    }
}
