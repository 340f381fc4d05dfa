//! Decay rules - periodic or event-driven depletion of a stat

use super::{Catalog, RuleEntry, ShapeFilter};
use crate::carrier::Carrier;
use crate::types::{StatId, Tick};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecayTrigger {
    /// Fixed-interval clock tick
    Tick,
    /// The owner died
    Death,
    /// The carrier was repaired
    Repair,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecayOperation {
    /// value - magnitude, floored at 0
    Subtract,
    /// value * magnitude, rounded down
    Multiply,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecayRule {
    pub id: String,
    pub trigger: DecayTrigger,
    pub stat: StatId,
    pub operation: DecayOperation,
    pub magnitude: f64,
    /// For tick rules: fire when `tick % frequency == 0`. Absent means every tick.
    #[serde(default)]
    pub frequency: Option<Tick>,
    #[serde(default)]
    pub filter: Option<ShapeFilter>,
}

impl DecayRule {
    pub fn matches(&self, carrier: &Carrier) -> bool {
        self.filter.as_ref().map_or(true, |f| f.matches(carrier))
    }

    /// Whether a tick rule is due at `tick`; event rules are always due
    pub fn is_due(&self, tick: Tick) -> bool {
        match self.trigger {
            DecayTrigger::Tick => tick % self.frequency.unwrap_or(1).max(1) == 0,
            DecayTrigger::Death | DecayTrigger::Repair => true,
        }
    }

    /// Decayed value, never below 0
    pub fn apply(&self, value: i64) -> i64 {
        let next = match self.operation {
            DecayOperation::Subtract => value.saturating_sub(self.magnitude.round() as i64),
            DecayOperation::Multiply => (value as f64 * self.magnitude).floor() as i64,
        };
        next.max(0)
    }
}

impl RuleEntry for DecayRule {
    const KIND: &'static str = "decay";

    fn label(&self) -> String {
        self.id.clone()
    }

    fn validate(&self) -> Result<(), String> {
        if !self.magnitude.is_finite() || self.magnitude < 0.0 {
            return Err(format!("magnitude must be a non-negative number, got {}", self.magnitude));
        }
        if self.operation == DecayOperation::Multiply && self.magnitude > 1.0 {
            return Err(format!("multiply magnitude must be at most 1.0, got {}", self.magnitude));
        }
        if self.frequency == Some(0) {
            return Err("frequency must be at least 1".to_string());
        }
        if self.trigger != DecayTrigger::Tick && self.frequency.is_some() {
            return Err("frequency only applies to tick rules".to_string());
        }
        Ok(())
    }
}

/// Decay rules in load order
#[derive(Debug, Clone, Default)]
pub struct DecayCatalog {
    rules: Vec<DecayRule>,
}

impl DecayCatalog {
    pub fn for_trigger(&self, trigger: DecayTrigger) -> impl Iterator<Item = &DecayRule> {
        self.rules.iter().filter(move |r| r.trigger == trigger)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DecayRule> {
        self.rules.iter()
    }
}

impl Catalog for DecayCatalog {
    type Entry = DecayRule;

    fn build(entries: Vec<DecayRule>) -> Self {
        DecayCatalog { rules: entries }
    }

    fn len(&self) -> usize {
        self.rules.len()
    }
}
