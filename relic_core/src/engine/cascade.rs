//! Post-change cascade stages

use crate::carrier::{Carrier, CarrierHost, CarrierSlot};
use crate::types::{CarrierId, StatId};

/// One pass of the post-change cascade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeStage {
    /// External `StatListener::on_post` subscribers
    Listeners,
    Milestones,
    Synergies,
    /// Attribute/enchantment recomputation hooks
    Recompute,
}

/// Fixed stage order. A superseding milestone switches every later stage to
/// the replacement carrier; a detached carrier ends the cascade.
pub const CASCADE_ORDER: [CascadeStage; 4] = [
    CascadeStage::Listeners,
    CascadeStage::Milestones,
    CascadeStage::Synergies,
    CascadeStage::Recompute,
];

/// Peripheral consumer that derives carrier data from its stats
pub trait RecomputeHook: Send + Sync {
    fn name(&self) -> &str;

    fn recompute(&self, carrier: &mut Carrier, changed: &StatId);
}

/// Result of one milestone pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MilestoneOutcome {
    /// Number of milestones unlocked in place (possibly zero)
    InPlace(usize),
    /// The carrier was replaced; later stages must use the replacement
    Superseded { slot: CarrierSlot, identity: CarrierId },
    /// The carrier could no longer be found in its host
    Detached,
}

/// Current slot of the carrier with `identity`: the expected slot first, then a scan
pub(crate) fn resolve(host: &dyn CarrierHost, expected: CarrierSlot, identity: CarrierId) -> Option<CarrierSlot> {
    match host.carrier(expected).and_then(Carrier::identity) {
        Some(found) if found == identity => Some(expected),
        _ => host.locate(identity),
    }
}
