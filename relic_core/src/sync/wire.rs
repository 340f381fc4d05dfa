//! Compact observer encoding of carrier state

use super::{StatRegistry, SyncError};
use crate::carrier::{Carrier, CooldownLedger, UnlockSet};
use crate::stat_store::StatStore;
use crate::types::{CarrierId, Tick};
use serde::{Deserialize, Serialize};

/// The synchronised part of a carrier
#[derive(Debug, Clone, PartialEq)]
pub struct CarrierState {
    pub identity: Option<CarrierId>,
    pub stats: StatStore,
    pub milestones: UnlockSet,
    pub synergies: UnlockSet,
    pub cooldowns: CooldownLedger,
}

impl CarrierState {
    pub fn of(carrier: &Carrier) -> Self {
        CarrierState {
            identity: carrier.identity(),
            stats: carrier.stats().clone(),
            milestones: carrier.unlocked_milestones().clone(),
            synergies: carrier.unlocked_synergies().clone(),
            cooldowns: carrier.echo_cooldowns().clone(),
        }
    }

    /// Overwrite an observer's copy of the carrier with this state
    pub fn apply_to(self, carrier: &mut Carrier) {
        carrier.set_identity(self.identity);
        carrier.replace_stats(self.stats);
        carrier.replace_milestones(self.milestones);
        carrier.replace_synergies(self.synergies);
        carrier.replace_cooldowns(self.cooldowns);
    }
}

/// Wire form: stats by registry index, collections as plain lists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireCarrierState {
    pub identity: Option<CarrierId>,
    pub stats: Vec<(u32, i64)>,
    pub milestones: Vec<String>,
    pub synergies: Vec<String>,
    pub cooldowns: Vec<(String, Tick)>,
}

pub fn encode_state(registry: &StatRegistry, state: &CarrierState) -> Result<Vec<u8>, SyncError> {
    let stats = state
        .stats
        .iter()
        .map(|(stat, value)| {
            registry
                .index_of(stat)
                .map(|i| (i, value))
                .ok_or_else(|| SyncError::UnregisteredStat(stat.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let wire = WireCarrierState {
        identity: state.identity,
        stats,
        milestones: state.milestones.iter().map(str::to_string).collect(),
        synergies: state.synergies.iter().map(str::to_string).collect(),
        cooldowns: state
            .cooldowns
            .iter()
            .map(|(rule, expiry)| (rule.to_string(), expiry))
            .collect(),
    };
    Ok(bincode::serialize(&wire)?)
}

pub fn decode_state(registry: &StatRegistry, bytes: &[u8]) -> Result<CarrierState, SyncError> {
    let wire: WireCarrierState = bincode::deserialize(bytes)?;
    let stats = wire
        .stats
        .into_iter()
        .map(|(i, value)| {
            registry
                .stat_at(i)
                .map(|stat| (stat.clone(), value))
                .ok_or(SyncError::UnknownIndex(i))
        })
        .collect::<Result<StatStore, _>>()?;

    Ok(CarrierState {
        identity: wire.identity,
        stats,
        milestones: wire.milestones.into_iter().collect(),
        synergies: wire.synergies.into_iter().collect(),
        cooldowns: wire.cooldowns.into_iter().collect(),
    })
}
