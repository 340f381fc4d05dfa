//! Stat change notifications and unlock payloads

use super::{StatContext, StatEngine};
use crate::carrier::{Carrier, CarrierSlot};
use crate::types::{ActorRef, CarrierId, StatId};
use serde::{Deserialize, Serialize};

/// Published before a mutation is applied. Any listener may cancel it.
#[derive(Debug)]
pub struct PreStatChange<'a> {
    pub actor: Option<&'a ActorRef>,
    pub carrier: &'a Carrier,
    pub stat: &'a StatId,
    pub old: i64,
    pub new: i64,
    cancelled: bool,
}

impl<'a> PreStatChange<'a> {
    pub(crate) fn new(actor: Option<&'a ActorRef>, carrier: &'a Carrier, stat: &'a StatId, old: i64, new: i64) -> Self {
        PreStatChange {
            actor,
            carrier,
            stat,
            old,
            new,
            cancelled: false,
        }
    }

    /// Discard the mutation; the update returns the unchanged value
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

/// Published after a mutation has been applied
#[derive(Debug, Clone, PartialEq)]
pub struct PostStatChange {
    pub actor: Option<ActorRef>,
    pub slot: CarrierSlot,
    pub carrier: CarrierId,
    pub stat: StatId,
    pub old: i64,
    pub new: i64,
}

/// External subscriber to stat changes.
///
/// `on_post` runs as the first cascade stage and may re-enter the engine
/// through the context it is handed.
pub trait StatListener: Send + Sync {
    fn on_pre(&self, _event: &mut PreStatChange<'_>) {}

    fn on_post(&self, _engine: &StatEngine, _ctx: &mut StatContext<'_>, _event: &PostStatChange) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnlockKind {
    Milestone,
    Synergy,
}

/// Toast payload sent when a milestone or synergy unlocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnlockToast {
    pub kind: UnlockKind,
    /// Milestone key or synergy id
    pub key: String,
    pub actor: Option<ActorRef>,
    /// Snapshot of the carrier after the unlock
    pub carrier: Carrier,
    pub title: String,
    pub description: String,
}
