//! Unlock side effects shared by milestones and synergies

use super::cascade::resolve;
use super::{StatContext, StatEngine, UnlockKind, UnlockToast};
use crate::carrier::CarrierSlot;
use crate::catalog::RewardAction;
use crate::types::{ActorRef, CarrierId};
use crate::world::WorldError;
use tracing::{debug, warn};

/// What to do once a rule has unlocked
pub(crate) struct Unlock<'r> {
    pub kind: UnlockKind,
    pub key: String,
    pub title: String,
    pub description: String,
    pub rename: Option<&'r str>,
    pub sound: Option<&'r str>,
    pub rewards: &'r [RewardAction],
}

/// Rename, toast, sound, then rewards in declaration order.
///
/// Each failed side effect is logged and skipped; the rest still run.
pub(crate) fn apply(
    engine: &StatEngine,
    ctx: &mut StatContext<'_>,
    slot: CarrierSlot,
    identity: CarrierId,
    unlock: Unlock<'_>,
) {
    if let (Some(name), Some(carrier)) = (unlock.rename, ctx.host.carrier_mut(slot)) {
        carrier.custom_name = Some(name.to_string());
    }

    let owner = ctx.host.owner().cloned();
    if let Some(carrier) = ctx.host.carrier(slot) {
        ctx.world.notify(UnlockToast {
            kind: unlock.kind,
            key: unlock.key.clone(),
            actor: owner.clone(),
            carrier: carrier.clone(),
            title: unlock.title,
            description: unlock.description,
        });
    }

    if let Some(sound) = unlock.sound {
        match &owner {
            Some(actor) => {
                if let Err(error) = ctx.world.play_sound(sound, actor.position, 1.0, 1.0) {
                    warn!(%error, key = %unlock.key, "skipping unlock sound");
                }
            }
            None => debug!(key = %unlock.key, "no owner to play unlock sound for"),
        }
    }

    for reward in unlock.rewards {
        grant(engine, ctx, slot, identity, owner.as_ref(), reward, &unlock.key);
    }
}

fn grant(
    engine: &StatEngine,
    ctx: &mut StatContext<'_>,
    slot: CarrierSlot,
    identity: CarrierId,
    owner: Option<&ActorRef>,
    reward: &RewardAction,
    key: &str,
) {
    let result = match reward {
        RewardAction::GiveItem { item, count } => owner
            .ok_or(WorldError::NoActor)
            .and_then(|actor| ctx.world.give_item(actor, item, *count)),
        RewardAction::Experience { amount } => owner
            .ok_or(WorldError::NoActor)
            .and_then(|actor| ctx.world.grant_experience(actor, *amount)),
        RewardAction::Command { command } => ctx.world.run_command(owner, command),
        RewardAction::Effect {
            effect,
            duration,
            amplifier,
        } => owner
            .ok_or(WorldError::NoActor)
            .and_then(|actor| ctx.world.apply_effect(actor, effect, *duration, *amplifier)),
        RewardAction::AddStat { stat, amount } => {
            // an earlier reward may have moved or replaced the carrier
            let Some(slot) = resolve(&*ctx.host, slot, identity) else {
                debug!(key, %stat, "carrier gone, skipping stat reward");
                return;
            };
            if let Err(error) = engine.increment_stat(ctx, slot, stat, *amount) {
                warn!(%error, key, %stat, "skipping stat reward");
            }
            return;
        }
    };

    if let Err(error) = result {
        warn!(%error, key, "skipping reward");
    }
}
