//! Synergy pass - all-of multi-stat unlocks

use super::cascade::resolve;
use super::effects::{self, Unlock};
use super::{StatContext, StatEngine, UnlockKind};
use crate::carrier::CarrierSlot;
use crate::catalog::SynergyCatalog;
use crate::types::CarrierId;
use tracing::info;

/// Check every synergy against the carrier's current stats
pub(crate) fn evaluate(
    engine: &StatEngine,
    ctx: &mut StatContext<'_>,
    catalog: &SynergyCatalog,
    slot: CarrierSlot,
    identity: CarrierId,
) {
    let providers = engine.providers();

    for synergy in catalog.iter() {
        let Some(slot) = resolve(&*ctx.host, slot, identity) else {
            return;
        };
        let Some(carrier) = ctx.host.carrier(slot) else {
            return;
        };
        if carrier.unlocked_synergies().contains(&synergy.id) || !synergy.matches(carrier) {
            continue;
        }
        let satisfied = synergy
            .requires
            .iter()
            .all(|(stat, min)| providers.get_stat(carrier, stat) >= *min);
        if !satisfied {
            continue;
        }

        info!(synergy = %synergy.id, "synergy unlocked");
        if let Some(carrier) = ctx.host.carrier_mut(slot) {
            carrier.unlock_synergy(&synergy.id);
        }
        effects::apply(
            engine,
            ctx,
            slot,
            identity,
            Unlock {
                kind: UnlockKind::Synergy,
                key: synergy.id.clone(),
                title: synergy.title(),
                description: synergy.description(),
                rename: None,
                sound: synergy.sound.as_deref(),
                rewards: &synergy.rewards,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use crate::carrier::{Carrier, CarrierHost, CarrierSlot, Inventory};
    use crate::config::{EngineConfig, RuleSource};
    use crate::engine::{StatContext, StatEngine, UnlockKind};
    use crate::types::StatId;
    use crate::world::RecordingWorld;

    const BERSERKER: &str = r#"
[[synergy]]
id = "berserker"

[synergy.requires]
kills = 5
damage_dealt = 100
"#;

    #[test]
    fn test_unlocks_only_when_all_requirements_hold() {
        let engine = StatEngine::new(EngineConfig::default());
        engine.reload(&RuleSource::Documents(vec![BERSERKER.to_string()]).load().unwrap());
        let mut inv = Inventory::default().with_hand(Carrier::new("relic:axe"));
        let mut world = RecordingWorld::new();
        let mut ctx = StatContext::new(&mut inv, &mut world, 0);
        let kills = StatId::parse("kills").unwrap();
        let damage = StatId::parse("damage_dealt").unwrap();

        engine.increment_stat(&mut ctx, CarrierSlot::Hand, &kills, 10).unwrap();
        assert!(ctx.host.carrier(CarrierSlot::Hand).unwrap().unlocked_synergies().is_empty());

        // the synergy fires on a change to a different stat
        engine.increment_stat(&mut ctx, CarrierSlot::Hand, &damage, 100).unwrap();
        engine.increment_stat(&mut ctx, CarrierSlot::Hand, &damage, 100).unwrap();

        let axe = inv.hand.as_ref().unwrap();
        assert!(axe.unlocked_synergies().contains("berserker"));
        assert_eq!(axe.unlocked_synergies().len(), 1);
        let toasts: Vec<_> = world.toasts().collect();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].kind, UnlockKind::Synergy);
        assert_eq!(toasts[0].description, "berserker");
    }
}
