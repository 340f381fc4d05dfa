//! Milestone pass - threshold crossing and carrier transformation

use super::cascade::{resolve, MilestoneOutcome};
use super::effects::{self, Unlock};
use super::{StatContext, StatEngine, UnlockKind};
use crate::carrier::{CarrierSlot, CarrierTemplate};
use crate::catalog::{Milestone, MilestoneCatalog};
use crate::types::{CarrierId, StatId};
use tracing::{debug, info, warn};

/// Evaluate every milestone registered for `stat`, in load order.
///
/// Stops at the first transformation: the old carrier is gone and the
/// replacement already carries the unlocked key.
pub(crate) fn evaluate(
    engine: &StatEngine,
    ctx: &mut StatContext<'_>,
    catalog: &MilestoneCatalog,
    slot: CarrierSlot,
    identity: CarrierId,
    stat: &StatId,
) -> MilestoneOutcome {
    let milestones = catalog.for_stat(stat);
    if milestones.is_empty() {
        return MilestoneOutcome::InPlace(0);
    }

    let Some(generation) = ctx
        .host
        .carrier(slot)
        .map(|c| c.history().transformations)
    else {
        return MilestoneOutcome::Detached;
    };

    let providers = engine.providers();
    let mut slot = slot;
    let mut unlocked = 0;

    for milestone in milestones {
        let Some(current) = resolve(&*ctx.host, slot, identity) else {
            return MilestoneOutcome::Detached;
        };
        slot = current;
        let Some(carrier) = ctx.host.carrier(slot) else {
            return MilestoneOutcome::Detached;
        };

        // a nested mutation transformed the carrier under us
        if carrier.history().transformations != generation {
            return MilestoneOutcome::Superseded { slot, identity };
        }

        let key = milestone.key();
        if carrier.unlocked_milestones().contains(&key) || !milestone.matches(carrier) {
            continue;
        }
        let value = providers.get_stat(carrier, stat);
        if value < milestone.threshold {
            continue;
        }

        if let Some(template) = &milestone.replace_with {
            if ctx.world.knows_item(&template.kind) {
                return transform(engine, ctx, slot, identity, milestone, template, key);
            }
            warn!(
                key = %key,
                kind = %template.kind,
                "unknown replacement item, unlocking in place"
            );
        }

        info!(key = %key, value, "milestone unlocked");
        if let Some(carrier) = ctx.host.carrier_mut(slot) {
            let next = carrier.unlocked_milestones().seeded_with(key.clone());
            carrier.replace_milestones(next);
        }
        effects::apply(engine, ctx, slot, identity, unlock_for(milestone, key));
        unlocked += 1;
    }

    MilestoneOutcome::InPlace(unlocked)
}

fn transform(
    engine: &StatEngine,
    ctx: &mut StatContext<'_>,
    slot: CarrierSlot,
    identity: CarrierId,
    milestone: &Milestone,
    template: &CarrierTemplate,
    key: String,
) -> MilestoneOutcome {
    let Some(slot) = resolve(&*ctx.host, slot, identity) else {
        debug!(key = %key, "carrier to transform is gone, skipping");
        return MilestoneOutcome::Detached;
    };
    let Some(old) = ctx.host.carrier(slot) else {
        return MilestoneOutcome::Detached;
    };

    let replacement = old.transform_into(template, &key, milestone.keep_progress);
    info!(
        key = %key,
        from = %old.kind,
        to = %replacement.kind,
        keep_progress = milestone.keep_progress,
        "milestone transformed carrier"
    );
    ctx.host.put(slot, replacement);

    let tick = ctx.tick;
    let Some(identity) = ctx.host.carrier_mut(slot).map(|c| c.ensure_identity(tick)) else {
        return MilestoneOutcome::Detached;
    };

    effects::apply(engine, ctx, slot, identity, unlock_for(milestone, key));
    MilestoneOutcome::Superseded { slot, identity }
}

fn unlock_for(milestone: &Milestone, key: String) -> Unlock<'_> {
    Unlock {
        kind: UnlockKind::Milestone,
        key,
        title: milestone.title(),
        description: milestone.description(),
        rename: milestone.rename.as_deref(),
        sound: milestone.sound.as_deref(),
        rewards: &milestone.rewards,
    }
}

#[cfg(test)]
mod tests {
    use super::{transform, MilestoneOutcome};
    use crate::carrier::{Carrier, CarrierHost, CarrierSlot, Inventory};
    use crate::catalog::Milestone;
    use crate::config::{EngineConfig, RuleSource};
    use crate::engine::{PostStatChange, StatContext, StatEngine, StatListener};
    use crate::types::{ActorRef, CarrierId, StatId};
    use crate::world::{RecordingWorld, WorldEvent};
    use std::sync::Arc;

    fn engine_with(doc: &str) -> StatEngine {
        let engine = StatEngine::new(EngineConfig::default());
        engine.reload(&RuleSource::Documents(vec![doc.to_string()]).load().unwrap());
        engine
    }

    fn kills() -> StatId {
        StatId::parse("kills").unwrap()
    }

    const LADDER: &str = r#"
[[milestone]]
stat = "kills"
threshold = 5
rename = "Bloodied Sword"
sound = "relic:ding"

[[milestone]]
stat = "kills"
threshold = 10

[[milestone.rewards]]
type = "experience"
amount = 5
"#;

    #[test]
    fn test_jump_past_several_thresholds_unlocks_each_once() {
        let engine = engine_with(LADDER);
        let mut inv = Inventory::for_actor(ActorRef::new("p1", "Alex")).with_hand(Carrier::new("relic:iron_sword"));
        let mut world = RecordingWorld::new();
        let mut ctx = StatContext::new(&mut inv, &mut world, 0);

        engine.increment_stat(&mut ctx, CarrierSlot::Hand, &kills(), 12).unwrap();
        engine.increment_stat(&mut ctx, CarrierSlot::Hand, &kills(), 1).unwrap();

        let sword = inv.hand.as_ref().unwrap();
        assert_eq!(sword.unlocked_milestones().sorted(), vec!["kills/10", "kills/5"]);
        assert_eq!(sword.display_name(), "Bloodied Sword");
        assert_eq!(world.toasts().count(), 2);
        assert!(world
            .events()
            .iter()
            .any(|e| matches!(e, WorldEvent::Experience { amount: 5, .. })));
    }

    #[test]
    fn test_filter_blocks_other_shapes() {
        let engine = engine_with(
            r#"
[[milestone]]
stat = "kills"
threshold = 1
[milestone.filter]
tags = ["swords"]
"#,
        );
        let mut inv = Inventory::default().with_hand(Carrier::new("relic:bow").with_tag("bows"));
        let mut world = RecordingWorld::new();
        let mut ctx = StatContext::new(&mut inv, &mut world, 0);
        engine.increment_stat(&mut ctx, CarrierSlot::Hand, &kills(), 3).unwrap();

        assert!(inv.hand.as_ref().unwrap().unlocked_milestones().is_empty());
    }

    const UPGRADE: &str = r#"
[[milestone]]
stat = "kills"
threshold = 3
keep_progress = true
replace_with = { kind = "relic:veteran_sword", tags = ["swords"] }

[[milestone]]
stat = "kills"
threshold = 1
"#;

    #[test]
    fn test_transformation_replaces_carrier_and_stops() {
        let engine = engine_with(UPGRADE);
        let mut inv = Inventory::for_actor(ActorRef::new("p1", "Alex")).with_hand(Carrier::new("relic:iron_sword"));
        let mut world = RecordingWorld::new();
        let mut ctx = StatContext::new(&mut inv, &mut world, 0);

        engine.increment_stat(&mut ctx, CarrierSlot::Hand, &kills(), 2).unwrap();
        let id_before = ctx.host.carrier(CarrierSlot::Hand).unwrap().identity();
        engine.increment_stat(&mut ctx, CarrierSlot::Hand, &kills(), 1).unwrap();

        let sword = inv.hand.as_ref().unwrap();
        assert_eq!(sword.kind, "relic:veteran_sword");
        assert_eq!(sword.identity(), id_before);
        assert_eq!(sword.stat(&kills()), 3);
        assert!(sword.unlocked_milestones().contains("kills/3"));
        // kills/1 unlocked on the first call, before the transformation
        assert!(sword.unlocked_milestones().contains("kills/1"));
        assert_eq!(sword.history().lineage, vec!["relic:iron_sword"]);
    }

    #[test]
    fn test_fresh_replacement_only_has_triggering_key() {
        let engine = engine_with(
            r#"
[[milestone]]
stat = "kills"
threshold = 1

[[milestone]]
stat = "kills"
threshold = 2
keep_progress = false
replace_with = { kind = "relic:cursed_sword" }
"#,
        );
        let mut inv = Inventory::default().with_pack(Carrier::new("relic:iron_sword"));
        let mut world = RecordingWorld::new();
        let mut ctx = StatContext::new(&mut inv, &mut world, 0);

        engine.increment_stat(&mut ctx, CarrierSlot::Pack(0), &kills(), 5).unwrap();

        let cursed = inv.pack[0].as_ref().unwrap();
        assert_eq!(cursed.kind, "relic:cursed_sword");
        assert_eq!(cursed.stat(&kills()), 0);
        assert_eq!(cursed.unlocked_milestones().sorted(), vec!["kills/2"]);
        assert!(cursed.identity().is_some());
    }

    #[test]
    fn test_unknown_replacement_unlocks_in_place() {
        let engine = engine_with(UPGRADE);
        let mut inv = Inventory::default().with_hand(Carrier::new("relic:iron_sword"));
        let mut world = RecordingWorld::new().with_unknown("relic:veteran_sword");
        let mut ctx = StatContext::new(&mut inv, &mut world, 0);

        engine.increment_stat(&mut ctx, CarrierSlot::Hand, &kills(), 3).unwrap();

        let sword = inv.hand.as_ref().unwrap();
        assert_eq!(sword.kind, "relic:iron_sword");
        assert!(sword.unlocked_milestones().contains("kills/3"));
        assert!(sword.unlocked_milestones().contains("kills/1"));
    }

    #[test]
    fn test_transform_of_missing_carrier_is_detached() {
        let engine = engine_with(UPGRADE);
        let milestone: Milestone =
            toml::from_str("stat = \"kills\"\nthreshold = 3\nreplace_with = { kind = \"relic:veteran_sword\" }\n").unwrap();
        let template = milestone.replace_with.clone().unwrap();
        let mut inv = Inventory::default().with_hand(Carrier::new("relic:iron_sword"));
        let mut world = RecordingWorld::new();
        let mut ctx = StatContext::new(&mut inv, &mut world, 0);

        let stranger = CarrierId::new_random();
        let outcome = transform(&engine, &mut ctx, CarrierSlot::Hand, stranger, &milestone, &template, milestone.key());

        assert_eq!(outcome, MilestoneOutcome::Detached);
        assert_eq!(inv.hand.as_ref().unwrap().kind, "relic:iron_sword");
        assert!(world.events().is_empty());
    }

    /// Swaps whatever changed for a plain stick
    struct Swapper;

    impl StatListener for Swapper {
        fn on_post(&self, _engine: &StatEngine, ctx: &mut StatContext<'_>, event: &PostStatChange) {
            ctx.host.put(event.slot, Carrier::new("relic:stick"));
        }
    }

    #[test]
    fn test_carrier_swapped_out_before_milestones_is_left_alone() {
        let mut engine = engine_with(UPGRADE);
        engine.add_listener(Arc::new(Swapper));
        let mut inv = Inventory::default().with_hand(Carrier::new("relic:iron_sword"));
        let mut world = RecordingWorld::new();
        let mut ctx = StatContext::new(&mut inv, &mut world, 0);

        assert_eq!(engine.increment_stat(&mut ctx, CarrierSlot::Hand, &kills(), 3).unwrap(), 3);

        let stick = inv.hand.as_ref().unwrap();
        assert_eq!(stick.kind, "relic:stick");
        assert!(stick.unlocked_milestones().is_empty());
        assert_eq!(world.toasts().count(), 0);
    }

    #[test]
    fn test_unknown_unlock_sound_is_skipped() {
        let engine = engine_with(LADDER);
        let mut inv = Inventory::for_actor(ActorRef::new("p1", "Alex")).with_hand(Carrier::new("relic:iron_sword"));
        let mut world = RecordingWorld::new().with_unknown("relic:ding");
        let mut ctx = StatContext::new(&mut inv, &mut world, 0);

        engine.increment_stat(&mut ctx, CarrierSlot::Hand, &kills(), 10).unwrap();

        let sword = inv.hand.as_ref().unwrap();
        assert_eq!(sword.display_name(), "Bloodied Sword");
        assert_eq!(sword.unlocked_milestones().len(), 2);
        assert_eq!(world.toasts().count(), 2);
        assert!(!world.events().iter().any(|e| matches!(e, WorldEvent::Sound { .. })));
        assert!(world
            .events()
            .iter()
            .any(|e| matches!(e, WorldEvent::Experience { amount: 5, .. })));
    }
}
