//! Echo pass - cooldown-gated side effects at gameplay moments

use super::{StatContext, StatEngine};
use crate::carrier::CarrierSlot;
use crate::catalog::{EchoAction, EchoActionKind, TriggerKind};
use crate::types::Position;
use crate::world::{World, WorldError};
use tracing::{debug, warn};

const DEFAULT_AREA_EFFECT: &str = "relic:weakness";
const DEFAULT_ENTITY: &str = "relic:wisp";
const DEFAULT_SOUND: &str = "relic:echo";
const DEFAULT_PARTICLE: &str = "relic:spark";

impl StatEngine {
    /// Fire every echo rule for `trigger` that passes on the carrier in `slot`.
    ///
    /// Returns the ids of the rules that fired.
    pub fn trigger_echo(
        &self,
        ctx: &mut StatContext<'_>,
        slot: CarrierSlot,
        trigger: TriggerKind,
        at: Position,
    ) -> Vec<String> {
        let rules = self.snapshot_for(ctx);
        let providers = self.providers();
        let now = ctx.tick;
        let mut fired = Vec::new();

        for rule in rules.echoes.for_trigger(trigger) {
            let Some(carrier) = ctx.host.carrier(slot) else {
                break;
            };
            if !carrier.can_hold_state() {
                break;
            }
            if !rule.allows(carrier) {
                continue;
            }
            let ready = rule
                .conditions
                .iter()
                .all(|c| providers.get_stat(carrier, &c.stat) >= c.min);
            if !ready {
                continue;
            }
            if carrier.echo_cooldowns().is_cooling(&rule.id, now) {
                debug!(
                    rule = %rule.id,
                    remaining = carrier.echo_cooldowns().remaining(&rule.id, now),
                    "echo on cooldown"
                );
                continue;
            }

            if let Err(error) = dispatch(&mut *ctx.world, &rule.action, at) {
                warn!(%error, rule = %rule.id, "echo action failed");
                continue;
            }
            debug!(rule = %rule.id, tick = now, "echo fired");

            if rule.cooldown > 0 {
                if let Some(carrier) = ctx.host.carrier_mut(slot) {
                    let mut ledger = carrier.echo_cooldowns().clone();
                    ledger.prune(now);
                    ledger.start(rule.id.clone(), now, rule.cooldown);
                    carrier.replace_cooldowns(ledger);
                }
            }
            fired.push(rule.id.clone());
        }

        fired
    }

    /// Landing echoes, only for falls of at least `min_fall_distance`
    pub fn on_land(&self, ctx: &mut StatContext<'_>, slot: CarrierSlot, at: Position, fall_distance: f64) -> Vec<String> {
        if fall_distance < self.config().min_fall_distance {
            return Vec::new();
        }
        self.trigger_echo(ctx, slot, TriggerKind::Land, at)
    }
}

/// Run one action; missing parameters fall back to defaults
fn dispatch(world: &mut dyn World, action: &EchoAction, at: Position) -> Result<(), WorldError> {
    let params = &action.params;
    match action.kind {
        EchoActionKind::AreaEffect => world.area_effect(
            at,
            params.str_or("effect", DEFAULT_AREA_EFFECT),
            params.f64_or("radius", 4.0),
            params.u32_or("duration", 100),
            u8::try_from(params.u32_or("amplifier", 0)).unwrap_or(0),
        ),
        EchoActionKind::Strike => world.strike(at, params.bool_or("visual_only", false)),
        EchoActionKind::Spawn => world.spawn(params.str_or("entity", DEFAULT_ENTITY), at, params.u32_or("count", 1)),
        EchoActionKind::PlaySound => world.play_sound(
            params.str_or("sound", DEFAULT_SOUND),
            at,
            params.f64_or("volume", 1.0) as f32,
            params.f64_or("pitch", 1.0) as f32,
        ),
        EchoActionKind::ParticleBurst => world.particles(
            params.str_or("particle", DEFAULT_PARTICLE),
            at,
            params.u32_or("count", 16),
            params.f64_or("spread", 0.5),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carrier::{Carrier, Inventory};
    use crate::config::{EngineConfig, RuleSource};
    use crate::types::StatId;
    use crate::world::{RecordingWorld, WorldEvent};

    fn engine_with(doc: &str) -> StatEngine {
        let engine = StatEngine::new(EngineConfig::default());
        engine.reload(&RuleSource::Documents(vec![doc.to_string()]).load().unwrap());
        engine
    }

    const SPARKS: &str = r#"
[[echo]]
id = "sparks"
trigger = "mine"
cooldown = 10
action = { type = "particle_burst" }

[[echo.conditions]]
stat = "blocks_mined"
min = 3

[echo.filter]
tags = ["pickaxes"]
"#;

    fn pickaxe(mined: i64) -> Carrier {
        let stat = StatId::parse("blocks_mined").unwrap();
        let mut pick = Carrier::new("relic:iron_pickaxe").with_tag("pickaxes");
        let stats = pick.stats().with(&stat, mined);
        pick.replace_stats(stats);
        pick
    }

    #[test]
    fn test_defaults_fill_missing_params() {
        let engine = engine_with(SPARKS);
        let mut inv = Inventory::default().with_hand(pickaxe(3));
        let mut world = RecordingWorld::new();
        let mut ctx = StatContext::new(&mut inv, &mut world, 0);

        let fired = engine.trigger_echo(&mut ctx, CarrierSlot::Hand, TriggerKind::Mine, Position::new(1.0, 2.0, 3.0));
        assert_eq!(fired, vec!["sparks"]);
        assert_eq!(
            world.events()[0],
            WorldEvent::Particles {
                particle: DEFAULT_PARTICLE.to_string(),
                at: Position::new(1.0, 2.0, 3.0),
                count: 16,
                spread: 0.5,
            }
        );
    }

    #[test]
    fn test_conditions_and_filter_gate_firing() {
        let engine = engine_with(SPARKS);
        let mut inv = Inventory::default()
            .with_hand(pickaxe(2))
            .with_pack(Carrier::new("relic:iron_sword").with_tag("swords"));
        let mut world = RecordingWorld::new();
        let mut ctx = StatContext::new(&mut inv, &mut world, 0);

        assert!(engine.trigger_echo(&mut ctx, CarrierSlot::Hand, TriggerKind::Mine, Position::default()).is_empty());
        assert!(engine.trigger_echo(&mut ctx, CarrierSlot::Pack(0), TriggerKind::Mine, Position::default()).is_empty());
        assert!(engine.trigger_echo(&mut ctx, CarrierSlot::Hand, TriggerKind::Jump, Position::default()).is_empty());
        assert!(world.events().is_empty());
    }

    #[test]
    fn test_failed_action_does_not_start_cooldown() {
        let engine = engine_with(SPARKS);
        let mut inv = Inventory::default().with_hand(pickaxe(5));
        let mut world = RecordingWorld::new().with_unknown(DEFAULT_PARTICLE);
        let mut ctx = StatContext::new(&mut inv, &mut world, 0);

        assert!(engine.trigger_echo(&mut ctx, CarrierSlot::Hand, TriggerKind::Mine, Position::default()).is_empty());
        assert!(inv.hand.as_ref().unwrap().echo_cooldowns().is_empty());
    }

    #[test]
    fn test_out_of_range_amplifier_falls_back_to_zero() {
        let engine = engine_with(
            r#"
[[echo]]
id = "haze"
trigger = "attack"
action = { type = "area_effect", params = { effect = "relic:slowness", amplifier = 300 } }
"#,
        );
        let mut inv = Inventory::default().with_hand(Carrier::new("relic:mace"));
        let mut world = RecordingWorld::new();
        let mut ctx = StatContext::new(&mut inv, &mut world, 0);

        assert_eq!(engine.trigger_echo(&mut ctx, CarrierSlot::Hand, TriggerKind::Attack, Position::default()), vec!["haze"]);
        assert!(matches!(world.events()[0], WorldEvent::AreaEffect { amplifier: 0, .. }));
    }

    #[test]
    fn test_short_falls_do_not_land() {
        let engine = engine_with(
            r#"
[[echo]]
id = "thud"
trigger = "land"
action = { type = "play_sound", params = { sound = "relic:thud" } }
"#,
        );
        let mut inv = Inventory::default().with_hand(Carrier::new("relic:boots"));
        let mut world = RecordingWorld::new();
        let mut ctx = StatContext::new(&mut inv, &mut world, 0);

        assert!(engine.on_land(&mut ctx, CarrierSlot::Hand, Position::default(), 2.5).is_empty());
        assert_eq!(engine.on_land(&mut ctx, CarrierSlot::Hand, Position::default(), 3.0), vec!["thud"]);
        // no cooldown declared, so it fires every time
        assert_eq!(engine.on_land(&mut ctx, CarrierSlot::Hand, Position::default(), 9.0), vec!["thud"]);
    }
}
