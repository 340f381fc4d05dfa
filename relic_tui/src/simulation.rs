//! Random gameplay event simulation

use rand::Rng;
use relic_core::catalog::TriggerKind;
use relic_core::types::StatIdError;
use relic_core::{CarrierSlot, Position, StatBuffer, StatContext, StatEngine, StatId};
use tracing::debug;

/// One simulated gameplay moment
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimEvent {
    Kill { damage: i64 },
    Mine,
    Jump,
    Fall { distance: f64 },
    Interact,
}

impl SimEvent {
    pub fn random(rng: &mut impl Rng) -> Self {
        match rng.gen_range(0..10) {
            0..=2 => SimEvent::Kill {
                damage: rng.gen_range(5..40),
            },
            3..=5 => SimEvent::Mine,
            6 | 7 => SimEvent::Jump,
            8 => SimEvent::Fall {
                distance: rng.gen_range(0.5..12.0),
            },
            _ => SimEvent::Interact,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            SimEvent::Kill { damage } => format!("kill ({} dmg)", damage),
            SimEvent::Mine => "mine".to_string(),
            SimEvent::Jump => "jump".to_string(),
            SimEvent::Fall { distance } => format!("fall {:.1}m", distance),
            SimEvent::Interact => "interact".to_string(),
        }
    }
}

/// Stats written by simulated events
#[derive(Debug, Clone)]
pub struct SimStats {
    pub kills: StatId,
    pub damage_dealt: StatId,
    pub blocks_mined: StatId,
    pub jumps: StatId,
    pub distance_fallen: StatId,
}

impl SimStats {
    pub fn new() -> Result<Self, StatIdError> {
        Ok(SimStats {
            kills: StatId::parse("kills")?,
            damage_dealt: StatId::parse("damage_dealt")?,
            blocks_mined: StatId::parse("blocks_mined")?,
            jumps: StatId::parse("jumps")?,
            distance_fallen: StatId::parse("distance_fallen")?,
        })
    }
}

/// Apply one event to the carrier in `slot`, as the gameplay layer would.
///
/// Mining is a hot path and goes through the buffer; everything else is
/// written directly. Returns the ids of echoes that fired.
pub fn apply(
    event: SimEvent,
    stats: &SimStats,
    engine: &StatEngine,
    ctx: &mut StatContext<'_>,
    buffer: &mut StatBuffer,
    slot: CarrierSlot,
    at: Position,
) -> Vec<String> {
    let result = match event {
        SimEvent::Kill { damage } => engine
            .increment_stat(ctx, slot, &stats.kills, 1)
            .and_then(|_| engine.increment_stat(ctx, slot, &stats.damage_dealt, damage))
            .map(|_| engine.trigger_echo(ctx, slot, TriggerKind::Attack, at)),
        SimEvent::Mine => buffer
            .record(&mut *ctx.host, slot, &stats.blocks_mined, 1, ctx.tick)
            .map(|_| engine.trigger_echo(ctx, slot, TriggerKind::Mine, at)),
        SimEvent::Jump => engine
            .increment_stat(ctx, slot, &stats.jumps, 1)
            .map(|_| engine.trigger_echo(ctx, slot, TriggerKind::Jump, at)),
        SimEvent::Fall { distance } => engine
            .increment_stat(ctx, slot, &stats.distance_fallen, distance.round() as i64)
            .map(|_| engine.on_land(ctx, slot, at, distance)),
        SimEvent::Interact => Ok(engine.trigger_echo(ctx, slot, TriggerKind::Interact, at)),
    };

    match result {
        Ok(fired) => fired,
        Err(error) => {
            debug!(%error, event = %event.describe(), "simulated event refused");
            Vec::new()
        }
    }
}
