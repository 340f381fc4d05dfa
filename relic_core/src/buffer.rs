//! StatBuffer - write coalescing for hot stat paths
//!
//! Deltas are summed per (carrier identity, stat) and applied later through
//! the normal mutation path. A buffered carrier that cannot be found at flush
//! time keeps its deltas until it can, unless a fresh transformation replaced
//! it, in which case they are dropped.

use crate::carrier::{CarrierHost, CarrierSlot};
use crate::engine::{StatContext, StatEngine, StatError};
use crate::types::{CarrierId, StatId, Tick};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Result of one flush
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub applied: usize,
    pub retained: usize,
    /// Deltas of carriers replaced by a fresh transformation
    pub dropped: usize,
}

/// Pending deltas of a single actor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatBuffer {
    pending: HashMap<(CarrierId, StatId), i64>,
}

impl StatBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer a delta for the carrier in `slot`, giving it an identity if needed
    pub fn record(
        &mut self,
        host: &mut dyn CarrierHost,
        slot: CarrierSlot,
        stat: &StatId,
        delta: i64,
        now: Tick,
    ) -> Result<CarrierId, StatError> {
        let carrier = host.carrier_mut(slot).ok_or(StatError::EmptySlot(slot))?;
        if carrier.is_empty() {
            return Err(StatError::EmptySlot(slot));
        }
        if !carrier.can_hold_state() {
            return Err(StatError::Stacked {
                slot,
                count: carrier.count,
            });
        }
        let identity = carrier.ensure_identity(now);
        self.add(identity, stat.clone(), delta);
        Ok(identity)
    }

    fn add(&mut self, identity: CarrierId, stat: StatId, delta: i64) {
        let entry = self.pending.entry((identity, stat)).or_insert(0);
        *entry = entry.saturating_add(delta);
    }

    /// Buffered delta for a pair, 0 when none
    pub fn pending(&self, identity: CarrierId, stat: &StatId) -> i64 {
        self.pending.get(&(identity, stat.clone())).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Fold another buffer's deltas into this one
    pub fn absorb(&mut self, other: StatBuffer) {
        for ((identity, stat), delta) in other.pending {
            self.add(identity, stat, delta);
        }
    }

    /// Apply every delta whose carrier is reachable through `ctx.host`
    pub fn flush(&mut self, engine: &StatEngine, ctx: &mut StatContext<'_>) -> FlushReport {
        let mut entries: Vec<_> = self.pending.drain().collect();
        entries.sort_by(|a, b| a.0 .1.cmp(&b.0 .1));

        let mut report = FlushReport::default();
        for ((identity, stat), delta) in entries {
            let applied = match ctx.host.locate(identity) {
                Some(slot) => match engine.increment_stat(ctx, slot, &stat, delta) {
                    Ok(_) => true,
                    Err(error) => {
                        warn!(%error, %stat, "buffered delta refused, keeping it");
                        false
                    }
                },
                None if superseded(&*ctx.host, identity) => {
                    debug!(%identity, %stat, delta, "dropping delta of a superseded carrier");
                    report.dropped += 1;
                    continue;
                }
                None => false,
            };

            if applied {
                report.applied += 1;
            } else {
                report.retained += 1;
                self.add(identity, stat, delta);
            }
        }

        debug!(applied = report.applied, retained = report.retained, "stat buffer flushed");
        report
    }
}

/// Whether a carrier in `host` replaced `identity` without keeping its progress
fn superseded(host: &dyn CarrierHost, identity: CarrierId) -> bool {
    host.occupied_slots()
        .into_iter()
        .filter_map(|slot| host.carrier(slot))
        .any(|carrier| carrier.history().superseded.contains(&identity))
}

/// Per-actor buffers keyed by actor id
#[derive(Debug, Clone, Default)]
pub struct StatBuffers {
    interval: Tick,
    buffers: HashMap<String, StatBuffer>,
}

impl StatBuffers {
    pub fn new(interval: Tick) -> Self {
        StatBuffers {
            interval: interval.max(1),
            buffers: HashMap::new(),
        }
    }

    pub fn for_engine(engine: &StatEngine) -> Self {
        Self::new(engine.config().buffer_flush_interval)
    }

    pub fn buffer_mut(&mut self, actor: &str) -> &mut StatBuffer {
        self.buffers.entry(actor.to_string()).or_default()
    }

    pub fn buffer(&self, actor: &str) -> Option<&StatBuffer> {
        self.buffers.get(actor)
    }

    /// Whether `tick` is a periodic flush tick
    pub fn should_flush(&self, tick: Tick) -> bool {
        tick % self.interval == 0
    }

    pub fn flush_actor(&mut self, actor: &str, engine: &StatEngine, ctx: &mut StatContext<'_>) -> FlushReport {
        match self.buffers.get_mut(actor) {
            Some(buffer) => buffer.flush(engine, ctx),
            None => FlushReport::default(),
        }
    }

    /// Final flush when an actor leaves. Unreachable deltas stay buffered
    /// under the actor and apply on a later flush.
    pub fn logout(&mut self, actor: &str, engine: &StatEngine, ctx: &mut StatContext<'_>) -> FlushReport {
        let Some(mut buffer) = self.buffers.remove(actor) else {
            return FlushReport::default();
        };
        let report = buffer.flush(engine, ctx);
        if !buffer.is_empty() {
            debug!(actor, retained = report.retained, "keeping unreachable buffered stats after logout");
            self.buffers.insert(actor.to_string(), buffer);
        }
        report
    }

    /// Move an actor's pending deltas to its post-respawn clone
    pub fn transfer(&mut self, from: &str, to: &str) {
        if from == to {
            return;
        }
        if let Some(old) = self.buffers.remove(from) {
            self.buffer_mut(to).absorb(old);
        }
    }

    pub fn actors(&self) -> impl Iterator<Item = &str> {
        self.buffers.keys().map(String::as_str)
    }
}
