//! Decay pass - periodic and lifecycle depletion

use super::{Notify, StatContext, StatEngine};
use crate::catalog::DecayTrigger;
use crate::stat_store::MergePolicy;
use tracing::{debug, warn};

impl StatEngine {
    /// Apply every due decay rule for `trigger` to each carrier in the host.
    ///
    /// Writes are silent overwrites, made only when the value changes.
    /// Returns the number of writes.
    pub fn apply_decay(&self, ctx: &mut StatContext<'_>, trigger: DecayTrigger) -> usize {
        let rules = self.snapshot_for(ctx);
        let providers = self.providers();
        let mut writes = 0;

        for slot in ctx.host.occupied_slots() {
            for rule in rules.decay.for_trigger(trigger) {
                if !rule.is_due(ctx.tick) {
                    continue;
                }
                let Some(carrier) = ctx.host.carrier(slot) else {
                    break;
                };
                if !carrier.can_hold_state() || !rule.matches(carrier) {
                    continue;
                }
                let current = providers.get_stat(carrier, &rule.stat);
                if current <= 0 {
                    continue;
                }
                let next = rule.apply(current);
                if next == current {
                    continue;
                }

                match self.update_stat(ctx, slot, &rule.stat, next, MergePolicy::Overwrite, Notify::Silent) {
                    Ok(value) => {
                        debug!(rule = %rule.id, %slot, from = current, to = value, "stat decayed");
                        writes += 1;
                    }
                    Err(error) => warn!(%error, rule = %rule.id, "decay write refused"),
                }
            }
        }

        writes
    }
}
