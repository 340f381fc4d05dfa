//! StatEngine - the single mutation path for carrier stats
//!
//! Every write goes through `update_stat`, which applies a merge policy,
//! publishes a cancellable pre-change event, commits the value and then runs
//! the post-change cascade (listeners, milestones, synergies, recompute
//! hooks) in a fixed order. Echo and decay passes are driven from outside by
//! gameplay moments and clock ticks.

mod cascade;
mod decay;
mod echo;
mod effects;
mod events;
mod milestone;
mod synergy;

pub use cascade::{CascadeStage, MilestoneOutcome, RecomputeHook, CASCADE_ORDER};
pub use events::{PostStatChange, PreStatChange, StatListener, UnlockKind, UnlockToast};

use crate::carrier::{Carrier, CarrierHost, CarrierSlot};
use crate::catalog::{ReloadReport, RuleBook, RuleSnapshot, SwapCell};
use crate::config::{default_rules, ConfigError, EngineConfig, RuleFile};
use crate::stat_store::{MergePolicy, ProviderChain, StatProvider};
use crate::sync::StatRegistry;
use crate::types::{CarrierId, StatId, StatIdError, Tick};
use crate::world::World;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// A refused mutation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatError {
    #[error("slot {0} is empty")]
    EmptySlot(CarrierSlot),
    #[error("slot {slot} holds a stack of {count}; stats need a single item")]
    Stacked { slot: CarrierSlot, count: u32 },
    #[error(transparent)]
    InvalidStat(#[from] StatIdError),
}

/// Whether a mutation publishes events and runs the cascade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Notify {
    #[default]
    Cascade,
    /// Commit only. Used by decay and other depleting writes.
    Silent,
}

/// Everything one mutation needs from the outside world for a single tick
pub struct StatContext<'a> {
    pub host: &'a mut dyn CarrierHost,
    pub world: &'a mut dyn World,
    pub tick: Tick,
    depth: u32,
    rules: Option<RuleSnapshot>,
}

impl<'a> StatContext<'a> {
    pub fn new(host: &'a mut dyn CarrierHost, world: &'a mut dyn World, tick: Tick) -> Self {
        StatContext {
            host,
            world,
            tick,
            depth: 0,
            rules: None,
        }
    }

    /// Nesting level of the cascade currently running
    pub fn depth(&self) -> u32 {
        self.depth
    }
}

/// The mutation orchestrator and the rule engines hanging off it
pub struct StatEngine {
    config: EngineConfig,
    rules: RuleBook,
    providers: SwapCell<ProviderChain>,
    registry: SwapCell<StatRegistry>,
    listeners: Vec<Arc<dyn StatListener>>,
    recompute: Vec<Arc<dyn RecomputeHook>>,
}

impl StatEngine {
    /// Engine with empty catalogs
    pub fn new(config: EngineConfig) -> Self {
        StatEngine {
            config,
            rules: RuleBook::new(),
            providers: SwapCell::new(ProviderChain::new()),
            registry: SwapCell::new(StatRegistry::default()),
            listeners: Vec::new(),
            recompute: Vec::new(),
        }
    }

    /// Engine loaded with the bundled rule documents
    pub fn with_default_rules(config: EngineConfig) -> Result<Self, ConfigError> {
        let engine = StatEngine::new(config);
        let file = default_rules().load()?;
        engine.reload(&file);
        Ok(engine)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn rules(&self) -> &RuleBook {
        &self.rules
    }

    /// Swap in every catalog from `file` and rebuild the sync registry
    pub fn reload(&self, file: &RuleFile) -> Vec<ReloadReport> {
        let mut reports = self.rules.reload_all(file);
        let (mut registry, report) = StatRegistry::build(file.stats.clone(), &self.rules.snapshot());
        // stats registered at runtime keep an index across reloads
        registry.carry_over(&self.registry.load());
        self.registry.swap(registry);
        reports.push(report);
        reports
    }

    pub fn registry(&self) -> Arc<StatRegistry> {
        self.registry.load()
    }

    pub fn providers(&self) -> Arc<ProviderChain> {
        self.providers.load()
    }

    /// Register a provider ahead of every earlier one
    pub fn register_provider(&self, provider: Arc<dyn StatProvider>) {
        debug!(provider = provider.name(), "registering stat provider");
        self.providers.update(|chain| chain.with_provider(provider));
    }

    pub fn add_listener(&mut self, listener: Arc<dyn StatListener>) {
        self.listeners.push(listener);
    }

    pub fn add_recompute_hook(&mut self, hook: Arc<dyn RecomputeHook>) {
        self.recompute.push(hook);
    }

    /// Current value, 0 when absent
    pub fn get_stat(&self, carrier: &Carrier, stat: &StatId) -> i64 {
        self.providers.load().get_stat(carrier, stat)
    }

    /// `update_stat` with SUM and a full cascade
    pub fn increment_stat(
        &self,
        ctx: &mut StatContext<'_>,
        slot: CarrierSlot,
        stat: &StatId,
        delta: i64,
    ) -> Result<i64, StatError> {
        self.update_stat(ctx, slot, stat, delta, MergePolicy::Sum, Notify::Cascade)
    }

    /// Merge `value` into a stat and run the cascade. Returns the stored value.
    ///
    /// A cancelled pre-change event is not an error: the unchanged value is
    /// returned.
    pub fn update_stat(
        &self,
        ctx: &mut StatContext<'_>,
        slot: CarrierSlot,
        stat: &StatId,
        value: i64,
        policy: MergePolicy,
        notify: Notify,
    ) -> Result<i64, StatError> {
        // the outermost call pins one catalog snapshot for the whole cascade
        let pinned = ctx.rules.is_none();
        if pinned {
            ctx.rules = Some(self.rules.snapshot());
        }
        let result = self.apply_update(ctx, slot, stat, value, policy, notify);
        if pinned {
            ctx.rules = None;
        }
        result
    }

    fn apply_update(
        &self,
        ctx: &mut StatContext<'_>,
        slot: CarrierSlot,
        stat: &StatId,
        value: i64,
        policy: MergePolicy,
        notify: Notify,
    ) -> Result<i64, StatError> {
        let providers = self.providers.load();
        let tick = ctx.tick;

        let carrier = ctx.host.carrier_mut(slot).ok_or(StatError::EmptySlot(slot))?;
        if carrier.is_empty() {
            return Err(StatError::EmptySlot(slot));
        }
        if !carrier.can_hold_state() {
            return Err(StatError::Stacked {
                slot,
                count: carrier.count,
            });
        }
        let identity = carrier.ensure_identity(tick);
        self.register_stat(&mut *ctx.world, stat);
        let old = providers.get_stat(carrier, stat);
        let new = policy.apply(old, value);

        if notify == Notify::Silent || new == old {
            providers.set_stat(carrier, stat, new);
            return Ok(providers.get_stat(carrier, stat));
        }

        if ctx.depth >= self.config.max_cascade_depth {
            warn!(
                %stat,
                depth = ctx.depth,
                "cascade depth limit reached, applying without notification"
            );
            providers.set_stat(carrier, stat, new);
            return Ok(providers.get_stat(carrier, stat));
        }

        if self.pre_change_cancelled(ctx, slot, stat, old, new) {
            debug!(%stat, old, new, "stat change cancelled");
            return Ok(old);
        }

        let carrier = ctx.host.carrier_mut(slot).ok_or(StatError::EmptySlot(slot))?;
        providers.set_stat(carrier, stat, new);
        let confirmed = providers.get_stat(carrier, stat);
        debug!(%stat, old, new = confirmed, policy = policy.name(), "stat updated");

        self.run_cascade(ctx, slot, identity, stat, old, confirmed);
        Ok(confirmed)
    }

    /// Give a stat first written at runtime a registry index and resend the payload
    fn register_stat(&self, world: &mut dyn World, stat: &StatId) {
        if self.registry.load().index_of(stat).is_some() {
            return;
        }
        let mut payload = None;
        self.registry.update(|registry| {
            let next = registry.with_stat(stat);
            payload = Some(next.to_sync());
            next
        });
        info!(%stat, "registered stat on first write");
        if let Some(payload) = payload {
            world.sync_registry(&payload);
        }
    }

    fn pre_change_cancelled(&self, ctx: &StatContext<'_>, slot: CarrierSlot, stat: &StatId, old: i64, new: i64) -> bool {
        if self.listeners.is_empty() {
            return false;
        }
        let Some(carrier) = ctx.host.carrier(slot) else {
            return true;
        };
        let mut event = PreStatChange::new(ctx.host.owner(), carrier, stat, old, new);
        for listener in &self.listeners {
            listener.on_pre(&mut event);
        }
        event.is_cancelled()
    }

    fn run_cascade(
        &self,
        ctx: &mut StatContext<'_>,
        slot: CarrierSlot,
        identity: CarrierId,
        stat: &StatId,
        old: i64,
        new: i64,
    ) {
        let rules = self.snapshot_for(ctx);
        let event = PostStatChange {
            actor: ctx.host.owner().cloned(),
            slot,
            carrier: identity,
            stat: stat.clone(),
            old,
            new,
        };

        ctx.depth += 1;
        let mut slot = slot;
        let mut identity = identity;

        for stage in CASCADE_ORDER {
            match stage {
                CascadeStage::Listeners => {
                    for listener in &self.listeners {
                        listener.on_post(self, ctx, &event);
                    }
                }
                CascadeStage::Milestones => {
                    match milestone::evaluate(self, ctx, &rules.milestones, slot, identity, stat) {
                        MilestoneOutcome::InPlace(_) => {}
                        MilestoneOutcome::Superseded {
                            slot: next_slot,
                            identity: next_identity,
                        } => {
                            slot = next_slot;
                            identity = next_identity;
                        }
                        MilestoneOutcome::Detached => {
                            debug!(%stat, "carrier detached, ending cascade");
                            break;
                        }
                    }
                }
                CascadeStage::Synergies => synergy::evaluate(self, ctx, &rules.synergies, slot, identity),
                CascadeStage::Recompute => self.run_recompute(ctx, slot, identity, stat),
            }
        }

        ctx.depth -= 1;
    }

    fn run_recompute(&self, ctx: &mut StatContext<'_>, slot: CarrierSlot, identity: CarrierId, stat: &StatId) {
        if self.recompute.is_empty() {
            return;
        }
        let Some(slot) = cascade::resolve(&*ctx.host, slot, identity) else {
            return;
        };
        if let Some(carrier) = ctx.host.carrier_mut(slot) {
            for hook in &self.recompute {
                hook.recompute(carrier, stat);
            }
        }
    }

    pub(crate) fn snapshot_for(&self, ctx: &StatContext<'_>) -> RuleSnapshot {
        match &ctx.rules {
            Some(rules) => rules.clone(),
            None => self.rules.snapshot(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carrier::Inventory;
    use crate::config::RuleSource;
    use crate::stat_store::DurabilityProvider;
    use crate::types::ActorRef;
    use crate::world::RecordingWorld;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn id(raw: &str) -> StatId {
        StatId::parse(raw).unwrap()
    }

    fn engine_with(doc: &str) -> StatEngine {
        let engine = StatEngine::new(EngineConfig::default());
        let file = RuleSource::Documents(vec![doc.to_string()]).load().unwrap();
        engine.reload(&file);
        engine
    }

    fn holder() -> Inventory {
        Inventory::for_actor(ActorRef::new("p1", "Steve")).with_hand(Carrier::new("relic:iron_sword").with_tag("swords"))
    }

    #[test]
    fn test_refuses_empty_and_stacked_slots() {
        let engine = StatEngine::new(EngineConfig::default());
        let mut inv = Inventory::default().with_pack(Carrier::new("relic:arrow").with_count(16));
        let mut world = RecordingWorld::new();
        let mut ctx = StatContext::new(&mut inv, &mut world, 0);

        assert_eq!(
            engine.increment_stat(&mut ctx, CarrierSlot::Hand, &id("kills"), 1),
            Err(StatError::EmptySlot(CarrierSlot::Hand))
        );
        assert_eq!(
            engine.increment_stat(&mut ctx, CarrierSlot::Pack(0), &id("kills"), 1),
            Err(StatError::Stacked {
                slot: CarrierSlot::Pack(0),
                count: 16
            })
        );
    }

    #[test]
    fn test_identity_assigned_on_first_mutation() {
        let engine = StatEngine::new(EngineConfig::default());
        let mut inv = holder();
        let mut world = RecordingWorld::new();
        assert!(inv.hand.as_ref().unwrap().identity().is_none());

        let mut ctx = StatContext::new(&mut inv, &mut world, 42);
        engine.increment_stat(&mut ctx, CarrierSlot::Hand, &id("kills"), 1).unwrap();

        let sword = inv.hand.as_ref().unwrap();
        assert!(sword.identity().is_some());
        assert_eq!(sword.history().created_at, Some(42));
    }

    #[test]
    fn test_policies_through_update() {
        let engine = StatEngine::new(EngineConfig::default());
        let mut inv = holder();
        let mut world = RecordingWorld::new();
        let mut ctx = StatContext::new(&mut inv, &mut world, 0);
        let best = id("best_streak");

        let update = |ctx: &mut StatContext<'_>, v, p| engine.update_stat(ctx, CarrierSlot::Hand, &best, v, p, Notify::Cascade);
        assert_eq!(update(&mut ctx, 5, MergePolicy::Max), Ok(5));
        assert_eq!(update(&mut ctx, 3, MergePolicy::Max), Ok(5));
        assert_eq!(update(&mut ctx, 3, MergePolicy::Overwrite), Ok(3));
        assert_eq!(update(&mut ctx, 7, MergePolicy::Average), Ok(5));
    }

    struct Veto;

    impl StatListener for Veto {
        fn on_pre(&self, event: &mut PreStatChange<'_>) {
            if event.new > 3 {
                event.cancel();
            }
        }
    }

    #[test]
    fn test_cancelled_change_is_discarded() {
        let mut engine = engine_with("[[milestone]]\nstat = \"kills\"\nthreshold = 4\n");
        engine.add_listener(Arc::new(Veto));
        let mut inv = holder();
        let mut world = RecordingWorld::new();
        let mut ctx = StatContext::new(&mut inv, &mut world, 0);

        assert_eq!(engine.increment_stat(&mut ctx, CarrierSlot::Hand, &id("kills"), 3), Ok(3));
        assert_eq!(engine.increment_stat(&mut ctx, CarrierSlot::Hand, &id("kills"), 1), Ok(3));

        let sword = inv.hand.as_ref().unwrap();
        assert_eq!(sword.stat(&id("kills")), 3);
        assert!(sword.unlocked_milestones().is_empty());
        assert_eq!(world.toasts().count(), 0);
    }

    #[test]
    fn test_silent_write_skips_cascade() {
        let engine = engine_with("[[milestone]]\nstat = \"kills\"\nthreshold = 1\n");
        let mut inv = holder();
        let mut world = RecordingWorld::new();
        let mut ctx = StatContext::new(&mut inv, &mut world, 0);

        engine
            .update_stat(&mut ctx, CarrierSlot::Hand, &id("kills"), 5, MergePolicy::Overwrite, Notify::Silent)
            .unwrap();

        assert!(inv.hand.as_ref().unwrap().unlocked_milestones().is_empty());
    }

    struct Counting(AtomicUsize);

    impl StatListener for Counting {
        fn on_post(&self, _engine: &StatEngine, _ctx: &mut StatContext<'_>, _event: &PostStatChange) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_unchanged_value_skips_notification() {
        let counter = Arc::new(Counting(AtomicUsize::new(0)));
        let mut engine = StatEngine::new(EngineConfig::default());
        engine.add_listener(counter.clone());
        let mut inv = holder();
        let mut world = RecordingWorld::new();
        let mut ctx = StatContext::new(&mut inv, &mut world, 0);

        engine.increment_stat(&mut ctx, CarrierSlot::Hand, &id("kills"), 1).unwrap();
        engine.increment_stat(&mut ctx, CarrierSlot::Hand, &id("kills"), 0).unwrap();
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }

    /// Re-enters the engine on every change to `echo`
    struct Feedback;

    impl StatListener for Feedback {
        fn on_post(&self, engine: &StatEngine, ctx: &mut StatContext<'_>, event: &PostStatChange) {
            if event.stat.path() == "echo" {
                let _ = engine.increment_stat(ctx, event.slot, &event.stat, 1);
            }
        }
    }

    #[test]
    fn test_depth_guard_stops_runaway_reentry() {
        let mut engine = StatEngine::new(EngineConfig::default());
        engine.add_listener(Arc::new(Feedback));
        let mut inv = holder();
        let mut world = RecordingWorld::new();
        let mut ctx = StatContext::new(&mut inv, &mut world, 0);

        engine.increment_stat(&mut ctx, CarrierSlot::Hand, &id("echo"), 1).unwrap();
        assert_eq!(ctx.depth(), 0);

        // the outer write plus one per nested level, the last one silent
        let max = i64::from(engine.config().max_cascade_depth);
        assert_eq!(inv.hand.as_ref().unwrap().stat(&id("echo")), max + 1);
    }

    #[test]
    fn test_registered_provider_takes_over() {
        let engine = StatEngine::new(EngineConfig::default());
        engine.register_provider(Arc::new(DurabilityProvider::new()));
        let mut inv = Inventory::default().with_hand(Carrier::new("relic:iron_pickaxe").with_durability(250));
        let mut world = RecordingWorld::new();
        let mut ctx = StatContext::new(&mut inv, &mut world, 0);
        let used = id(DurabilityProvider::STAT);

        assert_eq!(engine.increment_stat(&mut ctx, CarrierSlot::Hand, &used, 300), Ok(250));
        let pick = inv.hand.as_ref().unwrap();
        assert_eq!(pick.damage, 250);
        assert_eq!(engine.get_stat(pick, &used), 250);
        assert_eq!(engine.providers().names(), vec!["durability", "default"]);
    }
}
