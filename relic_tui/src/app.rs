//! Application state

use crate::commands::ConsoleCommand;
use crate::simulation::{self, SimEvent, SimStats};
use rand::SeedableRng;
use relic_core::catalog::{DecayTrigger, TriggerKind};
use relic_core::stat_store::DurabilityProvider;
use relic_core::types::StatIdError;
use relic_core::{
    default_rules, run_command, ActorRef, Carrier, CarrierHost, CarrierSlot, CommandSource, ConfigError,
    EngineConfig, Inventory, Position, RecordingWorld, RuleSource, StatBuffers, StatContext, StatEngine, Tick,
};
use relic_core::sync;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

const MAX_LOG_LINES: usize = 500;
const LANDING_FALL: f64 = 5.0;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Stat(#[from] StatIdError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Inventory,
    Log,
    Help,
}

impl Tab {
    pub fn all() -> &'static [Tab] {
        &[Tab::Inventory, Tab::Log, Tab::Help]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Tab::Inventory => "Items",
            Tab::Log => "Log",
            Tab::Help => "Help",
        }
    }
}

pub struct App {
    pub current_tab: Tab,
    pub engine: StatEngine,
    pub inventory: Inventory,
    pub world: RecordingWorld,
    pub buffers: StatBuffers,
    pub log: Vec<String>,
    pub tick: Tick,
    pub rng: rand::rngs::StdRng,
    pub selected: usize,
    pub log_scroll: usize,
    /// Command line being typed, if any
    pub input: Option<String>,
    rules: RuleSource,
    operator: CommandSource,
    sim_stats: SimStats,
}

impl App {
    /// Console over the rule files in `rules_dir`, or the bundled rules
    pub fn new(rules_dir: Option<PathBuf>) -> Result<Self, AppError> {
        let (config, rules) = match rules_dir {
            Some(dir) => {
                let engine_file = dir.join("engine.toml");
                let config = if engine_file.exists() {
                    EngineConfig::load(&engine_file)?
                } else {
                    EngineConfig::default()
                };
                (config, RuleSource::Directory(dir))
            }
            None => (EngineConfig::default(), default_rules()),
        };

        let engine = StatEngine::new(config);
        engine.register_provider(Arc::new(DurabilityProvider::new()));
        let buffers = StatBuffers::for_engine(&engine);
        let operator = CommandSource::new("console", engine.config().operator_permission_level);

        let player = ActorRef::new("p1", "Steve").at(Position::new(0.0, 64.0, 0.0));
        let inventory = Inventory::for_actor(player)
            .with_hand(Carrier::new("relic:iron_sword").with_tag("swords").with_durability(250))
            .with_worn(Carrier::new("relic:leather_boots").with_tag("boots").with_durability(65))
            .with_pack(Carrier::new("relic:iron_pickaxe").with_tag("pickaxes").with_durability(250))
            .with_pack(Carrier::new("relic:blaze_rod"))
            .with_pack(Carrier::new("relic:arrow").with_count(16));

        let mut app = App {
            current_tab: Tab::Inventory,
            engine,
            inventory,
            world: RecordingWorld::new(),
            buffers,
            log: Vec::new(),
            tick: 0,
            rng: rand::rngs::StdRng::seed_from_u64(42),
            selected: 0,
            log_scroll: 0,
            input: None,
            rules,
            operator,
            sim_stats: SimStats::new()?,
        };
        app.reload();
        Ok(app)
    }

    fn actor_id(&self) -> String {
        self.inventory
            .owner
            .as_ref()
            .map(|a| a.id.clone())
            .unwrap_or_default()
    }

    fn position(&self) -> Position {
        self.inventory
            .owner
            .as_ref()
            .map(|a| a.position)
            .unwrap_or_default()
    }

    pub fn push_log(&mut self, line: impl Into<String>) {
        self.log.push(format!("[{:>6}] {}", self.tick, line.into()));
        if self.log.len() > MAX_LOG_LINES {
            let excess = self.log.len() - MAX_LOG_LINES;
            self.log.drain(..excess);
        }
    }

    /// Move recorded world side effects into the log
    fn drain_world(&mut self) {
        for event in self.world.drain() {
            self.push_log(event.summary());
        }
    }

    pub fn selected_slot(&self) -> Option<CarrierSlot> {
        self.inventory.occupied_slots().get(self.selected).copied()
    }

    pub fn selected_carrier(&self) -> Option<(CarrierSlot, &Carrier)> {
        let slot = self.selected_slot()?;
        self.inventory.carrier(slot).map(|c| (slot, c))
    }

    // === Actions ===

    pub fn reload(&mut self) {
        match self.rules.load() {
            Ok(file) => {
                for report in self.engine.reload(&file) {
                    self.push_log(format!(
                        "reloaded {}: {} accepted, {} rejected",
                        report.kind,
                        report.accepted,
                        report.rejected.len()
                    ));
                    for error in &report.rejected {
                        self.push_log(format!("  {}", error));
                    }
                }
                match self.engine.registry().to_sync().encode() {
                    Ok(bytes) => {
                        let count = self.engine.registry().len();
                        self.push_log(format!("registry sync: {} stats, {} bytes", count, bytes.len()));
                    }
                    Err(e) => self.push_log(format!("registry sync failed: {}", e)),
                }
            }
            Err(e) => self.push_log(format!("reload failed: {}", e)),
        }
    }

    /// Advance the clock, running tick decay and periodic buffer flushes
    pub fn advance(&mut self, ticks: Tick) {
        let actor = self.actor_id();
        let mut writes = 0;
        for _ in 0..ticks {
            self.tick += 1;
            let mut ctx = StatContext::new(&mut self.inventory, &mut self.world, self.tick);
            writes += self.engine.apply_decay(&mut ctx, DecayTrigger::Tick);
            if self.buffers.should_flush(self.tick) {
                let report = self.buffers.flush_actor(&actor, &self.engine, &mut ctx);
                if report.applied > 0 || report.retained > 0 {
                    info!(applied = report.applied, retained = report.retained, "buffer flush");
                }
            }
        }
        if writes > 0 {
            self.push_log(format!("decay: {} writes", writes));
        }
        self.drain_world();
    }

    /// Fire echoes for the selected carrier
    pub fn fire(&mut self, kind: TriggerKind) {
        let Some(slot) = self.selected_slot() else {
            self.push_log("no carrier selected");
            return;
        };
        self.fire_at(kind, slot);
    }

    fn fire_at(&mut self, kind: TriggerKind, slot: CarrierSlot) {
        let at = self.position();
        let mut ctx = StatContext::new(&mut self.inventory, &mut self.world, self.tick);
        let fired = match kind {
            TriggerKind::Land => self.engine.on_land(&mut ctx, slot, at, LANDING_FALL),
            other => self.engine.trigger_echo(&mut ctx, slot, other, at),
        };
        if fired.is_empty() {
            self.push_log(format!("{} on {}: nothing fired", kind.name(), slot));
        } else {
            self.push_log(format!("{} on {}: {}", kind.name(), slot, fired.join(", ")));
        }
        self.drain_world();
    }

    /// Run `count` random gameplay events against the selected carrier
    pub fn simulate(&mut self, count: u32) {
        let Some(slot) = self.selected_slot() else {
            self.push_log("no carrier selected");
            return;
        };
        let actor = self.actor_id();
        let at = self.position();
        for _ in 0..count {
            let event = SimEvent::random(&mut self.rng);
            self.tick += 1;
            let mut ctx = StatContext::new(&mut self.inventory, &mut self.world, self.tick);
            let fired = simulation::apply(
                event,
                &self.sim_stats,
                &self.engine,
                &mut ctx,
                self.buffers.buffer_mut(&actor),
                slot,
                at,
            );
            if !fired.is_empty() {
                self.push_log(format!("{} -> {}", event.describe(), fired.join(", ")));
            }
            self.drain_world();
        }
        self.push_log(format!("simulated {} events", count));
    }

    pub fn decay(&mut self, trigger: DecayTrigger) {
        let mut ctx = StatContext::new(&mut self.inventory, &mut self.world, self.tick);
        let writes = self.engine.apply_decay(&mut ctx, trigger);
        self.push_log(format!("{:?} decay: {} writes", trigger, writes));
        self.drain_world();
    }

    /// Parse and run one console line
    pub fn run_line(&mut self, line: &str) {
        self.push_log(format!("> {}", line));
        let command = match line.parse::<ConsoleCommand>() {
            Ok(command) => command,
            Err(e) => {
                self.push_log(e.to_string());
                return;
            }
        };

        match command {
            ConsoleCommand::Tick(n) => self.advance(n),
            ConsoleCommand::Sim(n) => self.simulate(n),
            ConsoleCommand::Reload => self.reload(),
            ConsoleCommand::Trigger { kind, slot } => self.fire_at(kind, slot),
            ConsoleCommand::Decay(trigger) => self.decay(trigger),
            ConsoleCommand::Stat(line) => {
                let mut ctx = StatContext::new(&mut self.inventory, &mut self.world, self.tick);
                let result = run_command(&self.engine, &mut ctx, &self.operator, &line);
                match result {
                    Ok(out) => self.push_log(out),
                    Err(e) => self.push_log(format!("error: {}", e)),
                }
                self.drain_world();
            }
            ConsoleCommand::Save(path) => self.save(&path),
            ConsoleCommand::Load(path) => self.load(&path),
            ConsoleCommand::Help => self.set_tab(2),
        }
    }

    pub fn save(&mut self, path: &Path) {
        let result = sync::to_json(&self.inventory)
            .map_err(|e| e.to_string())
            .and_then(|json| std::fs::write(path, json).map_err(|e| e.to_string()));
        match result {
            Ok(()) => self.push_log(format!("saved inventory to {}", path.display())),
            Err(e) => self.push_log(format!("save failed: {}", e)),
        }
    }

    /// Replace the inventory; buffered deltas for the old one are flushed first
    pub fn load(&mut self, path: &Path) {
        let loaded = std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|json| sync::from_json::<Inventory>(&json).map_err(|e| e.to_string()));
        match loaded {
            Ok(inventory) => {
                let actor = self.actor_id();
                let mut ctx = StatContext::new(&mut self.inventory, &mut self.world, self.tick);
                self.buffers.logout(&actor, &self.engine, &mut ctx);
                self.inventory = inventory;
                self.selected = 0;
                self.push_log(format!("loaded inventory from {}", path.display()));
            }
            Err(e) => self.push_log(format!("load failed: {}", e)),
        }
        self.drain_world();
    }

    // === Input line ===

    pub fn begin_input(&mut self) {
        self.input = Some(String::new());
    }

    pub fn is_typing(&self) -> bool {
        self.input.is_some()
    }

    pub fn input_char(&mut self, c: char) {
        if let Some(input) = &mut self.input {
            input.push(c);
        }
    }

    pub fn input_backspace(&mut self) {
        if let Some(input) = &mut self.input {
            input.pop();
        }
    }

    pub fn cancel_input(&mut self) {
        self.input = None;
    }

    pub fn submit_input(&mut self) {
        if let Some(line) = self.input.take() {
            if !line.trim().is_empty() {
                self.run_line(&line);
            }
        }
    }

    // === Navigation ===

    pub fn next_tab(&mut self) {
        let tabs = Tab::all();
        let idx = tabs.iter().position(|t| *t == self.current_tab).unwrap_or(0);
        self.current_tab = tabs[(idx + 1) % tabs.len()];
    }

    pub fn prev_tab(&mut self) {
        let tabs = Tab::all();
        let idx = tabs.iter().position(|t| *t == self.current_tab).unwrap_or(0);
        self.current_tab = tabs[(idx + tabs.len() - 1) % tabs.len()];
    }

    pub fn set_tab(&mut self, index: usize) {
        if let Some(tab) = Tab::all().get(index) {
            self.current_tab = *tab;
        }
    }

    pub fn on_up(&mut self) {
        match self.current_tab {
            Tab::Inventory => self.selected = self.selected.saturating_sub(1),
            Tab::Log => self.log_scroll = (self.log_scroll + 1).min(self.log.len()),
            Tab::Help => {}
        }
    }

    pub fn on_down(&mut self) {
        match self.current_tab {
            Tab::Inventory => {
                let count = self.inventory.len();
                if count > 0 {
                    self.selected = (self.selected + 1).min(count - 1);
                }
            }
            Tab::Log => self.log_scroll = self.log_scroll.saturating_sub(1),
            Tab::Help => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relic_core::StatId;

    #[test]
    fn test_bundled_console_starts_clean() {
        let app = App::new(None).unwrap();
        assert!(app.log.iter().any(|l| l.contains("reloaded milestone")));
        assert!(app.log.iter().all(|l| !l.contains("rejected") || l.contains(", 0 rejected")));
        assert_eq!(app.selected_slot(), Some(CarrierSlot::Hand));
    }

    #[test]
    fn test_stat_command_unlocks_bundled_milestone() {
        let mut app = App::new(None).unwrap();
        app.run_line("stat set hand kills 10");

        let (_, sword) = app.selected_carrier().unwrap();
        assert!(sword.unlocked_milestones().contains("kills/10"));
        assert!(app.log.iter().any(|l| l.contains("Blooded")));
    }

    #[test]
    fn test_stacked_item_is_refused() {
        let mut app = App::new(None).unwrap();
        app.run_line("stat add pack:2 kills 1");
        assert!(app.log.last().unwrap().contains("stack of 16"));
    }

    #[test]
    fn test_buffered_mining_flushes_on_interval() {
        let mut app = App::new(None).unwrap();
        app.selected = 2; // the pickaxe
        app.simulate(30);
        let mined = StatId::parse("blocks_mined").unwrap();
        let before = app.selected_carrier().unwrap().1.stat(&mined);

        let to_flush = 100 - app.tick % 100;
        app.advance(to_flush);

        let after = app.selected_carrier().unwrap().1.stat(&mined);
        assert!(after >= before);
        assert!(app.buffers.buffer("p1").map_or(true, |b| b.is_empty()));
    }

    #[test]
    fn test_save_and_load_inventory() {
        let path = std::env::temp_dir().join(format!("relic_tui_{}.json", std::process::id()));
        let mut app = App::new(None).unwrap();
        app.run_line("stat set hand kills 12");
        app.save(&path);

        let mut fresh = App::new(None).unwrap();
        fresh.load(&path);
        let _ = std::fs::remove_file(&path);

        let kills = StatId::parse("kills").unwrap();
        assert_eq!(fresh.selected_carrier().unwrap().1.stat(&kills), 12);
        assert_eq!(fresh.inventory, app.inventory);
    }

    #[test]
    fn test_input_line_runs_on_submit() {
        let mut app = App::new(None).unwrap();
        app.begin_input();
        for c in "tick 5".chars() {
            app.input_char(c);
        }
        app.submit_input();
        assert_eq!(app.tick, 5);
        assert!(!app.is_typing());
    }
}
