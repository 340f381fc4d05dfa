//! relic_core - Per-item stat counters with cascading, data-driven rules
//!
//! This library provides:
//! - StatStore: Copy-on-write stat id → value mapping carried by each item
//! - StatEngine: The single mutation path (merge policy, cancellable events, cascade)
//! - Rule catalogs: Milestones, synergies, echoes and decay, reloaded whole from TOML
//! - StatBuffer: Write coalescing for hot stat paths
//! - Sync: Stat registry payloads plus wire and durable encodings
//! - Command: The operator `stat query|add|set` surface

pub mod buffer;
pub mod carrier;
pub mod catalog;
pub mod command;
pub mod config;
pub mod engine;
pub mod prelude;
pub mod stat_store;
pub mod sync;
pub mod types;
pub mod world;

// Re-export core types for convenience
pub use buffer::{FlushReport, StatBuffer, StatBuffers};
pub use carrier::{Carrier, CarrierHost, CarrierSlot, CarrierTemplate, CooldownLedger, Inventory, UnlockSet};
pub use catalog::{ReloadReport, RuleBook, RuleError, RuleSnapshot, TriggerKind};
pub use command::{run_command, CommandError, CommandSource, StatCommand};
pub use config::{default_rules, ConfigError, EngineConfig, RuleFile, RuleSource};
pub use engine::{Notify, StatContext, StatEngine, StatError, StatListener, UnlockToast};
pub use stat_store::{merge_stats, MergePolicy, StatProvider, StatStore};
pub use sync::{RegistrySync, StatRegistry, SyncError};
pub use types::{ActorRef, CarrierId, Position, StatId, Tick};
pub use world::{RecordingWorld, World, WorldError, WorldEvent};
