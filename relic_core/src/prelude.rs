//! Prelude module for convenient imports
//!
//! ```rust
//! use relic_core::prelude::*;
//! ```

// Core types
pub use crate::types::{ActorRef, CarrierId, Position, StatId, Tick};
pub use crate::stat_store::{merge_stats, MergePolicy, StatStore};

// Carriers
pub use crate::carrier::{Carrier, CarrierHost, CarrierSlot, Inventory};

// Engine
pub use crate::engine::{Notify, PostStatChange, PreStatChange, StatContext, StatEngine, StatError, StatListener};

// Rules
pub use crate::catalog::{DecayTrigger, TriggerKind};
pub use crate::config::{default_rules, EngineConfig, RuleSource};

// World
pub use crate::world::{RecordingWorld, World};
