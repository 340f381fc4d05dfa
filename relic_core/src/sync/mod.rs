//! Sync - stat registry and the wire/durable encodings of carrier state
//!
//! Observers receive a `RegistrySync` payload (stat id to small integer) on
//! join and after every reload, then compact `WireCarrierState` updates that
//! refer to stats by index. Durable storage is plain JSON of the same value
//! objects.

mod durable;
mod registry;
mod wire;

pub use durable::{from_json, to_json};
pub use registry::{RegistrySync, StatDefinition, StatRegistry};
pub use wire::{decode_state, encode_state, CarrierState, WireCarrierState};

use crate::types::StatId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("stat '{0}' is not in the registry")]
    UnregisteredStat(StatId),
    #[error("no stat registered under index {0}")]
    UnknownIndex(u32),
    #[error("index {0} appears twice in the registry payload")]
    DuplicateIndex(u32),
    #[error("wire encoding failed: {0}")]
    Wire(#[from] bincode::Error),
    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}
