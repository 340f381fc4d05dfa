//! Durable JSON encoding of carriers and their value objects

use super::SyncError;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub fn to_json<T: Serialize>(value: &T) -> Result<String, SyncError> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn from_json<T: DeserializeOwned>(json: &str) -> Result<T, SyncError> {
    Ok(serde_json::from_str(json)?)
}
