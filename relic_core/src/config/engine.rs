//! Engine tuning constants

use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunable engine constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Ticks between automatic flushes of buffered stat deltas
    #[serde(default = "default_buffer_flush_interval")]
    pub buffer_flush_interval: u64,
    /// Minimum fall distance (blocks) before a landing fires echoes
    #[serde(default = "default_min_fall_distance")]
    pub min_fall_distance: f64,
    /// Nested re-entrant mutations beyond this depth are applied silently
    #[serde(default = "default_max_cascade_depth")]
    pub max_cascade_depth: u32,
    /// Permission level required for the stat command
    #[serde(default = "default_operator_permission_level")]
    pub operator_permission_level: u8,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            buffer_flush_interval: default_buffer_flush_interval(),
            min_fall_distance: default_min_fall_distance(),
            max_cascade_depth: default_max_cascade_depth(),
            operator_permission_level: default_operator_permission_level(),
        }
    }
}

fn default_buffer_flush_interval() -> u64 {
    100
}
fn default_min_fall_distance() -> f64 {
    3.0
}
fn default_max_cascade_depth() -> u32 {
    8
}
fn default_operator_permission_level() -> u8 {
    2
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config: EngineConfig = super::load_toml(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = super::parse_toml(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_flush_interval == 0 {
            return Err(ConfigError::ValidationError(
                "buffer_flush_interval must be at least 1 tick".to_string(),
            ));
        }
        if !self.min_fall_distance.is_finite() || self.min_fall_distance < 0.0 {
            return Err(ConfigError::ValidationError(
                "min_fall_distance must be a non-negative number".to_string(),
            ));
        }
        Ok(())
    }
}
