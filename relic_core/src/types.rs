//! Core identifiers and small value types shared across the crate

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Absolute clock tick. Ticks are the only clock the engines know about.
pub type Tick = u64;

/// Namespace given to stat identifiers written without one
pub const DEFAULT_NAMESPACE: &str = "relic";

/// Error produced when a stat identifier is malformed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatIdError {
    #[error("stat identifier is empty")]
    Empty,
    #[error("invalid character '{ch}' in stat identifier '{raw}'")]
    InvalidCharacter { raw: String, ch: char },
    #[error("stat identifier '{0}' has an empty namespace or path")]
    MissingPart(String),
}

/// Namespaced stat key, e.g. `relic:kills` or `farming:crops_harvested`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StatId(String);

impl StatId {
    /// Parse a stat identifier, adding the default namespace to a bare path
    pub fn parse(raw: &str) -> Result<Self, StatIdError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(StatIdError::Empty);
        }

        let (namespace, path) = match raw.split_once(':') {
            Some((ns, path)) => (ns, path),
            None => (DEFAULT_NAMESPACE, raw),
        };
        if namespace.is_empty() || path.is_empty() {
            return Err(StatIdError::MissingPart(raw.to_string()));
        }

        let valid = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit() || "_./-".contains(c);
        if let Some(ch) = namespace
            .chars()
            .chain(path.chars())
            .find(|c| !valid(*c))
        {
            return Err(StatIdError::InvalidCharacter {
                raw: raw.to_string(),
                ch,
            });
        }

        Ok(StatId(format!("{}:{}", namespace, path)))
    }

    /// Build from an identifier already known to be well formed
    pub(crate) fn new_unchecked(raw: &str) -> Self {
        StatId(raw.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn namespace(&self) -> &str {
        self.0.split_once(':').map(|(ns, _)| ns).unwrap_or(DEFAULT_NAMESPACE)
    }

    pub fn path(&self) -> &str {
        self.0.split_once(':').map(|(_, p)| p).unwrap_or(&self.0)
    }

    /// The id as written in rules: the bare path in the default namespace
    pub fn short(&self) -> &str {
        if self.namespace() == DEFAULT_NAMESPACE {
            self.path()
        } else {
            &self.0
        }
    }
}

impl fmt::Display for StatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for StatId {
    type Error = StatIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        StatId::parse(&value)
    }
}

impl TryFrom<&str> for StatId {
    type Error = StatIdError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        StatId::parse(value)
    }
}

impl From<StatId> for String {
    fn from(id: StatId) -> Self {
        id.0
    }
}

impl std::str::FromStr for StatId {
    type Err = StatIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StatId::parse(s)
    }
}

/// Stable identity of a carrier, survives relocation between slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CarrierId(pub Uuid);

impl CarrierId {
    pub fn new_random() -> Self {
        CarrierId(Uuid::new_v4())
    }
}

impl fmt::Display for CarrierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// World position of an action or actor
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Position { x, y, z }
    }
}

/// The actor owning a carrier host (usually a player)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorRef {
    pub id: String,
    pub name: String,
    pub position: Position,
}

impl ActorRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        ActorRef {
            id: id.into(),
            name: name.into(),
            position: Position::default(),
        }
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = position;
        self
    }
}
