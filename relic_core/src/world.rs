//! World - the external side-effect surface the engines dispatch into
//!
//! Everything the engines do outside of carrier state (sounds, particles,
//! spawned entities, rewards, toasts) goes through the `World` trait. A
//! failing call never aborts a cascade: callers log the error and move on.

use crate::engine::UnlockToast;
use crate::sync::RegistrySync;
use crate::types::{ActorRef, Position};
use std::collections::HashSet;
use thiserror::Error;

/// A side effect the world could not carry out
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorldError {
    #[error("unknown sound '{0}'")]
    UnknownSound(String),
    #[error("unknown status effect '{0}'")]
    UnknownEffect(String),
    #[error("unknown entity type '{0}'")]
    UnknownEntity(String),
    #[error("unknown item '{0}'")]
    UnknownItem(String),
    #[error("unknown particle '{0}'")]
    UnknownParticle(String),
    #[error("side effect needs an owning actor")]
    NoActor,
    #[error("rejected: {0}")]
    Rejected(String),
}

/// World-interaction interface
pub trait World {
    fn play_sound(&mut self, sound: &str, at: Position, volume: f32, pitch: f32) -> Result<(), WorldError>;

    /// Status effect applied to every living thing within `radius` of `at`
    fn area_effect(
        &mut self,
        at: Position,
        effect: &str,
        radius: f64,
        duration: u32,
        amplifier: u8,
    ) -> Result<(), WorldError>;

    /// Lightning strike; `visual_only` strikes deal no damage
    fn strike(&mut self, at: Position, visual_only: bool) -> Result<(), WorldError>;

    fn spawn(&mut self, entity: &str, at: Position, count: u32) -> Result<(), WorldError>;

    fn particles(&mut self, particle: &str, at: Position, count: u32, spread: f64) -> Result<(), WorldError>;

    fn give_item(&mut self, actor: &ActorRef, item: &str, count: u32) -> Result<(), WorldError>;

    fn grant_experience(&mut self, actor: &ActorRef, amount: u32) -> Result<(), WorldError>;

    /// Run an operator command, as the actor when there is one
    fn run_command(&mut self, actor: Option<&ActorRef>, command: &str) -> Result<(), WorldError>;

    fn apply_effect(&mut self, actor: &ActorRef, effect: &str, duration: u32, amplifier: u8) -> Result<(), WorldError>;

    /// Whether `kind` names a registered item type
    fn knows_item(&self, _kind: &str) -> bool {
        true
    }

    /// Deliver an unlock toast to observers
    fn notify(&mut self, toast: UnlockToast);

    /// Resend the stat registry to observers after it grew
    fn sync_registry(&mut self, _payload: &RegistrySync) {}
}

/// One side effect as recorded by `RecordingWorld`
#[derive(Debug, Clone, PartialEq)]
pub enum WorldEvent {
    Sound {
        sound: String,
        at: Position,
        volume: f32,
        pitch: f32,
    },
    AreaEffect {
        at: Position,
        effect: String,
        radius: f64,
        duration: u32,
        amplifier: u8,
    },
    Strike {
        at: Position,
        visual_only: bool,
    },
    Spawn {
        entity: String,
        at: Position,
        count: u32,
    },
    Particles {
        particle: String,
        at: Position,
        count: u32,
        spread: f64,
    },
    GiveItem {
        actor: String,
        item: String,
        count: u32,
    },
    Experience {
        actor: String,
        amount: u32,
    },
    Command {
        actor: Option<String>,
        command: String,
    },
    Effect {
        actor: String,
        effect: String,
        duration: u32,
        amplifier: u8,
    },
    Toast(UnlockToast),
    RegistrySync(RegistrySync),
}

impl WorldEvent {
    /// Short label for logs and the console
    pub fn summary(&self) -> String {
        match self {
            WorldEvent::Sound { sound, .. } => format!("sound {}", sound),
            WorldEvent::AreaEffect { effect, radius, .. } => format!("area {} r={}", effect, radius),
            WorldEvent::Strike { visual_only, .. } => {
                if *visual_only {
                    "strike (visual)".to_string()
                } else {
                    "strike".to_string()
                }
            }
            WorldEvent::Spawn { entity, count, .. } => format!("spawn {}x {}", count, entity),
            WorldEvent::Particles { particle, count, .. } => format!("particles {}x {}", count, particle),
            WorldEvent::GiveItem { actor, item, count } => format!("give {} {}x {}", actor, count, item),
            WorldEvent::Experience { actor, amount } => format!("xp {} +{}", actor, amount),
            WorldEvent::Command { command, .. } => format!("command '{}'", command),
            WorldEvent::Effect { actor, effect, .. } => format!("effect {} on {}", effect, actor),
            WorldEvent::Toast(toast) => format!("{}: {}", toast.title, toast.description),
            WorldEvent::RegistrySync(payload) => format!("registry sync: {} stats", payload.entries.len()),
        }
    }
}

/// In-memory world that records every side effect it is asked for.
///
/// Identifiers placed in `unknown` are refused with the matching error, which
/// lets callers exercise the skip-on-unresolved paths.
#[derive(Debug, Clone, Default)]
pub struct RecordingWorld {
    events: Vec<WorldEvent>,
    unknown: HashSet<String>,
}

impl RecordingWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat `id` as unregistered
    pub fn with_unknown(mut self, id: impl Into<String>) -> Self {
        self.unknown.insert(id.into());
        self
    }

    pub fn events(&self) -> &[WorldEvent] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn toasts(&self) -> impl Iterator<Item = &UnlockToast> {
        self.events.iter().filter_map(|e| match e {
            WorldEvent::Toast(t) => Some(t),
            _ => None,
        })
    }

    fn check(&self, id: &str, err: fn(String) -> WorldError) -> Result<(), WorldError> {
        if self.unknown.contains(id) {
            Err(err(id.to_string()))
        } else {
            Ok(())
        }
    }
}

impl World for RecordingWorld {
    fn play_sound(&mut self, sound: &str, at: Position, volume: f32, pitch: f32) -> Result<(), WorldError> {
        self.check(sound, WorldError::UnknownSound)?;
        self.events.push(WorldEvent::Sound {
            sound: sound.to_string(),
            at,
            volume,
            pitch,
        });
        Ok(())
    }

    fn area_effect(
        &mut self,
        at: Position,
        effect: &str,
        radius: f64,
        duration: u32,
        amplifier: u8,
    ) -> Result<(), WorldError> {
        self.check(effect, WorldError::UnknownEffect)?;
        self.events.push(WorldEvent::AreaEffect {
            at,
            effect: effect.to_string(),
            radius,
            duration,
            amplifier,
        });
        Ok(())
    }

    fn strike(&mut self, at: Position, visual_only: bool) -> Result<(), WorldError> {
        self.events.push(WorldEvent::Strike { at, visual_only });
        Ok(())
    }

    fn spawn(&mut self, entity: &str, at: Position, count: u32) -> Result<(), WorldError> {
        self.check(entity, WorldError::UnknownEntity)?;
        self.events.push(WorldEvent::Spawn {
            entity: entity.to_string(),
            at,
            count,
        });
        Ok(())
    }

    fn particles(&mut self, particle: &str, at: Position, count: u32, spread: f64) -> Result<(), WorldError> {
        self.check(particle, WorldError::UnknownParticle)?;
        self.events.push(WorldEvent::Particles {
            particle: particle.to_string(),
            at,
            count,
            spread,
        });
        Ok(())
    }

    fn give_item(&mut self, actor: &ActorRef, item: &str, count: u32) -> Result<(), WorldError> {
        self.check(item, WorldError::UnknownItem)?;
        self.events.push(WorldEvent::GiveItem {
            actor: actor.name.clone(),
            item: item.to_string(),
            count,
        });
        Ok(())
    }

    fn grant_experience(&mut self, actor: &ActorRef, amount: u32) -> Result<(), WorldError> {
        self.events.push(WorldEvent::Experience {
            actor: actor.name.clone(),
            amount,
        });
        Ok(())
    }

    fn run_command(&mut self, actor: Option<&ActorRef>, command: &str) -> Result<(), WorldError> {
        self.events.push(WorldEvent::Command {
            actor: actor.map(|a| a.name.clone()),
            command: command.to_string(),
        });
        Ok(())
    }

    fn apply_effect(&mut self, actor: &ActorRef, effect: &str, duration: u32, amplifier: u8) -> Result<(), WorldError> {
        self.check(effect, WorldError::UnknownEffect)?;
        self.events.push(WorldEvent::Effect {
            actor: actor.name.clone(),
            effect: effect.to_string(),
            duration,
            amplifier,
        });
        Ok(())
    }

    fn knows_item(&self, kind: &str) -> bool {
        !self.unknown.contains(kind)
    }

    fn notify(&mut self, toast: UnlockToast) {
        self.events.push(WorldEvent::Toast(toast));
    }

    fn sync_registry(&mut self, payload: &RegistrySync) {
        self.events.push(WorldEvent::RegistrySync(payload.clone()));
    }
}
