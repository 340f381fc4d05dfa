//! Operator command surface: `stat query|add|set <slot> <stat> [value]`

use crate::carrier::{CarrierSlot, SlotParseError};
use crate::engine::{Notify, StatContext, StatEngine, StatError};
use crate::stat_store::MergePolicy;
use crate::types::{StatId, StatIdError};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("permission level {required} required, you have {actual}")]
    PermissionDenied { required: u8, actual: u8 },
    #[error("usage: stat query|add|set <slot> <stat> [value]")]
    Usage,
    #[error("unknown action '{0}', expected query, add or set")]
    UnknownAction(String),
    #[error(transparent)]
    Slot(#[from] SlotParseError),
    #[error(transparent)]
    Stat(#[from] StatIdError),
    #[error("'{0}' is not a whole number")]
    Value(String),
    #[error(transparent)]
    Refused(#[from] StatError),
}

/// Who issued a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSource {
    pub name: String,
    pub permission_level: u8,
}

impl CommandSource {
    pub fn new(name: impl Into<String>, permission_level: u8) -> Self {
        CommandSource {
            name: name.into(),
            permission_level,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatCommand {
    Query { slot: CarrierSlot, stat: StatId },
    Add { slot: CarrierSlot, stat: StatId, amount: i64 },
    Set { slot: CarrierSlot, stat: StatId, value: i64 },
}

impl std::str::FromStr for StatCommand {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim().trim_start_matches('/');
        let mut parts = line.split_whitespace();
        if parts.next() != Some("stat") {
            return Err(CommandError::Usage);
        }
        let action = parts.next().ok_or(CommandError::Usage)?;
        let slot: CarrierSlot = parts.next().ok_or(CommandError::Usage)?.parse()?;
        let stat = StatId::parse(parts.next().ok_or(CommandError::Usage)?)?;
        let value = parts.next();
        if parts.next().is_some() {
            return Err(CommandError::Usage);
        }

        let number = |raw: Option<&str>| -> Result<i64, CommandError> {
            let raw = raw.ok_or(CommandError::Usage)?;
            raw.parse().map_err(|_| CommandError::Value(raw.to_string()))
        };

        match action {
            "query" if value.is_none() => Ok(StatCommand::Query { slot, stat }),
            "query" => Err(CommandError::Usage),
            "add" => Ok(StatCommand::Add {
                slot,
                stat,
                amount: number(value)?,
            }),
            "set" => Ok(StatCommand::Set {
                slot,
                stat,
                value: number(value)?,
            }),
            other => Err(CommandError::UnknownAction(other.to_string())),
        }
    }
}

impl StatCommand {
    /// Run against the host in `ctx`. Writes go through the full cascade.
    pub fn execute(
        &self,
        engine: &StatEngine,
        ctx: &mut StatContext<'_>,
        source: &CommandSource,
    ) -> Result<String, CommandError> {
        let required = engine.config().operator_permission_level;
        if source.permission_level < required {
            return Err(CommandError::PermissionDenied {
                required,
                actual: source.permission_level,
            });
        }

        match self {
            StatCommand::Query { slot, stat } => {
                let carrier = ctx.host.carrier(*slot).ok_or(StatError::EmptySlot(*slot))?;
                Ok(format!(
                    "{} on {} ({}) = {}",
                    stat,
                    slot,
                    carrier.display_name(),
                    engine.get_stat(carrier, stat)
                ))
            }
            StatCommand::Add { slot, stat, amount } => {
                let value = engine.update_stat(ctx, *slot, stat, *amount, MergePolicy::Sum, Notify::Cascade)?;
                info!(source = %source.name, %slot, %stat, amount, value, "stat add command");
                Ok(format!("{} on {} is now {}", stat, slot, value))
            }
            StatCommand::Set { slot, stat, value } => {
                let value = engine.update_stat(ctx, *slot, stat, *value, MergePolicy::Overwrite, Notify::Cascade)?;
                info!(source = %source.name, %slot, %stat, value, "stat set command");
                Ok(format!("{} on {} set to {}", stat, slot, value))
            }
        }
    }
}

/// Parse and run one command line
pub fn run_command(
    engine: &StatEngine,
    ctx: &mut StatContext<'_>,
    source: &CommandSource,
    line: &str,
) -> Result<String, CommandError> {
    line.parse::<StatCommand>()?.execute(engine, ctx, source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carrier::{Carrier, Inventory};
    use crate::config::{EngineConfig, RuleSource};
    use crate::world::RecordingWorld;

    fn op() -> CommandSource {
        CommandSource::new("admin", 4)
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            "/stat add worn:1 kills 5".parse::<StatCommand>(),
            Ok(StatCommand::Add {
                slot: CarrierSlot::Worn(1),
                stat: StatId::parse("kills").unwrap(),
                amount: 5
            })
        );
        assert_eq!("stat query hand".parse::<StatCommand>(), Err(CommandError::Usage));
        assert_eq!("stat set hand kills ten".parse::<StatCommand>(), Err(CommandError::Value("ten".to_string())));
        assert!(matches!("stat drop hand kills".parse::<StatCommand>(), Err(CommandError::UnknownAction(_))));
        assert!(matches!("stat query belt kills".parse::<StatCommand>(), Err(CommandError::Slot(_))));
    }

    #[test]
    fn test_set_runs_the_cascade() {
        let engine = StatEngine::new(EngineConfig::default());
        engine.reload(
            &RuleSource::Documents(vec!["[[milestone]]\nstat = \"kills\"\nthreshold = 10\n".to_string()])
                .load()
                .unwrap(),
        );
        let mut inv = Inventory::default().with_hand(Carrier::new("relic:sword"));
        let mut world = RecordingWorld::new();
        let mut ctx = StatContext::new(&mut inv, &mut world, 0);

        let out = run_command(&engine, &mut ctx, &op(), "stat set hand kills 10").unwrap();
        assert_eq!(out, "relic:kills on hand set to 10");
        let out = run_command(&engine, &mut ctx, &op(), "stat query hand kills").unwrap();
        assert_eq!(out, "relic:kills on hand (relic:sword) = 10");

        assert!(inv.hand.as_ref().unwrap().unlocked_milestones().contains("kills/10"));
    }

    #[test]
    fn test_permission_and_empty_slot() {
        let engine = StatEngine::new(EngineConfig::default());
        let mut inv = Inventory::default();
        let mut world = RecordingWorld::new();
        let mut ctx = StatContext::new(&mut inv, &mut world, 0);

        assert_eq!(
            run_command(&engine, &mut ctx, &CommandSource::new("guest", 0), "stat add hand kills 1"),
            Err(CommandError::PermissionDenied { required: 2, actual: 0 })
        );
        assert_eq!(
            run_command(&engine, &mut ctx, &op(), "stat add pack:2 kills 1"),
            Err(CommandError::Refused(StatError::EmptySlot(CarrierSlot::Pack(2))))
        );
    }
}
