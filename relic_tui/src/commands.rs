//! Console command line parsing

use relic_core::catalog::{DecayTrigger, TriggerKind};
use relic_core::{CarrierSlot, Tick};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsoleError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}', try 'help'")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Advance the clock
    Tick(Tick),
    /// Run random gameplay events
    Sim(u32),
    /// Reload rule files
    Reload,
    Trigger { kind: TriggerKind, slot: CarrierSlot },
    Decay(DecayTrigger),
    /// Forwarded to the operator `stat` command
    Stat(String),
    /// Write the inventory to a JSON file
    Save(PathBuf),
    /// Replace the inventory from a JSON file
    Load(PathBuf),
    Help,
}

impl std::str::FromStr for ConsoleCommand {
    type Err = ConsoleError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim().trim_start_matches('/');
        let mut parts = line.split_whitespace();
        let Some(head) = parts.next() else {
            return Err(ConsoleError::Empty);
        };
        let args: Vec<&str> = parts.collect();

        match head {
            "tick" => match args.as_slice() {
                [] => Ok(ConsoleCommand::Tick(1)),
                [n] => n
                    .parse()
                    .map(ConsoleCommand::Tick)
                    .map_err(|_| ConsoleError::Usage("tick [N]")),
                _ => Err(ConsoleError::Usage("tick [N]")),
            },
            "sim" => match args.as_slice() {
                [] => Ok(ConsoleCommand::Sim(10)),
                [n] => n
                    .parse()
                    .map(ConsoleCommand::Sim)
                    .map_err(|_| ConsoleError::Usage("sim [N]")),
                _ => Err(ConsoleError::Usage("sim [N]")),
            },
            "reload" if args.is_empty() => Ok(ConsoleCommand::Reload),
            "trigger" => match args.as_slice() {
                [kind, slot] => Ok(ConsoleCommand::Trigger {
                    kind: kind.parse().map_err(ConsoleError::Invalid)?,
                    slot: slot.parse().map_err(|e| ConsoleError::Invalid(format!("{}", e)))?,
                }),
                [kind] => Ok(ConsoleCommand::Trigger {
                    kind: kind.parse().map_err(ConsoleError::Invalid)?,
                    slot: CarrierSlot::Hand,
                }),
                _ => Err(ConsoleError::Usage("trigger <attack|mine|jump|land|interact> [slot]")),
            },
            "death" if args.is_empty() => Ok(ConsoleCommand::Decay(DecayTrigger::Death)),
            "repair" if args.is_empty() => Ok(ConsoleCommand::Decay(DecayTrigger::Repair)),
            "stat" => Ok(ConsoleCommand::Stat(line.to_string())),
            "save" => match args.as_slice() {
                [path] => Ok(ConsoleCommand::Save(PathBuf::from(path))),
                _ => Err(ConsoleError::Usage("save <file>")),
            },
            "load" => match args.as_slice() {
                [path] => Ok(ConsoleCommand::Load(PathBuf::from(path))),
                _ => Err(ConsoleError::Usage("load <file>")),
            },
            "help" | "?" => Ok(ConsoleCommand::Help),
            other => Err(ConsoleError::Unknown(other.to_string())),
        }
    }
}
