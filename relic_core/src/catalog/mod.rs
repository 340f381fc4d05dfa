//! Rule catalogs - immutable, data-defined rule sets swapped whole on reload

mod decay;
mod echo;
mod milestone;
mod shared;
mod synergy;

pub use decay::{DecayCatalog, DecayOperation, DecayRule, DecayTrigger};
pub use echo::{EchoAction, EchoActionKind, EchoCatalog, EchoRule, TriggerKind};
pub use milestone::{Milestone, MilestoneCatalog};
pub use shared::{ParamBag, RewardAction, ShapeFilter, StatRequirement};
pub use synergy::{Synergy, SynergyCatalog};

use serde::de::DeserializeOwned;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::{info, warn};

/// A single rejected catalog entry
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleError {
    #[error("{kind} entry #{index} could not be parsed: {message}")]
    Parse {
        kind: &'static str,
        index: usize,
        message: String,
    },
    #[error("{kind} entry #{index} ({id}) is invalid: {reason}")]
    Invalid {
        kind: &'static str,
        index: usize,
        id: String,
        reason: String,
    },
}

/// Outcome of one catalog reload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReloadReport {
    pub kind: &'static str,
    pub accepted: usize,
    pub rejected: Vec<RuleError>,
}

impl ReloadReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// A data-defined rule that can be parsed from one raw entry table
pub trait RuleEntry: DeserializeOwned + Sized {
    /// Entry kind used in logs and reports, e.g. `milestone`
    const KIND: &'static str;

    /// Identifier used in logs
    fn label(&self) -> String;

    /// Semantic checks serde cannot express
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// An immutable rule set built from parsed entries
pub trait Catalog: Default + Send + Sync {
    type Entry: RuleEntry;

    fn build(entries: Vec<Self::Entry>) -> Self;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Deserialize and validate entries one at a time; bad entries are logged and skipped
pub fn parse_entries<T: RuleEntry>(raw: Vec<toml::Value>) -> (Vec<T>, ReloadReport) {
    let mut report = ReloadReport {
        kind: T::KIND,
        ..Default::default()
    };
    let mut parsed = Vec::with_capacity(raw.len());

    for (index, value) in raw.into_iter().enumerate() {
        let entry: T = match value.try_into() {
            Ok(entry) => entry,
            Err(e) => {
                let error = RuleError::Parse {
                    kind: T::KIND,
                    index,
                    message: e.to_string(),
                };
                warn!(%error, "skipping rule entry");
                report.rejected.push(error);
                continue;
            }
        };

        if let Err(reason) = entry.validate() {
            let error = RuleError::Invalid {
                kind: T::KIND,
                index,
                id: entry.label(),
                reason,
            };
            warn!(%error, "skipping rule entry");
            report.rejected.push(error);
            continue;
        }

        parsed.push(entry);
    }

    report.accepted = parsed.len();
    (parsed, report)
}

/// Single swap-on-reload reference to an immutable value.
///
/// Readers take an `Arc` snapshot and keep a consistent view for as long as
/// they hold it; writers replace the whole value at once.
#[derive(Debug, Default)]
pub struct SwapCell<T> {
    current: RwLock<Arc<T>>,
}

impl<T> SwapCell<T> {
    pub fn new(value: T) -> Self {
        SwapCell {
            current: RwLock::new(Arc::new(value)),
        }
    }

    /// Current snapshot
    pub fn load(&self) -> Arc<T> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    /// Replace the value, returning the previous snapshot
    pub fn swap(&self, next: T) -> Arc<T> {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        std::mem::replace(&mut *guard, Arc::new(next))
    }

    /// Replace the value with one derived from the current snapshot
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        let next = f(&guard);
        *guard = Arc::new(next);
    }
}

impl<C: Catalog> SwapCell<C> {
    /// Rebuild the catalog from raw entries and swap it in whole
    pub fn reload(&self, raw: Vec<toml::Value>) -> ReloadReport {
        let (entries, report) = parse_entries::<C::Entry>(raw);
        self.swap(C::build(entries));
        info!(
            kind = report.kind,
            accepted = report.accepted,
            rejected = report.rejected.len(),
            "catalog reloaded"
        );
        report
    }
}

/// Snapshot of every catalog, held for the duration of one cascade
#[derive(Debug, Clone, Default)]
pub struct RuleSnapshot {
    pub milestones: Arc<MilestoneCatalog>,
    pub synergies: Arc<SynergyCatalog>,
    pub echoes: Arc<EchoCatalog>,
    pub decay: Arc<DecayCatalog>,
}

/// The live catalogs
#[derive(Debug, Default)]
pub struct RuleBook {
    pub milestones: SwapCell<MilestoneCatalog>,
    pub synergies: SwapCell<SynergyCatalog>,
    pub echoes: SwapCell<EchoCatalog>,
    pub decay: SwapCell<DecayCatalog>,
}

impl RuleBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> RuleSnapshot {
        RuleSnapshot {
            milestones: self.milestones.load(),
            synergies: self.synergies.load(),
            echoes: self.echoes.load(),
            decay: self.decay.load(),
        }
    }

    /// Reload every catalog from a rule file
    pub fn reload_all(&self, file: &crate::config::RuleFile) -> Vec<ReloadReport> {
        vec![
            self.milestones.reload(file.milestones.clone()),
            self.synergies.reload(file.synergies.clone()),
            self.echoes.reload(file.echoes.clone()),
            self.decay.reload(file.decay.clone()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(doc: &str) -> Vec<toml::Value> {
        let file: crate::config::RuleFile = toml::from_str(doc).unwrap();
        file.milestones
    }

    #[test]
    fn test_partial_acceptance() {
        let entries = raw(
            r#"
[[milestone]]
stat = "kills"
threshold = 10

[[milestone]]
stat = "Not A Stat"
threshold = 10

[[milestone]]
stat = "kills"
threshold = 0

[[milestone]]
stat = "kills"
threshold = 50
"#,
        );

        let cell: SwapCell<MilestoneCatalog> = SwapCell::default();
        let report = cell.reload(entries);

        assert_eq!(report.accepted, 2);
        assert_eq!(report.rejected.len(), 2);
        assert!(matches!(report.rejected[0], RuleError::Parse { index: 1, .. }));
        assert!(matches!(report.rejected[1], RuleError::Invalid { index: 2, .. }));
        assert_eq!(cell.load().len(), 2);
    }

    #[test]
    fn test_reload_replaces_whole_catalog() {
        let cell: SwapCell<MilestoneCatalog> = SwapCell::default();
        cell.reload(raw("[[milestone]]\nstat = \"kills\"\nthreshold = 10\n"));
        let before = cell.load();

        cell.reload(raw("[[milestone]]\nstat = \"jumps\"\nthreshold = 5\n"));
        let after = cell.load();

        // a held snapshot is unaffected by the swap
        assert_eq!(before.len(), 1);
        assert_eq!(after.len(), 1);
        assert!(after.for_stat(&"kills".parse().unwrap()).is_empty());
        assert_eq!(before.for_stat(&"kills".parse().unwrap()).len(), 1);
    }
}
