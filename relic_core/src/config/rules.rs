//! Rule data sources
//!
//! Rule files are parsed only down to their raw entry tables here. Each
//! catalog deserializes its entries one by one on reload so a single broken
//! entry never takes the rest of the file with it.

use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Raw entry tables of one or more rule documents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleFile {
    #[serde(default, rename = "milestone")]
    pub milestones: Vec<toml::Value>,
    #[serde(default, rename = "synergy")]
    pub synergies: Vec<toml::Value>,
    #[serde(default, rename = "echo")]
    pub echoes: Vec<toml::Value>,
    #[serde(default, rename = "decay")]
    pub decay: Vec<toml::Value>,
    #[serde(default, rename = "stat")]
    pub stats: Vec<toml::Value>,
}

impl RuleFile {
    /// Append another document's entries, keeping load order
    pub fn extend(&mut self, other: RuleFile) {
        self.milestones.extend(other.milestones);
        self.synergies.extend(other.synergies);
        self.echoes.extend(other.echoes);
        self.decay.extend(other.decay);
        self.stats.extend(other.stats);
    }

    pub fn entry_count(&self) -> usize {
        self.milestones.len()
            + self.synergies.len()
            + self.echoes.len()
            + self.decay.len()
            + self.stats.len()
    }
}

/// Where rule documents come from
#[derive(Debug, Clone)]
pub enum RuleSource {
    /// The standard rule files of a directory; missing files are skipped
    Directory(std::path::PathBuf),
    /// In-memory documents
    Documents(Vec<String>),
}

const RULE_FILES: [&str; 5] = [
    "stats.toml",
    "milestones.toml",
    "synergies.toml",
    "echoes.toml",
    "decay.toml",
];

impl RuleSource {
    /// Read and parse every document of this source
    pub fn load(&self) -> Result<RuleFile, ConfigError> {
        let mut merged = RuleFile::default();
        match self {
            RuleSource::Directory(dir) => {
                for name in RULE_FILES {
                    let path = dir.join(name);
                    if !path.exists() {
                        debug!(path = %path.display(), "rule file absent, skipping");
                        continue;
                    }
                    merged.extend(load_rule_file(&path)?);
                }
            }
            RuleSource::Documents(docs) => {
                for doc in docs {
                    merged.extend(super::parse_toml(doc)?);
                }
            }
        }
        Ok(merged)
    }
}

fn load_rule_file(path: &Path) -> Result<RuleFile, ConfigError> {
    super::load_toml(path)
}

/// Rule documents bundled with the crate
pub fn default_rules() -> RuleSource {
    RuleSource::Documents(vec![
        include_str!("../../config/stats.toml").to_string(),
        include_str!("../../config/milestones.toml").to_string(),
        include_str!("../../config/synergies.toml").to_string(),
        include_str!("../../config/echoes.toml").to_string(),
        include_str!("../../config/decay.toml").to_string(),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_document() {
        let doc = r#"
[[milestone]]
stat = "kills"
threshold = 10

[[milestone]]
stat = "kills"
threshold = 100

[[synergy]]
id = "berserker"
"#;
        let file = RuleSource::Documents(vec![doc.to_string()]).load().unwrap();
        assert_eq!(file.milestones.len(), 2);
        assert_eq!(file.synergies.len(), 1);
        assert!(file.echoes.is_empty());
    }

    #[test]
    fn test_broken_document_is_an_error() {
        let source = RuleSource::Documents(vec!["[[milestone]\nstat =".to_string()]);
        assert!(matches!(source.load(), Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_default_rules_load() {
        let file = default_rules().load().unwrap();
        assert!(!file.milestones.is_empty());
        assert!(!file.synergies.is_empty());
        assert!(!file.echoes.is_empty());
        assert!(!file.decay.is_empty());
        assert!(!file.stats.is_empty());
    }
}
