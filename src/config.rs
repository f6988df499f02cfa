//! Engine configuration, persisted as TOML.
//!
//! Every field has a default, so an empty file yields the builtin engine.
//! Example:
//!
//! ```toml
//! budget_cap = 250.0
//! rules = "rules.toml"
//!
//! [thresholds.roi]
//! comparison = ">="
//! value = 2.0
//!
//! [[categories]]
//! axis = "single-command-deployable"
//! default = "accepted"
//! entries = [{ value = "nomad", verdict = "rejected" }]
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::category::CategoryTable;
use crate::error::{ConfigError, ConfigResult};
use crate::fact::RelationSchema;
use crate::validate::{BudgetRule, ThresholdTable};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateConfig {
    /// Spending cap for P0–P2 and the amount to be returned from P3 on.
    #[serde(default = "default_budget_cap")]
    pub budget_cap: f64,
    /// Rule file whose goals replace or extend the builtin ones. Relative
    /// paths are resolved against the config file's directory on load.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<PathBuf>,
    #[serde(default)]
    pub thresholds: ThresholdTable,
    /// Axes that replace builtin axes of the same name, or add new ones.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<CategoryTable>,
    /// Relations declared in addition to the standard registry.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relations: Vec<RelationSchema>,
}

fn default_budget_cap() -> f64 {
    BudgetRule::default().cap
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            budget_cap: default_budget_cap(),
            rules: None,
            thresholds: ThresholdTable::default(),
            categories: Vec::new(),
            relations: Vec::new(),
        }
    }
}

impl GateConfig {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let mut config: Self = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        if let (Some(rules), Some(dir)) = (config.rules.as_mut(), path.parent()) {
            if rules.is_relative() {
                *rules = dir.join(&*rules);
            }
        }

        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded gate config");
        Ok(config)
    }

    /// Save to a TOML file.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if !self.budget_cap.is_finite() || self.budget_cap <= 0.0 {
            return Err(ConfigError::Invalid {
                message: format!("budget_cap must be a positive number, got {}", self.budget_cap),
            });
        }
        if !self.thresholds.is_valid() {
            return Err(ConfigError::Invalid {
                message: "every threshold value must be finite".into(),
            });
        }
        for (i, table) in self.categories.iter().enumerate() {
            if self.categories[..i].iter().any(|t| t.axis == table.axis) {
                return Err(ConfigError::Invalid {
                    message: format!("category axis \"{}\" is configured twice", table.axis),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::{SINGLE_COMMAND_DEPLOYABLE, Verdict};
    use crate::validate::{Metric, Threshold};

    #[test]
    fn empty_file_yields_defaults() {
        let config: GateConfig = toml::from_str("").unwrap();
        assert_eq!(config, GateConfig::default());
        assert_eq!(config.budget_cap, 100.0);
        assert_eq!(config.thresholds.get(Metric::Roi), Threshold::at_least(1.5));
    }

    #[test]
    fn partial_thresholds_keep_other_defaults() {
        let config: GateConfig = toml::from_str(
            r#"
            [thresholds.roi]
            comparison = ">="
            value = 2.0
            "#,
        )
        .unwrap();
        assert_eq!(config.thresholds.get(Metric::Roi), Threshold::at_least(2.0));
        assert_eq!(config.thresholds.get(Metric::PaybackMonths), Threshold::at_most(12.0));
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("phasegate.toml");
        let config = GateConfig {
            budget_cap: 250.0,
            categories: vec![
                CategoryTable::new(SINGLE_COMMAND_DEPLOYABLE, Verdict::Accepted)
                    .entries(["nomad"], Verdict::Rejected),
            ],
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(GateConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn relative_rule_path_resolves_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("phasegate.toml");
        std::fs::write(&path, "rules = \"rules.toml\"\n").unwrap();
        let config = GateConfig::load(&path).unwrap();
        assert_eq!(config.rules, Some(dir.path().join("rules.toml")));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let config = GateConfig {
            budget_cap: 0.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "budget_cap = \"lots\"").unwrap();
        assert!(matches!(GateConfig::load(&path), Err(ConfigError::Parse { .. })));
        assert!(matches!(
            GateConfig::load(&dir.path().join("missing.toml")),
            Err(ConfigError::Read { .. })
        ));
    }
}
