//! Collector configuration.
//!
//! Every numeric option is clamped into its supported range by
//! [`CollectorConfig::clamped`]; out-of-range values are never rejected. Label
//! definitions are the only part that can be invalid, see
//! [`CollectorConfig::validate`].

use std::collections::BTreeSet;

use riskcast_stats::confusion::DEFAULT_THRESHOLD;
use serde::{Deserialize, Serialize};

use crate::{label::LabelSet, split::SplitProportions};

pub const MIN_CAP_ROWS: usize = 2000;
pub const MAX_CAP_ROWS: usize = 40_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CollectorConfig {
    /// Look-ahead in seconds between a sample and its label snapshot.
    pub horizon_sec: u32,
    /// Dataset capacity; oldest rows are evicted beyond it.
    pub cap_rows: usize,
    pub split_proportions: SplitProportions,
    /// Maximum number of samples waiting for their horizon.
    pub pending_cap: usize,
    /// Extra seconds of snapshots retained beyond the horizon.
    pub window_slack_sec: u32,
    /// Enqueue an automatic sample on every state tick.
    pub sample_every_tick: bool,
    pub labels: LabelSet,
    /// Decision threshold for online evaluation.
    pub eval_threshold: f32,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            horizon_sec: 5,
            cap_rows: 12_000,
            split_proportions: SplitProportions::default(),
            pending_cap: 90,
            window_slack_sec: 40,
            sample_every_tick: true,
            labels: LabelSet::default(),
            eval_threshold: DEFAULT_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("no label definitions configured")]
    NoLabels,
    #[display("label name `{name}` must start with `y_`")]
    LabelPrefix { name: String },
    #[display("duplicate label name `{name}`")]
    DuplicateLabel { name: String },
}

impl CollectorConfig {
    /// Returns a copy with every numeric option forced into range.
    #[must_use]
    pub fn clamped(&self) -> Self {
        Self {
            horizon_sec: self.horizon_sec.clamp(1, 60),
            cap_rows: self.cap_rows.clamp(MIN_CAP_ROWS, MAX_CAP_ROWS),
            pending_cap: self.pending_cap.clamp(1, 10_000),
            window_slack_sec: self.window_slack_sec.min(600),
            eval_threshold: if self.eval_threshold.is_finite() {
                self.eval_threshold.clamp(0.0, 1.0)
            } else {
                DEFAULT_THRESHOLD
            },
            ..self.clone()
        }
    }

    /// Snapshot retention: horizon plus slack (45 s by default).
    #[must_use]
    pub fn window_retention_sec(&self) -> u32 {
        self.horizon_sec.saturating_add(self.window_slack_sec)
    }

    /// Checks the label definitions.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.labels.is_empty() {
            return Err(ConfigError::NoLabels);
        }
        let mut seen = BTreeSet::new();
        for def in self.labels.iter() {
            if !def.name.starts_with("y_") {
                return Err(ConfigError::LabelPrefix {
                    name: def.name.clone(),
                });
            }
            if !seen.insert(def.name.as_str()) {
                return Err(ConfigError::DuplicateLabel {
                    name: def.name.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        label::{LabelDefinition, LabelRule},
        snapshot::Counter,
    };

    #[test]
    fn test_defaults() {
        let config = CollectorConfig::default();
        assert_eq!(config.window_retention_sec(), 45);
        assert_eq!(config.clamped(), config);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_and_clamping() {
        let config: CollectorConfig =
            serde_json::from_str(r#"{"capRows": 100, "splitProportions": "0.6,0.2,0.2"}"#)
                .unwrap();
        assert_eq!(config.horizon_sec, 5);
        assert_eq!(config.clamped().cap_rows, MIN_CAP_ROWS);
        assert!((config.split_proportions.train() - 0.6).abs() < 1e-12);

        let config = CollectorConfig {
            cap_rows: 1_000_000,
            ..CollectorConfig::default()
        };
        assert_eq!(config.clamped().cap_rows, MAX_CAP_ROWS);
    }

    #[test]
    fn test_label_validation() {
        let config = CollectorConfig {
            labels: LabelSet::new(vec![
                LabelDefinition::new("y_a", Counter::Miss, LabelRule::Increased),
                LabelDefinition::new("y_a", Counter::Score, LabelRule::Decreased),
            ]),
            ..CollectorConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::DuplicateLabel {
                name: "y_a".to_owned()
            })
        );
        let config = CollectorConfig {
            labels: LabelSet::new(vec![]),
            ..CollectorConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NoLabels));
    }
}
