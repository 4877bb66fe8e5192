//! Label definitions derived from counter changes over the horizon.
//!
//! A label is not a fixed column: each [`LabelDefinition`] names a counter and a
//! [`LabelRule`] applied to that counter's change between the sample's snapshot
//! and the snapshot one horizon later.
//!
//! # Examples
//!
//! ```
//! use riskcast_collector::{label::{CounterDeltas, LabelSet}, snapshot::Snapshot};
//!
//! let start = Snapshot { t_sec: 0, miss: 2, score: 100, ..Snapshot::default() };
//! let end = Snapshot { t_sec: 5, miss: 3, score: 90, ..Snapshot::default() };
//! let labels = LabelSet::default().evaluate(&CounterDeltas::between(&start, &end));
//! assert_eq!(labels["y_missNext5"], 1);
//! assert_eq!(labels["y_scoreDropNext5"], 1);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::snapshot::{Counter, Snapshot};

/// How a counter delta becomes a label value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LabelRule {
    /// 1 when the counter went up, else 0.
    Increased,
    /// 1 when the counter went down, else 0.
    Decreased,
    /// The signed delta itself.
    Delta,
}

/// Counter changes between two snapshots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterDeltas([i64; Counter::ALL.len()]);

impl CounterDeltas {
    /// Computes `end - start` for every counter.
    #[must_use]
    pub fn between(start: &Snapshot, end: &Snapshot) -> Self {
        let mut deltas = [0; Counter::ALL.len()];
        for (delta, counter) in deltas.iter_mut().zip(Counter::ALL) {
            *delta = end.counter(counter).saturating_sub(start.counter(counter));
        }
        Self(deltas)
    }

    #[must_use]
    pub fn get(&self, counter: Counter) -> i64 {
        // Counter::ALL is declared in variant order
        self.0[counter as usize]
    }
}

/// One named label column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelDefinition {
    pub name: String,
    pub counter: Counter,
    pub rule: LabelRule,
}

impl LabelDefinition {
    #[must_use]
    pub fn new(name: impl Into<String>, counter: Counter, rule: LabelRule) -> Self {
        Self {
            name: name.into(),
            counter,
            rule,
        }
    }

    #[must_use]
    pub fn evaluate(&self, deltas: &CounterDeltas) -> i64 {
        let delta = deltas.get(self.counter);
        match self.rule {
            LabelRule::Increased => i64::from(delta > 0),
            LabelRule::Decreased => i64::from(delta < 0),
            LabelRule::Delta => delta,
        }
    }
}

/// Ordered collection of label definitions applied to every resolved sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelSet(Vec<LabelDefinition>);

impl Default for LabelSet {
    /// `y_missNext5` and `y_scoreDropNext5`.
    fn default() -> Self {
        Self(vec![
            LabelDefinition::new("y_missNext5", Counter::Miss, LabelRule::Increased),
            LabelDefinition::new("y_scoreDropNext5", Counter::Score, LabelRule::Decreased),
        ])
    }
}

impl LabelSet {
    #[must_use]
    pub fn new(definitions: Vec<LabelDefinition>) -> Self {
        Self(definitions)
    }

    /// The default labels plus per-judgment and delta labels.
    #[must_use]
    pub fn extended() -> Self {
        let mut set = Self::default();
        set.0.extend([
            LabelDefinition::new("y_hitGoodNext", Counter::HitGood, LabelRule::Increased),
            LabelDefinition::new("y_hitWrongNext", Counter::HitWrong, LabelRule::Increased),
            LabelDefinition::new("y_hitJunkNext", Counter::HitJunk, LabelRule::Increased),
            LabelDefinition::new("y_expireGoodNext", Counter::ExpireGood, LabelRule::Increased),
            LabelDefinition::new("y_scoreDelta", Counter::Score, LabelRule::Delta),
            LabelDefinition::new("y_comboDelta", Counter::Combo, LabelRule::Delta),
        ]);
        set
    }

    pub fn iter(&self) -> impl Iterator<Item = &LabelDefinition> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn evaluate(&self, deltas: &CounterDeltas) -> BTreeMap<String, i64> {
        self.0
            .iter()
            .map(|def| (def.name.clone(), def.evaluate(deltas)))
            .collect()
    }
}
