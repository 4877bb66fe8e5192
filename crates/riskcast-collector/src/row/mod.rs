//! Labeled dataset rows.
//!
//! A [`Row`] is created only by horizon resolution ([`Row::from_resolved`]) or by
//! decoding an exported dataset ([`codec`]). Once appended to a
//! [`DatasetStore`](crate::store::DatasetStore) it is never modified.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    feature::FeatureVector,
    pending::{ModelOutputs, ResolvedSample, SampleContext},
    snapshot::Snapshot,
    split::Split,
};

pub mod codec;

/// Schema version written into every exported row.
pub const ROW_SCHEMA_VERSION: i64 = 1;

/// Cumulative counters of the snapshot the sample was taken at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterTotals {
    pub score: i64,
    pub combo: i64,
    pub misses: i64,
    pub acc: u8,
    pub hit_good: i64,
    pub hit_wrong: i64,
    pub hit_junk: i64,
    pub expire_good: i64,
}

impl From<&Snapshot> for CounterTotals {
    fn from(s: &Snapshot) -> Self {
        Self {
            score: s.score,
            combo: s.combo,
            misses: s.miss,
            acc: s.acc,
            hit_good: s.hit_good,
            hit_wrong: s.hit_wrong,
            hit_junk: s.hit_junk,
            expire_good: s.expire_good,
        }
    }
}

/// One labeled, split-assigned sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub split: Split,
    /// Session key (`sessionId|seed|gameTag`).
    pub session: String,
    pub t_sec: u32,
    pub horizon_sec: u32,
    pub context: SampleContext,
    pub features: FeatureVector,
    pub totals: CounterTotals,
    pub model_outputs: ModelOutputs,
    pub labels: BTreeMap<String, i64>,
}

impl Row {
    /// Finalizes a resolved sample.
    #[must_use]
    pub fn from_resolved(
        resolved: ResolvedSample,
        split: Split,
        session: &str,
        horizon_sec: u32,
    ) -> Self {
        let ResolvedSample {
            prediction,
            start,
            end: _,
            labels,
        } = resolved;
        Self {
            split,
            session: session.to_owned(),
            t_sec: prediction.t_sec,
            horizon_sec,
            context: prediction.context,
            features: prediction.features,
            totals: CounterTotals::from(&start),
            model_outputs: prediction.model_outputs,
            labels,
        }
    }

    #[must_use]
    pub fn label(&self, name: &str) -> Option<i64> {
        self.labels.get(name).copied()
    }

    /// Label `name` as a binary training target (`value > 0`).
    #[must_use]
    pub fn binary_label(&self, name: &str) -> Option<bool> {
        self.label(name).map(|v| v > 0)
    }
}
