//! Samples waiting for their horizon to elapse.
//!
//! A [`PendingPrediction`] is recorded at second `t`. Once a snapshot at or after
//! `t + H` has been observed, the queue looks up the snapshots at exactly `t` and
//! `t + H`. When both exist, the sample is labeled from their counter deltas;
//! otherwise it is dropped and counted. Labels are never interpolated.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::{
    feature::FeatureVector,
    label::{CounterDeltas, LabelSet},
    snapshot::{Snapshot, SnapshotWindow},
};

/// Food-group context attached to a sample.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleContext {
    pub group_key: String,
    pub group_name: String,
}

/// Probabilities an external predictor produced for a sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelOutputs {
    pub risk01: Option<f32>,
    pub p_miss_next5: Option<f32>,
    pub p_score_drop_next5: Option<f32>,
}

impl ModelOutputs {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.risk01.is_none() && self.p_miss_next5.is_none() && self.p_score_drop_next5.is_none()
    }
}

/// An unlabeled sample.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingPrediction {
    pub t_sec: u32,
    pub features: FeatureVector,
    pub context: SampleContext,
    pub model_outputs: ModelOutputs,
}

/// A sample whose labels are now known.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSample {
    pub prediction: PendingPrediction,
    pub start: Snapshot,
    pub end: Snapshot,
    pub labels: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStats {
    pub enqueued: u64,
    pub resolved: u64,
    /// Due samples whose start or end snapshot was missing.
    pub dropped_unresolvable: u64,
    /// Samples pushed out by the capacity limit before they were due.
    pub evicted: u64,
}

/// Bounded FIFO of pending samples, ordered by insertion.
#[derive(Debug, Clone)]
pub struct PendingLabelQueue {
    horizon_sec: u32,
    capacity: usize,
    entries: VecDeque<PendingPrediction>,
    stats: QueueStats,
}

impl PendingLabelQueue {
    #[must_use]
    pub fn new(horizon_sec: u32, capacity: usize) -> Self {
        Self {
            horizon_sec,
            capacity: capacity.max(1),
            entries: VecDeque::new(),
            stats: QueueStats::default(),
        }
    }

    #[must_use]
    pub fn horizon_sec(&self) -> u32 {
        self.horizon_sec
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn stats(&self) -> QueueStats {
        self.stats
    }

    /// Appends a sample, evicting the oldest entry when full.
    pub fn push(&mut self, prediction: PendingPrediction) {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
            self.stats.evicted += 1;
        }
        self.entries.push_back(prediction);
        self.stats.enqueued += 1;
    }

    /// Like [`push`](Self::push), but replaces a pending sample with the same
    /// `t_sec` instead of adding a second one.
    ///
    /// Model outputs already attached to the replaced entry are kept unless the new
    /// sample carries its own.
    pub fn merge_or_push(&mut self, mut prediction: PendingPrediction) {
        if let Some(existing) = self
            .entries
            .iter_mut()
            .rev()
            .find(|p| p.t_sec == prediction.t_sec)
        {
            if prediction.model_outputs.is_empty() {
                prediction.model_outputs = existing.model_outputs;
            }
            *existing = prediction;
            return;
        }
        self.push(prediction);
    }

    /// Resolves every sample whose horizon has elapsed at `now_sec`.
    ///
    /// Due samples are removed whether or not they could be labeled. Resolved samples
    /// are returned in queue order.
    pub fn resolve(
        &mut self,
        window: &SnapshotWindow,
        now_sec: u32,
        labels: &LabelSet,
    ) -> Vec<ResolvedSample> {
        let horizon = self.horizon_sec;
        let mut resolved = vec![];
        let mut waiting = VecDeque::with_capacity(self.entries.len());

        for prediction in self.entries.drain(..) {
            let end_sec = prediction.t_sec.saturating_add(horizon);
            if end_sec > now_sec {
                waiting.push_back(prediction);
                continue;
            }
            let (Some(start), Some(end)) = (window.get(prediction.t_sec), window.get(end_sec))
            else {
                tracing::debug!(
                    t_sec = prediction.t_sec,
                    end_sec,
                    "dropping unresolvable sample: snapshot missing"
                );
                self.stats.dropped_unresolvable += 1;
                continue;
            };
            let labels = labels.evaluate(&CounterDeltas::between(start, end));
            resolved.push(ResolvedSample {
                prediction,
                start: *start,
                end: *end,
                labels,
            });
        }

        self.entries = waiting;
        self.stats.resolved += resolved.len() as u64;
        resolved
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
