//! Running evaluation of externally produced predictions against resolved labels.

use riskcast_stats::{brier::BrierAccumulator, confusion::ConfusionMatrix};
use serde::{Deserialize, Serialize};

use crate::pending::ModelOutputs;

/// Label names scored by the online evaluator.
pub const MISS_LABEL: &str = "y_missNext5";
pub const SCORE_DROP_LABEL: &str = "y_scoreDropNext5";

#[derive(Debug, Clone, Copy, Default)]
struct Tracker {
    brier: BrierAccumulator,
    confusion: ConfusionMatrix,
}

impl Tracker {
    fn observe(&mut self, prob: f32, label: bool, threshold: f32) {
        self.brier.push(label, prob);
        self.confusion.record(label, prob >= threshold);
    }

    fn report(&self) -> TargetReport {
        TargetReport {
            count: self.brier.count(),
            brier: self.brier.mean(),
            confusion: self.confusion,
            precision: self.confusion.precision(),
            recall: self.confusion.recall(),
            f1: self.confusion.f1(),
        }
    }
}

/// Metrics for one predicted target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetReport {
    pub count: u64,
    pub brier: Option<f64>,
    pub confusion: ConfusionMatrix,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlineReport {
    pub threshold: f32,
    pub miss: TargetReport,
    pub score_drop: TargetReport,
}

/// Accumulates Brier scores and confusion counts for `pMissNext5` and
/// `pScoreDropNext5` as their labels resolve.
///
/// A target is scored only for samples that carry both the prediction and the label.
#[derive(Debug, Clone, Copy)]
pub struct OnlineEvaluator {
    threshold: f32,
    miss: Tracker,
    score_drop: Tracker,
}

impl OnlineEvaluator {
    #[must_use]
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            miss: Tracker::default(),
            score_drop: Tracker::default(),
        }
    }

    pub fn observe(&mut self, outputs: &ModelOutputs, label: impl Fn(&str) -> Option<bool>) {
        if let (Some(p), Some(y)) = (outputs.p_miss_next5, label(MISS_LABEL)) {
            self.miss.observe(p, y, self.threshold);
        }
        if let (Some(p), Some(y)) = (outputs.p_score_drop_next5, label(SCORE_DROP_LABEL)) {
            self.score_drop.observe(p, y, self.threshold);
        }
    }

    #[must_use]
    pub fn report(&self) -> OnlineReport {
        OnlineReport {
            threshold: self.threshold,
            miss: self.miss.report(),
            score_drop: self.score_drop.report(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.threshold);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn labels(miss: i64, drop: i64) -> BTreeMap<String, i64> {
        BTreeMap::from([
            (MISS_LABEL.to_owned(), miss),
            (SCORE_DROP_LABEL.to_owned(), drop),
        ])
    }

    #[test]
    fn test_accumulates_both_targets() {
        let mut eval = OnlineEvaluator::new(0.65);
        let outputs = ModelOutputs {
            p_miss_next5: Some(0.9),
            p_score_drop_next5: Some(0.2),
            ..ModelOutputs::default()
        };
        for (miss, drop) in [(1, 0), (0, 1)] {
            let l = labels(miss, drop);
            eval.observe(&outputs, |name| l.get(name).map(|v| *v > 0));
        }
        let report = eval.report();
        assert_eq!(report.miss.count, 2);
        assert_eq!(report.miss.confusion.true_positives, 1);
        assert_eq!(report.miss.confusion.false_positives, 1);
        assert!((report.miss.brier.unwrap() - (0.01 + 0.81) / 2.0).abs() < 1e-6);
        assert_eq!(report.score_drop.confusion.true_negatives, 1);
        assert_eq!(report.score_drop.confusion.false_negatives, 1);
    }

    #[test]
    fn test_missing_prediction_is_not_scored() {
        let mut eval = OnlineEvaluator::new(0.65);
        let l = labels(1, 1);
        eval.observe(&ModelOutputs::default(), |name| l.get(name).map(|v| *v > 0));
        let report = eval.report();
        assert_eq!(report.miss.count, 0);
        assert_eq!(report.miss.brier, None);
    }
}
