//! Confusion counts at a fixed decision threshold.

use serde::{Deserialize, Serialize};

use crate::ScoredLabel;

/// Decision threshold used when the caller does not pick one.
pub const DEFAULT_THRESHOLD: f32 = 0.65;

/// True/false positive/negative counts.
///
/// A sample is predicted positive when its score is `>= threshold`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfusionMatrix {
    pub true_positives: u64,
    pub false_positives: u64,
    pub true_negatives: u64,
    pub false_negatives: u64,
}

impl ConfusionMatrix {
    /// Tallies a whole evaluation set.
    #[must_use]
    pub fn from_samples(samples: &[ScoredLabel], threshold: f32) -> Self {
        let mut matrix = Self::default();
        for s in samples {
            matrix.record(s.label, s.score >= threshold);
        }
        matrix
    }

    /// Adds one observation given the true label and the thresholded prediction.
    pub fn record(&mut self, label: bool, predicted: bool) {
        match (predicted, label) {
            (true, true) => self.true_positives += 1,
            (true, false) => self.false_positives += 1,
            (false, false) => self.true_negatives += 1,
            (false, true) => self.false_negatives += 1,
        }
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.true_positives + self.false_positives + self.true_negatives + self.false_negatives
    }

    /// `TP / (TP + FP)`, denominator floored at 1.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn precision(&self) -> f64 {
        self.true_positives as f64 / (self.true_positives + self.false_positives).max(1) as f64
    }

    /// `TP / (TP + FN)`, denominator floored at 1.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn recall(&self) -> f64 {
        self.true_positives as f64 / (self.true_positives + self.false_negatives).max(1) as f64
    }

    /// Harmonic mean of precision and recall; `0.0` when both are zero.
    #[must_use]
    pub fn f1(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        2.0 * p * r / (p + r).max(1e-9)
    }

    /// `(TP + TN) / total`, denominator floored at 1.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        (self.true_positives + self.true_negatives) as f64 / self.total().max(1) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_is_inclusive() {
        let samples = [ScoredLabel::new(true, DEFAULT_THRESHOLD)];
        let m = ConfusionMatrix::from_samples(&samples, DEFAULT_THRESHOLD);
        assert_eq!(m.true_positives, 1);
    }

    #[test]
    fn test_ratios() {
        let m = ConfusionMatrix {
            true_positives: 6,
            false_positives: 2,
            true_negatives: 10,
            false_negatives: 4,
        };
        assert!((m.precision() - 0.75).abs() < 1e-12);
        assert!((m.recall() - 0.6).abs() < 1e-12);
        assert!((m.f1() - 2.0 * 0.75 * 0.6 / 1.35).abs() < 1e-12);
        assert!((m.accuracy() - 16.0 / 22.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_matrix_has_zero_ratios() {
        let m = ConfusionMatrix::default();
        assert_eq!(m.precision(), 0.0);
        assert_eq!(m.recall(), 0.0);
        assert_eq!(m.f1(), 0.0);
        assert_eq!(m.accuracy(), 0.0);
    }
}
