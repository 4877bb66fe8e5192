//! Brier score (mean squared probability error).
//!
//! The score is always in `[0, 1]` because probabilities are clamped into `[0, 1]`
//! before the squared error is taken.

use serde::{Deserialize, Serialize};

use crate::ScoredLabel;

/// Computes the Brier score of an evaluation set.
///
/// Returns `None` for an empty set.
///
/// # Examples
///
/// ```
/// use riskcast_stats::{ScoredLabel, brier::brier_score};
///
/// let samples = [ScoredLabel::new(true, 1.0), ScoredLabel::new(false, 0.5)];
/// assert_eq!(brier_score(&samples), Some(0.125));
/// ```
#[must_use]
pub fn brier_score(samples: &[ScoredLabel]) -> Option<f64> {
    let mut acc = BrierAccumulator::default();
    for s in samples {
        acc.push(s.label, s.score);
    }
    acc.mean()
}

/// Incremental Brier score, used where samples arrive one at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BrierAccumulator {
    sum: f64,
    count: u64,
}

impl BrierAccumulator {
    /// Adds one observation.
    pub fn push(&mut self, label: bool, prob: f32) {
        let p = if prob.is_finite() {
            f64::from(prob).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let y = if label { 1.0 } else { 0.0 };
        self.sum += (p - y).powi(2);
        self.count += 1;
    }

    /// Number of observations added so far.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Mean squared error so far, or `None` before the first observation.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_predictions_score_zero() {
        let samples = [ScoredLabel::new(true, 1.0), ScoredLabel::new(false, 0.0)];
        assert_eq!(brier_score(&samples), Some(0.0));
    }

    #[test]
    fn test_worst_predictions_score_one() {
        let samples = [ScoredLabel::new(true, 0.0), ScoredLabel::new(false, 1.0)];
        assert_eq!(brier_score(&samples), Some(1.0));
    }

    #[test]
    fn test_out_of_range_probabilities_are_clamped() {
        let samples = [ScoredLabel::new(false, 3.0), ScoredLabel::new(true, -2.0)];
        let score = brier_score(&samples).unwrap();
        assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn test_empty_set_has_no_score() {
        assert_eq!(brier_score(&[]), None);
        assert_eq!(BrierAccumulator::default().mean(), None);
    }
}
