//! Class-weighted binary cross-entropy.

use crate::ScoredLabel;

/// Smallest probability distance from 0 and 1 allowed before taking a logarithm.
pub const PROB_EPSILON: f64 = 1e-6;

/// Clamps a probability into `[PROB_EPSILON, 1 - PROB_EPSILON]`.
///
/// Non-finite input maps to the lower bound so that a broken prediction is
/// penalized instead of producing `NaN`.
#[must_use]
pub fn clamp_probability(p: f64) -> f64 {
    if p.is_finite() {
        p.clamp(PROB_EPSILON, 1.0 - PROB_EPSILON)
    } else {
        PROB_EPSILON
    }
}

/// Binary cross-entropy of one sample, scaled by `pos_weight` when the label is positive.
///
/// # Examples
///
/// ```
/// use riskcast_stats::loss::weighted_bce;
///
/// let unweighted = weighted_bce(true, 0.5, 1.0);
/// let weighted = weighted_bce(true, 0.5, 3.0);
/// assert!((weighted - 3.0 * unweighted).abs() < 1e-12);
/// assert_eq!(weighted_bce(false, 0.5, 3.0), unweighted);
/// ```
#[must_use]
pub fn weighted_bce(label: bool, prob: f64, pos_weight: f64) -> f64 {
    let p = clamp_probability(prob);
    if label {
        -pos_weight * p.ln()
    } else {
        -(1.0 - p).ln()
    }
}

/// Mean weighted cross-entropy over a set of samples.
///
/// Returns `None` for an empty set.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn mean_weighted_bce(samples: &[ScoredLabel], pos_weight: f64) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let sum = samples
        .iter()
        .map(|s| weighted_bce(s.label, f64::from(s.score), pos_weight))
        .sum::<f64>();
    Some(sum / samples.len() as f64)
}
