//! ROC AUC via the rank-sum (Mann–Whitney U) statistic.
//!
//! Samples are sorted by score ascending and ranked from 1. The AUC is
//!
//! ```text
//! U   = (sum of ranks of positives) - nPos (nPos + 1) / 2
//! AUC = U / (nPos * nNeg)
//! ```
//!
//! Tied scores share the average of the ranks they span, so the result does not
//! depend on the input order of tied samples.

use crate::ScoredLabel;

/// Computes the area under the ROC curve.
///
/// Returns `NaN` when the set has no positives or no negatives.
///
/// # Examples
///
/// ```
/// use riskcast_stats::{ScoredLabel, auc::roc_auc};
///
/// let separable = [ScoredLabel::new(false, 0.2), ScoredLabel::new(true, 0.9)];
/// assert_eq!(roc_auc(&separable), 1.0);
///
/// let inverted = [ScoredLabel::new(true, 0.2), ScoredLabel::new(false, 0.9)];
/// assert_eq!(roc_auc(&inverted), 0.0);
///
/// let one_class = [ScoredLabel::new(true, 0.2), ScoredLabel::new(true, 0.9)];
/// assert!(roc_auc(&one_class).is_nan());
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn roc_auc(samples: &[ScoredLabel]) -> f64 {
    let n_pos = samples.iter().filter(|s| s.label).count();
    let n_neg = samples.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return f64::NAN;
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.score.total_cmp(&b.score));

    let mut rank_sum = 0.0;
    let mut start = 0;
    while start < sorted.len() {
        let score = sorted[start].score;
        let mut end = start;
        while end + 1 < sorted.len() && sorted[end + 1].score.total_cmp(&score).is_eq() {
            end += 1;
        }
        // 1-indexed ranks start+1 ..= end+1
        let average_rank = (start + end + 2) as f64 / 2.0;
        let positives = sorted[start..=end].iter().filter(|s| s.label).count();
        rank_sum += average_rank * positives as f64;
        start = end + 1;
    }

    let n_pos = n_pos as f64;
    let n_neg = n_neg as f64;
    let u = rank_sum - n_pos * (n_pos + 1.0) / 2.0;
    u / (n_pos * n_neg)
}

#[cfg(test)]
mod tests {
    use rand::{Rng as _, SeedableRng as _};
    use rand_pcg::Pcg64Mcg;

    use super::*;

    #[test]
    fn test_all_ties_give_half() {
        let samples = [
            ScoredLabel::new(true, 0.5),
            ScoredLabel::new(false, 0.5),
            ScoredLabel::new(true, 0.5),
            ScoredLabel::new(false, 0.5),
        ];
        assert!((roc_auc(&samples) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_tie_handling_is_order_independent() {
        let a = [
            ScoredLabel::new(true, 0.3),
            ScoredLabel::new(false, 0.3),
            ScoredLabel::new(false, 0.1),
            ScoredLabel::new(true, 0.7),
        ];
        let mut b = a;
        b.swap(0, 1);
        assert_eq!(roc_auc(&a), roc_auc(&b));
    }

    #[test]
    fn test_auc_is_bounded() {
        let mut rng = Pcg64Mcg::seed_from_u64(7);
        for _ in 0..50 {
            let samples: Vec<_> = (0..40)
                .map(|_| ScoredLabel::new(rng.random_bool(0.3), rng.random::<f32>()))
                .collect();
            let auc = roc_auc(&samples);
            if !auc.is_nan() {
                assert!((0.0..=1.0).contains(&auc), "auc out of range: {auc}");
            }
        }
    }

    #[test]
    fn test_uncorrelated_labels_give_about_half() {
        let mut rng = Pcg64Mcg::seed_from_u64(42);
        let samples: Vec<_> = (0..20_000)
            .map(|_| ScoredLabel::new(rng.random_bool(0.5), rng.random::<f32>()))
            .collect();
        let auc = roc_auc(&samples);
        assert!((auc - 0.5).abs() < 0.02, "auc = {auc}");
    }

    #[test]
    fn test_matches_pairwise_definition() {
        let samples = [
            ScoredLabel::new(false, 0.05),
            ScoredLabel::new(true, 0.2),
            ScoredLabel::new(false, 0.3),
            ScoredLabel::new(true, 0.3),
            ScoredLabel::new(false, 0.6),
            ScoredLabel::new(true, 0.9),
        ];
        // count (pos, neg) pairs where pos scores higher, ties count half
        let mut wins = 0.0;
        let mut pairs = 0.0;
        for p in samples.iter().filter(|s| s.label) {
            for n in samples.iter().filter(|s| !s.label) {
                pairs += 1.0;
                if p.score > n.score {
                    wins += 1.0;
                } else if p.score.total_cmp(&n.score).is_eq() {
                    wins += 0.5;
                }
            }
        }
        assert!((roc_auc(&samples) - wins / pairs).abs() < 1e-12);
    }
}
