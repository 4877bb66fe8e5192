//! Combined evaluation report.

use serde::{Deserialize, Serialize};

use crate::{ScoredLabel, auc, brier, confusion::ConfusionMatrix, loss};

/// Every metric the evaluator produces for one evaluation set.
///
/// `auc` is `None` when it is not computable (one class missing). `loss` and `brier`
/// are `None` for an empty set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationReport {
    pub count: usize,
    pub positives: usize,
    pub loss: Option<f64>,
    pub brier: Option<f64>,
    pub auc: Option<f64>,
    pub threshold: f32,
    pub confusion: ConfusionMatrix,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl EvaluationReport {
    /// Evaluates `samples` with the given decision threshold and positive-class loss weight.
    ///
    /// # Examples
    ///
    /// ```
    /// use riskcast_stats::{ScoredLabel, report::EvaluationReport};
    ///
    /// let samples = [ScoredLabel::new(true, 0.9), ScoredLabel::new(false, 0.2)];
    /// let report = EvaluationReport::new(&samples, 0.65, 1.0);
    /// assert_eq!(report.auc, Some(1.0));
    /// assert_eq!(report.f1, 1.0);
    /// ```
    #[must_use]
    pub fn new(samples: &[ScoredLabel], threshold: f32, pos_weight: f64) -> Self {
        let confusion = ConfusionMatrix::from_samples(samples, threshold);
        let auc = auc::roc_auc(samples);
        Self {
            count: samples.len(),
            positives: samples.iter().filter(|s| s.label).count(),
            loss: loss::mean_weighted_bce(samples, pos_weight),
            brier: brier::brier_score(samples),
            auc: (!auc.is_nan()).then_some(auc),
            threshold,
            confusion,
            precision: confusion.precision(),
            recall: confusion.recall(),
            f1: confusion.f1(),
        }
    }
}
