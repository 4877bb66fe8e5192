//! Evaluation metrics for binary risk classifiers.
//!
//! This crate provides the scoring tools shared by the collector (online evaluation of
//! live predictions) and the trainer (validation after each epoch):
//!
//! - **Loss**: Class-weighted binary cross-entropy with probability clamping
//! - **Brier score**: Mean squared error between probability and outcome
//! - **AUC**: Area under the ROC curve via the rank-sum (Mann–Whitney U) method
//! - **Confusion matrix**: TP/FP/TN/FN at a decision threshold, with precision/recall/F1
//! - **Report**: All of the above computed in one pass over an evaluation set
//!
//! # Modules
//!
//! - [`loss`]: Weighted binary cross-entropy
//! - [`brier`]: Brier score, batch and incremental
//! - [`auc`]: Rank-based ROC AUC
//! - [`confusion`]: Confusion counts and derived ratios
//! - [`report`]: Combined evaluation report
//!
//! # Examples
//!
//! ```
//! use riskcast_stats::{ScoredLabel, auc, confusion::ConfusionMatrix};
//!
//! let samples = [
//!     ScoredLabel::new(false, 0.1),
//!     ScoredLabel::new(false, 0.4),
//!     ScoredLabel::new(true, 0.35),
//!     ScoredLabel::new(true, 0.8),
//! ];
//! assert_eq!(auc::roc_auc(&samples), 0.75);
//!
//! let matrix = ConfusionMatrix::from_samples(&samples, 0.5);
//! assert_eq!(matrix.true_positives, 1);
//! assert_eq!(matrix.false_negatives, 1);
//! ```
//!
//! # Undefined values
//!
//! AUC is not computable when either class is absent; [`auc::roc_auc`] returns `NaN` in that
//! case. Callers must treat `NaN` as "not computable" and never as zero.

use serde::{Deserialize, Serialize};

pub mod auc;
pub mod brier;
pub mod confusion;
pub mod loss;
pub mod report;

/// A binary outcome paired with the probability a model assigned to it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredLabel {
    /// Observed outcome (`true` = positive class).
    pub label: bool,
    /// Predicted probability of the positive class.
    pub score: f32,
}

impl ScoredLabel {
    #[must_use]
    pub const fn new(label: bool, score: f32) -> Self {
        Self { label, score }
    }

    /// Returns the label as `0.0` / `1.0`.
    #[must_use]
    pub fn target(&self) -> f64 {
        if self.label { 1.0 } else { 0.0 }
    }
}
