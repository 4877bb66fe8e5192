//! Offline evaluation of a trained model on dataset rows.

use riskcast_collector::row::Row;
use riskcast_stats::{ScoredLabel, report::EvaluationReport};

use crate::model::Mlp;

/// Scores every row that carries label `label`.
///
/// Rows without the label are skipped.
#[must_use]
pub fn score_rows<'a>(
    model: &Mlp,
    rows: impl IntoIterator<Item = &'a Row>,
    label: &str,
) -> Vec<ScoredLabel> {
    rows.into_iter()
        .filter_map(|row| {
            let y = row.binary_label(label)?;
            Some(ScoredLabel::new(y, model.predict(row.features.as_array())))
        })
        .collect()
}

/// Evaluates `model` on `rows` against label `label`.
///
/// # Arguments
///
/// * `threshold` - Decision threshold for the confusion matrix
/// * `pos_weight` - Positive-class weight for the reported loss
#[must_use]
pub fn evaluate_rows<'a>(
    model: &Mlp,
    rows: impl IntoIterator<Item = &'a Row>,
    label: &str,
    threshold: f32,
    pos_weight: f64,
) -> EvaluationReport {
    let scored = score_rows(model, rows, label);
    EvaluationReport::new(&scored, threshold, pos_weight)
}
