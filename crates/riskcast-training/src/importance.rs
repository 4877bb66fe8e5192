//! Feature importance of a trained model on a labeled row set.
//!
//! Both methods report the rise in mean (unweighted) cross-entropy when one input
//! stops carrying information:
//!
//! - [`permutation_importance`] shuffles the feature's column across rows
//! - [`occlusion_importance`] replaces it with the column mean
//!
//! A feature the model ignores scores exactly zero. Negative values mean the model
//! does slightly better without the feature on this set.

use rand::{Rng, seq::SliceRandom};
use riskcast_collector::{
    feature::{FEATURE_COUNT, FEATURE_SPECS},
    row::Row,
};
use riskcast_stats::{ScoredLabel, loss::mean_weighted_bce};
use serde::Serialize;

use crate::model::Mlp;

/// Upper bound on shuffles averaged per feature.
pub const MAX_REPEATS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureImportance {
    pub index: usize,
    pub name: &'static str,
    /// Loss increase over the unperturbed baseline.
    pub importance: f64,
}

impl FeatureImportance {
    fn new(index: usize, importance: f64) -> Self {
        Self {
            index,
            name: FEATURE_SPECS[index].name,
            importance,
        }
    }
}

/// Sorts by importance, largest first.
pub fn rank(importances: &mut [FeatureImportance]) {
    importances.sort_by(|a, b| b.importance.total_cmp(&a.importance));
}

struct LabeledSet {
    inputs: Vec<[f32; FEATURE_COUNT]>,
    targets: Vec<bool>,
}

impl LabeledSet {
    fn new<'a>(rows: impl IntoIterator<Item = &'a Row>, label: &str) -> Self {
        let (inputs, targets) = rows
            .into_iter()
            .filter_map(|row| Some((*row.features.as_array(), row.binary_label(label)?)))
            .unzip();
        Self { inputs, targets }
    }

    fn loss(&self, model: &Mlp, mut input: impl FnMut(usize) -> [f32; FEATURE_COUNT]) -> f64 {
        let scored: Vec<ScoredLabel> = self
            .targets
            .iter()
            .enumerate()
            .map(|(i, &y)| ScoredLabel::new(y, model.predict(&input(i))))
            .collect();
        mean_weighted_bce(&scored, 1.0).unwrap_or(0.0)
    }
}

/// Permutation importance of every feature.
///
/// Returns an empty list when no row carries `label`.
///
/// # Arguments
///
/// * `repeats` - Shuffles averaged per feature, clamped to `1..=MAX_REPEATS`
/// * `rng` - Source of the shuffles
#[expect(clippy::cast_precision_loss)]
pub fn permutation_importance<'a, R>(
    model: &Mlp,
    rows: impl IntoIterator<Item = &'a Row>,
    label: &str,
    repeats: usize,
    rng: &mut R,
) -> Vec<FeatureImportance>
where
    R: Rng + ?Sized,
{
    let set = LabeledSet::new(rows, label);
    if set.targets.is_empty() {
        return vec![];
    }
    let repeats = repeats.clamp(1, MAX_REPEATS);
    let baseline = set.loss(model, |i| set.inputs[i]);

    let mut order: Vec<usize> = (0..set.inputs.len()).collect();
    let mut importances = Vec::with_capacity(FEATURE_COUNT);
    for feature in 0..FEATURE_COUNT {
        let mut total = 0.0;
        for _ in 0..repeats {
            order.shuffle(rng);
            let loss = set.loss(model, |i| {
                let mut x = set.inputs[i];
                x[feature] = set.inputs[order[i]][feature];
                x
            });
            total += loss - baseline;
        }
        importances.push(FeatureImportance::new(feature, total / repeats as f64));
    }
    importances
}

/// Occlusion importance of every feature.
///
/// Returns an empty list when no row carries `label`.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn occlusion_importance<'a>(
    model: &Mlp,
    rows: impl IntoIterator<Item = &'a Row>,
    label: &str,
) -> Vec<FeatureImportance> {
    let set = LabeledSet::new(rows, label);
    if set.targets.is_empty() {
        return vec![];
    }
    let baseline = set.loss(model, |i| set.inputs[i]);
    let n = set.inputs.len() as f32;

    (0..FEATURE_COUNT)
        .map(|feature| {
            let mean = set.inputs.iter().map(|x| x[feature]).sum::<f32>() / n;
            let loss = set.loss(model, |i| {
                let mut x = set.inputs[i];
                x[feature] = mean;
                x
            });
            FeatureImportance::new(feature, loss - baseline)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use rand::SeedableRng;
    use rand_pcg::Pcg64Mcg;
    use riskcast_collector::{
        feature::FeatureVector,
        pending::{ModelOutputs, SampleContext},
        row::CounterTotals,
        split::Split,
    };

    use super::*;

    const LABEL: &str = "y_missNext5";

    fn row(i: u32, positive: bool) -> Row {
        let mut values = [0.0; FEATURE_COUNT];
        values[0] = if positive { 1.0 } else { 0.0 };
        // uninformative but varying
        values[5] = f32::from(u8::from(i % 3 == 0));
        values[12] = f32::from(u8::try_from(i % 7).unwrap()) / 7.0;
        values[31] = 1.0;
        Row {
            split: Split::Val,
            session: "s|1|g".to_owned(),
            t_sec: i,
            horizon_sec: 5,
            context: SampleContext::default(),
            features: FeatureVector::new(values),
            totals: CounterTotals::default(),
            model_outputs: ModelOutputs::default(),
            labels: BTreeMap::from([(LABEL.to_owned(), i64::from(positive))]),
        }
    }

    fn rows() -> Vec<Row> {
        (0..20).map(|i| row(i, i % 2 == 0)).collect()
    }

    /// Reads only feature 0.
    fn model() -> Mlp {
        let mut model = Mlp::zeros();
        model.w1[0][0] = 10.0;
        model.w2[0] = 10.0;
        model.b2 = -5.0;
        model
    }

    fn assert_only_first_feature_matters(importances: &[FeatureImportance]) {
        assert_eq!(importances.len(), FEATURE_COUNT);
        assert!(importances[0].importance > 0.5, "{:?}", importances[0]);
        for imp in &importances[1..] {
            assert_eq!(imp.importance, 0.0, "{imp:?}");
        }
    }

    #[test]
    fn test_permutation_finds_informative_feature() {
        let mut rng = Pcg64Mcg::seed_from_u64(11);
        let importances = permutation_importance(&model(), &rows(), LABEL, 3, &mut rng);
        assert_only_first_feature_matters(&importances);
        assert_eq!(importances[0].name, "accuracy");
    }

    #[test]
    fn test_occlusion_finds_informative_feature() {
        let importances = occlusion_importance(&model(), &rows(), LABEL);
        assert_only_first_feature_matters(&importances);
    }

    #[test]
    fn test_unlabeled_rows_give_no_importances() {
        let mut rng = Pcg64Mcg::seed_from_u64(11);
        assert!(permutation_importance(&model(), &rows(), "y_other", 1, &mut rng).is_empty());
        assert!(occlusion_importance(&model(), std::iter::empty(), LABEL).is_empty());
    }

    #[test]
    fn test_rank_orders_largest_first() {
        let mut importances = occlusion_importance(&model(), &rows(), LABEL);
        rank(&mut importances);
        assert_eq!(importances[0].index, 0);
        assert!(
            importances
                .windows(2)
                .all(|w| w[0].importance >= w[1].importance)
        );
    }
}
