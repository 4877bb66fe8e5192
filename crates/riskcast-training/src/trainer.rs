//! Mini-batch training with validation-AUC checkpointing and early stopping.
//!
//! # Procedure
//!
//! 1. **Select** - Keep rows carrying the target label (test-split rows are held out
//!    by default)
//! 2. **Shuffle** - Fisher-Yates with a seedable RNG; the last
//!    `max(10, round(N · valPct / 100))` rows form the validation set
//! 3. **Weight** - Positive samples get `clamp(neg / max(1, pos), 1, 20)` from the
//!    training subset, or 10 when it has no positives
//! 4. **Train** - Per epoch, mini-batches in shuffle order, averaged gradients, one
//!    Adam step per batch
//! 5. **Validate** - Weighted BCE and AUC after every epoch
//! 6. **Checkpoint** - Keep the weights of the best validation AUC (see
//!    [`EarlyStopping`])
//!
//! The run ends in one of the [`StopReason`]s. Non-finite values in the output,
//! gradients or weights abort it with [`TrainError::NumericGuard`].
//!
//! Training is CPU-bound and synchronous. Callers run it off their event loop and
//! cancel it through the `AtomicBool` passed to [`Trainer::train`], which is checked
//! between epochs.

use std::sync::atomic::{AtomicBool, Ordering};

use rand::{Rng, SeedableRng, seq::SliceRandom};
use rand_pcg::Pcg64Mcg;
use riskcast_collector::{online::MISS_LABEL, row::Row, split::Split};
use riskcast_stats::{
    ScoredLabel, confusion::DEFAULT_THRESHOLD, loss::weighted_bce, report::EvaluationReport,
};
use serde::{Deserialize, Serialize};

use crate::{
    adam::Adam,
    model::{Gradients, INPUT, Mlp, Tensor},
};

/// Positive-class weight used when the training subset has no positives.
pub const FALLBACK_CLASS_WEIGHT: f32 = 10.0;
/// Lower bound of the validation set size.
pub const MIN_VALIDATION_ROWS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrainingConfig {
    /// Maximum number of epochs, in \[3, 200\].
    pub epochs: usize,
    /// Mini-batch size, in \[8, 256\].
    pub batch: usize,
    /// Adam learning rate, in \[0.0005, 0.2\].
    pub lr: f32,
    /// Validation share in percent, in \[10, 40\].
    pub val_pct: u32,
    /// Epochs without improvement before stopping.
    pub patience: usize,
    /// Margin a validation AUC must exceed the best one by to count as improvement.
    pub min_delta: f64,
    /// Minimum number of usable rows.
    pub min_rows: usize,
    /// RNG seed for initialization and shuffling; OS entropy when absent.
    pub seed: Option<u64>,
    /// Target label name.
    pub label: String,
    /// Exclude rows assigned to the test split.
    pub holdout_test: bool,
    /// Decision threshold for reported confusion metrics.
    pub threshold: f32,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 40,
            batch: 32,
            lr: 0.01,
            val_pct: 20,
            patience: 8,
            min_delta: 0.002,
            min_rows: 40,
            seed: None,
            label: MISS_LABEL.to_owned(),
            holdout_test: true,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl TrainingConfig {
    /// Returns a copy with every numeric option forced into range.
    #[must_use]
    pub fn clamped(&self) -> Self {
        let defaults = Self::default();
        let finite_or = |v: f32, d: f32| if v.is_finite() { v } else { d };
        Self {
            epochs: self.epochs.clamp(3, 200),
            batch: self.batch.clamp(8, 256),
            lr: finite_or(self.lr, defaults.lr).clamp(0.0005, 0.2),
            val_pct: self.val_pct.clamp(10, 40),
            patience: self.patience.max(1),
            min_delta: if self.min_delta.is_finite() {
                self.min_delta.max(0.0)
            } else {
                defaults.min_delta
            },
            min_rows: self.min_rows.max(MIN_VALIDATION_ROWS + 1),
            threshold: finite_or(self.threshold, defaults.threshold).clamp(0.0, 1.0),
            ..self.clone()
        }
    }

    /// Validation set size for `rows` usable rows.
    #[must_use]
    pub fn validation_rows(&self, rows: usize) -> usize {
        let pct = usize::try_from(self.val_pct).unwrap_or(usize::MAX);
        let rounded = (rows.saturating_mul(pct) + 50) / 100;
        rounded.max(MIN_VALIDATION_ROWS).min(rows)
    }
}

/// Positive-class loss weight: `clamp(negatives / max(1, positives), 1, 20)`, or
/// [`FALLBACK_CLASS_WEIGHT`] when there are no positives.
///
/// # Examples
///
/// ```
/// use riskcast_training::trainer::class_weight;
///
/// assert_eq!(class_weight(10, 90), 9.0);
/// assert_eq!(class_weight(1, 1000), 20.0);
/// assert_eq!(class_weight(0, 50), 10.0);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn class_weight(positives: usize, negatives: usize) -> f32 {
    if positives == 0 {
        return FALLBACK_CLASS_WEIGHT;
    }
    (negatives as f32 / positives.max(1) as f32).clamp(1.0, 20.0)
}

/// Why a training run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StopReason {
    /// The best AUC is within the improvement margin of 1.0.
    #[display("converged")]
    Converged,
    /// Patience ran out.
    #[display("early stopped")]
    EarlyStopped,
    /// All epochs ran.
    #[display("exhausted")]
    Exhausted,
    /// The cancellation flag was set.
    #[display("cancelled")]
    Cancelled,
}

/// Result of feeding one validation AUC to [`EarlyStopping::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    /// The epoch is the new best; its weights should be checkpointed.
    pub improved: bool,
    pub stop: Option<StopReason>,
}

/// Best-by-AUC tracker with an improvement margin and patience.
///
/// An epoch improves when its AUC exceeds the best so far by more than `min_delta`.
/// A `NaN` AUC never improves.
///
/// # Examples
///
/// ```
/// use riskcast_training::trainer::{EarlyStopping, StopReason};
///
/// let mut stopping = EarlyStopping::new(2, 0.002);
/// assert!(stopping.update(1, 0.70).improved);
/// assert!(!stopping.update(2, 0.701).improved);
/// assert_eq!(stopping.update(3, f64::NAN).stop, Some(StopReason::EarlyStopped));
/// assert_eq!(stopping.best_epoch(), Some(1));
/// ```
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    patience: usize,
    min_delta: f64,
    best_auc: f64,
    best_epoch: Option<usize>,
    stale: usize,
}

impl EarlyStopping {
    #[must_use]
    pub fn new(patience: usize, min_delta: f64) -> Self {
        Self {
            patience,
            min_delta,
            best_auc: -1.0,
            best_epoch: None,
            stale: 0,
        }
    }

    pub fn update(&mut self, epoch: usize, auc: f64) -> Verdict {
        let auc = if auc.is_finite() { auc } else { -1.0 };
        if auc > self.best_auc + self.min_delta {
            self.best_auc = auc;
            self.best_epoch = Some(epoch);
            self.stale = 0;
            let stop = (self.best_auc + self.min_delta >= 1.0).then_some(StopReason::Converged);
            return Verdict {
                improved: true,
                stop,
            };
        }
        self.stale += 1;
        Verdict {
            improved: false,
            stop: (self.stale >= self.patience).then_some(StopReason::EarlyStopped),
        }
    }

    #[must_use]
    pub fn best_auc(&self) -> Option<f64> {
        self.best_epoch.map(|_| self.best_auc)
    }

    #[must_use]
    pub fn best_epoch(&self) -> Option<usize> {
        self.best_epoch
    }
}

/// Where a non-finite value was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum NumericLocation {
    #[display("output")]
    Output,
    #[display("{_0} gradient")]
    Gradient(Tensor),
    #[display("{_0} weights")]
    Weights(Tensor),
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum TrainError {
    #[display("insufficient data: {rows} usable rows, at least {min} required")]
    InsufficientData { rows: usize, min: usize },
    #[display("non-finite value in {location} during epoch {epoch}")]
    NumericGuard {
        epoch: usize,
        location: NumericLocation,
    },
}

/// Validation results of one epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpochReport {
    pub epoch: usize,
    /// Mean weighted BCE over the training passes of the epoch.
    pub train_loss: f64,
    pub val_loss: Option<f64>,
    /// `None` when not computable (one class missing from the validation set).
    pub val_auc: Option<f64>,
    pub improved: bool,
}

#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    /// Best checkpoint, or the final weights when no epoch improved.
    pub model: Mlp,
    pub stop_reason: StopReason,
    pub best_epoch: Option<usize>,
    pub best_val_auc: Option<f64>,
    pub class_weight: f32,
    /// Usable rows (training plus validation).
    pub rows: usize,
    pub train_rows: usize,
    pub val_rows: usize,
    pub history: Vec<EpochReport>,
    /// Validation metrics of [`Self::model`].
    pub validation: EvaluationReport,
}

#[derive(Debug, Clone, Copy)]
struct Example {
    x: [f32; INPUT],
    y: bool,
}

impl Example {
    fn target(&self) -> f32 {
        if self.y { 1.0 } else { 0.0 }
    }
}

#[derive(Debug, Clone)]
pub struct Trainer {
    config: TrainingConfig,
}

impl Trainer {
    /// Creates a trainer; the configuration is clamped.
    #[must_use]
    pub fn new(config: &TrainingConfig) -> Self {
        Self {
            config: config.clamped(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Trains on `rows`, seeding from the configured seed or OS entropy.
    pub fn train(&self, rows: &[Row], cancel: &AtomicBool) -> Result<TrainingOutcome, TrainError> {
        let mut rng = match self.config.seed {
            Some(seed) => Pcg64Mcg::seed_from_u64(seed),
            None => Pcg64Mcg::from_rng(&mut rand::rng()),
        };
        self.train_with_rng(rows, cancel, &mut rng)
    }

    /// Trains on `rows` with an explicit random number generator.
    ///
    /// # Arguments
    ///
    /// * `rows` - Dataset rows; rows without the target label are ignored
    /// * `cancel` - Checked between epochs; when set the run stops with
    ///   [`StopReason::Cancelled`]
    /// * `rng` - Used for weight initialization and the shuffle
    #[expect(clippy::cast_precision_loss)]
    pub fn train_with_rng<R>(
        &self,
        rows: &[Row],
        cancel: &AtomicBool,
        rng: &mut R,
    ) -> Result<TrainingOutcome, TrainError>
    where
        R: Rng + ?Sized,
    {
        let config = &self.config;
        let mut examples = self.examples(rows);
        if examples.len() < config.min_rows {
            return Err(TrainError::InsufficientData {
                rows: examples.len(),
                min: config.min_rows,
            });
        }

        examples.shuffle(rng);
        let val_rows = config.validation_rows(examples.len());
        let (train, val) = examples.split_at(examples.len() - val_rows);

        let positives = train.iter().filter(|e| e.y).count();
        let w_pos = class_weight(positives, train.len() - positives);
        tracing::info!(
            train = train.len(),
            val = val.len(),
            positives,
            negatives = train.len() - positives,
            class_weight = w_pos,
            "training started"
        );

        let mut model = Mlp::random(rng);
        let mut adam = Adam::new(config.lr);
        let mut stopping = EarlyStopping::new(config.patience, config.min_delta);
        let mut best = model.clone();
        let mut history = Vec::with_capacity(config.epochs);
        let mut stop_reason = StopReason::Exhausted;

        for epoch in 1..=config.epochs {
            if cancel.load(Ordering::Relaxed) {
                tracing::info!(epoch, "training cancelled");
                stop_reason = StopReason::Cancelled;
                break;
            }

            let mut loss_sum = 0.0;
            for batch in train.chunks(config.batch) {
                let mut grads = Gradients::default();
                for example in batch {
                    let act = model.forward(&example.x);
                    if !act.y_hat.is_finite() {
                        return Err(numeric_guard(epoch, NumericLocation::Output));
                    }
                    loss_sum += weighted_bce(example.y, f64::from(act.y_hat), f64::from(w_pos));
                    let weight = if example.y { w_pos } else { 1.0 };
                    grads.accumulate(&model, &example.x, &act, example.target(), weight);
                }
                grads.scale(1.0 / batch.len() as f32);
                if let Some(tensor) = grads.first_non_finite() {
                    return Err(numeric_guard(epoch, NumericLocation::Gradient(tensor)));
                }
                adam.step(&mut model, &grads);
                if let Some(tensor) = model.first_non_finite() {
                    return Err(numeric_guard(epoch, NumericLocation::Weights(tensor)));
                }
            }

            let validation = validate(&model, val, config.threshold, w_pos);
            let verdict = stopping.update(epoch, validation.auc.unwrap_or(f64::NAN));
            if verdict.improved {
                best.clone_from(&model);
            }
            let report = EpochReport {
                epoch,
                train_loss: loss_sum / train.len() as f64,
                val_loss: validation.loss,
                val_auc: validation.auc,
                improved: verdict.improved,
            };
            tracing::info!(
                epoch,
                epochs = config.epochs,
                train_loss = report.train_loss,
                val_loss = ?report.val_loss,
                val_auc = ?report.val_auc,
                improved = report.improved,
                "epoch finished"
            );
            history.push(report);

            if let Some(reason) = verdict.stop {
                stop_reason = reason;
                break;
            }
        }

        let model = if stopping.best_epoch().is_some() {
            best
        } else {
            model
        };
        let validation = validate(&model, val, config.threshold, w_pos);
        tracing::info!(
            %stop_reason,
            best_epoch = ?stopping.best_epoch(),
            best_val_auc = ?stopping.best_auc(),
            "training finished"
        );

        Ok(TrainingOutcome {
            model,
            stop_reason,
            best_epoch: stopping.best_epoch(),
            best_val_auc: stopping.best_auc(),
            class_weight: w_pos,
            rows: examples.len(),
            train_rows: train.len(),
            val_rows: val.len(),
            history,
            validation,
        })
    }

    fn examples(&self, rows: &[Row]) -> Vec<Example> {
        let mut unlabeled = 0_usize;
        let examples: Vec<_> = rows
            .iter()
            .filter(|row| !(self.config.holdout_test && row.split == Split::Test))
            .filter_map(|row| {
                let y = row.binary_label(&self.config.label);
                if y.is_none() {
                    unlabeled += 1;
                }
                Some(Example {
                    x: *row.features.as_array(),
                    y: y?,
                })
            })
            .collect();
        if unlabeled > 0 {
            tracing::debug!(
                unlabeled,
                label = %self.config.label,
                "skipped rows without target label"
            );
        }
        examples
    }
}

fn numeric_guard(epoch: usize, location: NumericLocation) -> TrainError {
    tracing::warn!(epoch, %location, "non-finite value, aborting training");
    TrainError::NumericGuard { epoch, location }
}

fn validate(model: &Mlp, val: &[Example], threshold: f32, w_pos: f32) -> EvaluationReport {
    let scored: Vec<_> = val
        .iter()
        .map(|e| ScoredLabel::new(e.y, model.predict(&e.x)))
        .collect();
    EvaluationReport::new(&scored, threshold, f64::from(w_pos))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use riskcast_collector::{
        feature::FeatureVector,
        pending::{ModelOutputs, SampleContext},
        row::CounterTotals,
    };

    use super::*;

    fn row(x0: f32, x3: f32, label: bool, split: Split) -> Row {
        let mut values = [0.0; INPUT];
        values[0] = x0;
        values[3] = x3;
        values[31] = 1.0;
        Row {
            split,
            session: "s|1|groups".to_owned(),
            t_sec: 0,
            horizon_sec: 5,
            context: SampleContext::default(),
            features: FeatureVector::new(values),
            totals: CounterTotals::default(),
            model_outputs: ModelOutputs::default(),
            labels: BTreeMap::from([(MISS_LABEL.to_owned(), i64::from(label))]),
        }
    }

    /// Rows whose label is `x0 > 0.5`, with `x3` as noise.
    fn separable_rows(n: usize, seed: u64) -> Vec<Row> {
        let mut rng = Pcg64Mcg::seed_from_u64(seed);
        (0..n)
            .map(|_| {
                let x0: f32 = rng.random();
                let x3: f32 = rng.random();
                row(x0, x3, x0 > 0.5, Split::Train)
            })
            .collect()
    }

    /// Rows whose label is independent of the features.
    fn noisy_rows(n: usize, seed: u64) -> Vec<Row> {
        let mut rng = Pcg64Mcg::seed_from_u64(seed);
        (0..n)
            .map(|_| row(rng.random(), rng.random(), rng.random_bool(0.3), Split::Train))
            .collect()
    }

    fn config(seed: u64) -> TrainingConfig {
        TrainingConfig {
            seed: Some(seed),
            ..TrainingConfig::default()
        }
    }

    mod config {
        use super::*;

        #[test]
        fn test_clamps_out_of_range_values() {
            let clamped = TrainingConfig {
                epochs: 1,
                batch: 1000,
                lr: 5.0,
                val_pct: 3,
                ..TrainingConfig::default()
            }
            .clamped();
            assert_eq!(clamped.epochs, 3);
            assert_eq!(clamped.batch, 256);
            assert_eq!(clamped.lr, 0.2);
            assert_eq!(clamped.val_pct, 10);

            let clamped = TrainingConfig {
                lr: f32::NAN,
                ..TrainingConfig::default()
            }
            .clamped();
            assert_eq!(clamped.lr, 0.01);
        }

        #[test]
        fn test_partial_json() {
            let config: TrainingConfig =
                serde_json::from_str(r#"{"epochs": 12, "valPct": 25, "seed": 9}"#).unwrap();
            assert_eq!(config.epochs, 12);
            assert_eq!(config.val_pct, 25);
            assert_eq!(config.seed, Some(9));
            assert_eq!(config.patience, 8);
            assert_eq!(config.label, MISS_LABEL);
        }

        #[test]
        fn test_validation_rows() {
            let config = TrainingConfig::default();
            assert_eq!(config.validation_rows(40), 10);
            assert_eq!(config.validation_rows(100), 20);
            assert_eq!(config.validation_rows(1003), 201);
        }
    }

    mod class_weight {
        use super::*;

        #[test]
        fn test_ratio_and_bounds() {
            assert_eq!(class_weight(10, 90), 9.0);
            assert_eq!(class_weight(50, 50), 1.0);
            assert_eq!(class_weight(90, 10), 1.0);
            assert_eq!(class_weight(2, 100), 20.0);
        }

        #[test]
        fn test_no_positives_uses_fallback() {
            assert_eq!(class_weight(0, 100), FALLBACK_CLASS_WEIGHT);
            assert_eq!(class_weight(0, 0), FALLBACK_CLASS_WEIGHT);
        }
    }

    mod early_stopping {
        use super::*;

        #[test]
        fn test_plateau_stops_after_patience() {
            let mut stopping = EarlyStopping::new(8, 0.002);
            let aucs = [0.60, 0.65, 0.70, 0.75, 0.80];
            let mut stopped_at = None;
            for epoch in 1..=50 {
                let auc = aucs.get(epoch - 1).copied().unwrap_or(0.80);
                let verdict = stopping.update(epoch, auc);
                assert_eq!(verdict.improved, epoch <= 5);
                if verdict.stop.is_some() {
                    assert_eq!(verdict.stop, Some(StopReason::EarlyStopped));
                    stopped_at = Some(epoch);
                    break;
                }
            }
            assert_eq!(stopped_at, Some(13));
            assert_eq!(stopping.best_epoch(), Some(5));
            assert_eq!(stopping.best_auc(), Some(0.80));
        }

        #[test]
        fn test_margin_is_required() {
            let mut stopping = EarlyStopping::new(8, 0.002);
            assert!(stopping.update(1, 0.7).improved);
            assert!(!stopping.update(2, 0.7015).improved);
            assert!(stopping.update(3, 0.703).improved);
        }

        #[test]
        fn test_nan_never_improves() {
            let mut stopping = EarlyStopping::new(3, 0.002);
            for epoch in 1..=2 {
                assert!(!stopping.update(epoch, f64::NAN).improved);
            }
            let verdict = stopping.update(3, f64::NAN);
            assert_eq!(verdict.stop, Some(StopReason::EarlyStopped));
            assert_eq!(stopping.best_epoch(), None);
            assert_eq!(stopping.best_auc(), None);
        }

        #[test]
        fn test_perfect_auc_converges() {
            let mut stopping = EarlyStopping::new(8, 0.002);
            assert_eq!(stopping.update(1, 0.9).stop, None);
            let verdict = stopping.update(2, 0.999);
            assert!(verdict.improved);
            assert_eq!(verdict.stop, Some(StopReason::Converged));
        }
    }

    mod train {
        use super::*;

        #[test]
        fn test_insufficient_data() {
            let rows = separable_rows(39, 1);
            let err = Trainer::new(&config(1))
                .train(&rows, &AtomicBool::new(false))
                .unwrap_err();
            assert_eq!(err, TrainError::InsufficientData { rows: 39, min: 40 });
        }

        #[test]
        fn test_test_split_and_unlabeled_rows_are_excluded() {
            let mut rows = separable_rows(45, 2);
            for row in &mut rows[..3] {
                row.split = Split::Test;
            }
            rows[3].labels.clear();
            let err = Trainer::new(&config(2))
                .train(&rows, &AtomicBool::new(false))
                .unwrap_err();
            assert_eq!(err, TrainError::InsufficientData { rows: 41, min: 40 });

            rows.truncate(42);
            let err = Trainer::new(&config(2))
                .train(&rows, &AtomicBool::new(false))
                .unwrap_err();
            assert_eq!(err, TrainError::InsufficientData { rows: 38, min: 40 });
        }

        #[test]
        fn test_learns_separable_target() {
            let rows = separable_rows(400, 3);
            let outcome = Trainer::new(&config(3))
                .train(&rows, &AtomicBool::new(false))
                .unwrap();
            assert_eq!(outcome.rows, 400);
            assert_eq!(outcome.val_rows, 80);
            assert_eq!(outcome.train_rows, 320);
            assert!(!outcome.history.is_empty());
            assert!(outcome.best_val_auc.unwrap() > 0.9);
            assert_eq!(outcome.validation.auc, outcome.best_val_auc);
            assert!(outcome.model.first_non_finite().is_none());
            let best = outcome.best_epoch.unwrap();
            assert!(outcome.history[best - 1].improved);
        }

        #[test]
        fn test_seed_makes_runs_reproducible() {
            let rows = separable_rows(120, 4);
            let trainer = Trainer::new(&TrainingConfig {
                epochs: 5,
                ..config(11)
            });
            let a = trainer.train(&rows, &AtomicBool::new(false)).unwrap();
            let b = trainer.train(&rows, &AtomicBool::new(false)).unwrap();
            assert_eq!(a.model, b.model);
            assert_eq!(a.history, b.history);
        }

        #[test]
        fn test_exported_model_is_best_epoch_checkpoint() {
            let rows = noisy_rows(200, 7);
            let base = TrainingConfig {
                epochs: 200,
                patience: 3,
                ..config(21)
            };
            let outcome = Trainer::new(&base)
                .train(&rows, &AtomicBool::new(false))
                .unwrap();
            let best = outcome.best_epoch.unwrap();
            assert!(outcome.history.len() > best, "{:?}", outcome.stop_reason);

            // same seed, stopped at the best epoch
            let replay = Trainer::new(&TrainingConfig {
                epochs: best,
                ..base
            })
            .train(&rows, &AtomicBool::new(false))
            .unwrap();
            assert_eq!(replay.history[..], outcome.history[..replay.history.len()]);
            assert_eq!(replay.best_epoch, Some(best));
            assert_eq!(outcome.model, replay.model);
        }

        #[test]
        fn test_cancel_before_first_epoch() {
            let rows = separable_rows(60, 5);
            let outcome = Trainer::new(&config(5))
                .train(&rows, &AtomicBool::new(true))
                .unwrap();
            assert_eq!(outcome.stop_reason, StopReason::Cancelled);
            assert!(outcome.history.is_empty());
            assert_eq!(outcome.best_epoch, None);
            assert_eq!(outcome.best_val_auc, None);
        }

        #[test]
        fn test_single_class_validation_keeps_final_model() {
            let rows: Vec<_> = (0..50)
                .map(|i| row(i as f32 / 50.0, 0.0, false, Split::Train))
                .collect();
            let outcome = Trainer::new(&TrainingConfig {
                epochs: 20,
                patience: 4,
                ..config(6)
            })
            .train(&rows, &AtomicBool::new(false))
            .unwrap();
            assert_eq!(outcome.stop_reason, StopReason::EarlyStopped);
            assert_eq!(outcome.history.len(), 4);
            assert_eq!(outcome.best_epoch, None);
            assert_eq!(outcome.class_weight, FALLBACK_CLASS_WEIGHT);
            assert!(outcome.history.iter().all(|e| e.val_auc.is_none()));
        }
    }
}
