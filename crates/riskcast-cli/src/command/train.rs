use std::{
    path::PathBuf,
    sync::atomic::{AtomicBool, Ordering},
    thread,
    time::{Duration, Instant},
};

use anyhow::Context;
use chrono::Utc;
use riskcast_training::{
    artifact::ModelArtifact,
    trainer::{Trainer, TrainingConfig},
};

use crate::util::{self, Output};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct TrainArg {
    /// Dataset file (`.csv` or JSON Lines)
    dataset: PathBuf,
    /// Training configuration JSON file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Target label
    #[arg(long)]
    label: Option<String>,
    #[arg(long)]
    epochs: Option<usize>,
    #[arg(long)]
    batch: Option<usize>,
    /// Adam learning rate
    #[arg(long)]
    lr: Option<f32>,
    /// Validation share in percent
    #[arg(long)]
    val_pct: Option<u32>,
    /// RNG seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,
    /// Include rows assigned to the test split
    #[arg(long)]
    include_test: bool,
    /// Cancel training after this many seconds and keep the best model so far
    #[arg(long)]
    time_limit_sec: Option<u64>,
    /// Output file path for the model artifact
    #[arg(long)]
    output: Option<PathBuf>,
    /// Write the per-epoch history (JSON) to this file
    #[arg(long)]
    history: Option<PathBuf>,
}

fn build_config(arg: &TrainArg) -> anyhow::Result<TrainingConfig> {
    let mut config: TrainingConfig = match &arg.config {
        Some(path) => util::read_json_file("training config", path)?,
        None => TrainingConfig::default(),
    };
    if let Some(label) = &arg.label {
        config.label.clone_from(label);
    }
    if let Some(epochs) = arg.epochs {
        config.epochs = epochs;
    }
    if let Some(batch) = arg.batch {
        config.batch = batch;
    }
    if let Some(lr) = arg.lr {
        config.lr = lr;
    }
    if let Some(val_pct) = arg.val_pct {
        config.val_pct = val_pct;
    }
    if arg.seed.is_some() {
        config.seed = arg.seed;
    }
    if arg.include_test {
        config.holdout_test = false;
    }
    Ok(config)
}

pub(crate) fn run(arg: &TrainArg) -> anyhow::Result<()> {
    let trainer = Trainer::new(&build_config(arg)?);
    let (store, _) = util::load_dataset(&arg.dataset, None, usize::MAX)?;
    let rows = store.snapshot();
    let config = trainer.config();
    eprintln!(
        "Training on {} rows (label {}, epochs {}, batch {}, lr {}, val {}%)",
        rows.len(),
        config.label,
        config.epochs,
        config.batch,
        config.lr,
        config.val_pct
    );

    let cancel = AtomicBool::new(false);
    let deadline = arg
        .time_limit_sec
        .map(|secs| Instant::now() + Duration::from_secs(secs));
    let outcome = thread::scope(|s| {
        let handle = s.spawn(|| trainer.train(&rows, &cancel));
        while !handle.is_finished() {
            if deadline.is_some_and(|d| Instant::now() >= d) && !cancel.load(Ordering::Relaxed) {
                tracing::info!("time limit reached, cancelling training");
                cancel.store(true, Ordering::Relaxed);
            }
            thread::sleep(POLL_INTERVAL);
        }
        handle.join()
    })
    .map_err(|_| anyhow::anyhow!("Training thread panicked"))?
    .context("Training failed")?;

    let artifact = ModelArtifact::from_outcome(&outcome, &config.label, Utc::now());
    Output::save_json(&artifact, arg.output.clone())?;
    if let Some(path) = &arg.history {
        Output::save_json(&outcome.history, Some(path.clone()))?;
    }

    eprintln!();
    eprintln!("Model saved successfully");
    if let Some(path) = &arg.output {
        eprintln!("  Path: {}", path.display());
    }
    eprintln!("  Trained at: {}", artifact.meta.trained_at);
    eprintln!(
        "  Rows: {} ({} train / {} val)",
        outcome.rows, outcome.train_rows, outcome.val_rows
    );
    eprintln!("  Class weight: {:.3}", outcome.class_weight);
    eprintln!("  Stop reason: {}", outcome.stop_reason);
    match (outcome.best_epoch, outcome.best_val_auc) {
        (Some(epoch), Some(auc)) => eprintln!("  Best epoch: {epoch} (val AUC {auc:.4})"),
        _ => eprintln!("  Best epoch: none (validation AUC never computable)"),
    }
    let v = &outcome.validation;
    eprintln!(
        "  Validation: loss={:.4} brier={:.4} precision={:.3} recall={:.3} f1={:.3} @ {}",
        v.loss.unwrap_or(f64::NAN),
        v.brier.unwrap_or(f64::NAN),
        v.precision,
        v.recall,
        v.f1,
        v.threshold
    );
    Ok(())
}
