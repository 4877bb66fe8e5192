use std::path::{Path, PathBuf};

use anyhow::Context;
use rand::SeedableRng as _;
use rand_pcg::Pcg64Mcg;
use riskcast_collector::{online::MISS_LABEL, row::Row, split::Split};
use riskcast_stats::{confusion::DEFAULT_THRESHOLD, report::EvaluationReport};
use riskcast_training::{
    artifact::ModelArtifact,
    evaluate,
    importance::{self, FeatureImportance},
    model::Mlp,
};

use crate::util::{self, Output};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct EvaluateArg {
    /// Model artifact JSON file
    #[arg(long)]
    model: PathBuf,
    /// Dataset file (`.csv` or JSON Lines)
    dataset: PathBuf,
    /// Only evaluate rows of this split (`train`, `val` or `test`)
    #[arg(long)]
    split: Option<Split>,
    /// Target label; defaults to the label the model was trained on
    #[arg(long)]
    label: Option<String>,
    /// Decision threshold
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    threshold: f32,
    /// Also rank features by importance (`permutation` or `occlusion`)
    #[arg(long)]
    importance: Option<ImportanceMethod>,
    /// Shuffles averaged per feature for permutation importance
    #[arg(long, default_value_t = 1)]
    importance_repeats: usize,
    /// RNG seed for permutation importance
    #[arg(long)]
    seed: Option<u64>,
    /// Number of top features to print
    #[arg(long, default_value_t = 10)]
    top: usize,
    /// Write the report as JSON to this file (stdout when omitted)
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::FromStr)]
enum ImportanceMethod {
    Permutation,
    Occlusion,
}

#[derive(Debug, serde::Serialize)]
struct EvaluationOutput {
    #[serde(flatten)]
    report: EvaluationReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    importance: Option<Vec<FeatureImportance>>,
}

pub(crate) fn load_model(path: &Path) -> anyhow::Result<(ModelArtifact, Mlp)> {
    let artifact: ModelArtifact = util::read_json_file("model artifact", path)?;
    let model = artifact
        .to_model()
        .with_context(|| format!("Invalid model artifact: {}", path.display()))?;
    Ok((artifact, model))
}

pub(crate) fn run(arg: &EvaluateArg) -> anyhow::Result<()> {
    let (artifact, model) = load_model(&arg.model)?;
    let label = arg
        .label
        .clone()
        .or_else(|| artifact.meta.label.clone())
        .unwrap_or_else(|| MISS_LABEL.to_owned());
    let pos_weight = f64::from(artifact.meta.class_weight.unwrap_or(1.0));

    let (store, _) = util::load_dataset(&arg.dataset, None, usize::MAX)?;
    let rows: Vec<&Row> = store
        .iter()
        .filter(|row| arg.split.is_none_or(|split| row.split == split))
        .collect();
    let report = evaluate::evaluate_rows(
        &model,
        rows.iter().copied(),
        &label,
        arg.threshold.clamp(0.0, 1.0),
        pos_weight,
    );

    eprintln!("Evaluation of {} on {}", arg.model.display(), arg.dataset.display());
    if let Some(split) = arg.split {
        eprintln!("  Split: {split}");
    }
    eprintln!(
        "  Label: {label} ({} rows, {} positive)",
        report.count, report.positives
    );
    match report.auc {
        Some(auc) => eprintln!("  AUC: {auc:.4}"),
        None => eprintln!("  AUC: not computable (single class)"),
    }
    eprintln!(
        "  Loss: {:.4}  Brier: {:.4}",
        report.loss.unwrap_or(f64::NAN),
        report.brier.unwrap_or(f64::NAN)
    );
    let c = &report.confusion;
    eprintln!(
        "  @ {}: TP={} FP={} TN={} FN={}  precision={:.3} recall={:.3} f1={:.3}",
        report.threshold,
        c.true_positives,
        c.false_positives,
        c.true_negatives,
        c.false_negatives,
        report.precision,
        report.recall,
        report.f1
    );

    let importance = arg.importance.map(|method| {
        let rows = rows.iter().copied();
        let mut importances = match method {
            ImportanceMethod::Permutation => {
                let mut rng = match arg.seed {
                    Some(seed) => Pcg64Mcg::seed_from_u64(seed),
                    None => Pcg64Mcg::from_rng(&mut rand::rng()),
                };
                importance::permutation_importance(
                    &model,
                    rows,
                    &label,
                    arg.importance_repeats,
                    &mut rng,
                )
            }
            ImportanceMethod::Occlusion => importance::occlusion_importance(&model, rows, &label),
        };
        importance::rank(&mut importances);
        eprintln!("  Feature importance ({method:?}, loss increase):");
        for imp in importances.iter().take(arg.top) {
            eprintln!("    f{:<2} {:<16} {:+.4}", imp.index, imp.name, imp.importance);
        }
        importances
    });

    Output::save_json(
        &EvaluationOutput { report, importance },
        arg.output.clone(),
    )
}
