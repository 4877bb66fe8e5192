use clap::{Parser, Subcommand};

use self::{
    collect::CollectArg,
    dataset::{ConvertDatasetArg, DatasetInfoArg},
    evaluate::EvaluateArg,
    predict::PredictArg,
    train::TrainArg,
};

mod collect;
mod dataset;
mod evaluate;
mod predict;
mod train;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Build a labeled dataset from a telemetry event stream
    Collect(#[clap(flatten)] CollectArg),
    /// Show row counts per split and label balance of a dataset
    DatasetInfo(#[clap(flatten)] DatasetInfoArg),
    /// Convert a dataset between JSON Lines and CSV
    ConvertDataset(#[clap(flatten)] ConvertDatasetArg),
    /// Train the risk classifier on a dataset
    Train(#[clap(flatten)] TrainArg),
    /// Evaluate a trained model on a dataset
    Evaluate(#[clap(flatten)] EvaluateArg),
    /// Write per-row predictions of a trained model
    Predict(#[clap(flatten)] PredictArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Collect(arg) => collect::run(&arg)?,
        Mode::DatasetInfo(arg) => dataset::run_info(&arg)?,
        Mode::ConvertDataset(arg) => dataset::run_convert(&arg)?,
        Mode::Train(arg) => train::run(&arg)?,
        Mode::Evaluate(arg) => evaluate::run(&arg)?,
        Mode::Predict(arg) => predict::run(&arg)?,
    }
    Ok(())
}
