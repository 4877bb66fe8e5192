use std::path::PathBuf;

use riskcast_collector::split::Split;

use super::evaluate::load_model;
use crate::util::{self, Output};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct PredictArg {
    /// Model artifact JSON file
    #[arg(long)]
    model: PathBuf,
    /// Dataset file (`.csv` or JSON Lines)
    dataset: PathBuf,
    /// Output file path for JSON Lines predictions (stdout when omitted)
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct Prediction<'a> {
    session: &'a str,
    t_sec: u32,
    split: Split,
    probability: f32,
    /// Observed label value, when the row carries the model's label.
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<i64>,
}

pub(crate) fn run(arg: &PredictArg) -> anyhow::Result<()> {
    let (artifact, model) = load_model(&arg.model)?;
    let (store, _) = util::load_dataset(&arg.dataset, None, usize::MAX)?;

    let mut output = Output::from_output_path(arg.output.clone())?;
    for row in store.iter() {
        let prediction = Prediction {
            session: &row.session,
            t_sec: row.t_sec,
            split: row.split,
            probability: model.predict(row.features.as_array()),
            label: artifact.meta.label.as_deref().and_then(|l| row.label(l)),
        };
        output.write_json_line(&prediction)?;
    }
    output.finish()?;

    eprintln!("Wrote {} predictions to {}", store.len(), output.display_path());
    Ok(())
}
