use std::path::PathBuf;

use crate::util::{self, DatasetFormat, Output};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct DatasetInfoArg {
    /// Dataset file (`.csv` or JSON Lines)
    dataset: PathBuf,
    /// Write the summary as JSON to this file
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ConvertDatasetArg {
    /// Input dataset file
    input: PathBuf,
    /// Input format; guessed from the extension when omitted
    #[arg(long)]
    from: Option<DatasetFormat>,
    /// Output format; guessed from the output extension when omitted
    #[arg(long)]
    to: Option<DatasetFormat>,
    /// Output file path (stdout when omitted)
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run_info(arg: &DatasetInfoArg) -> anyhow::Result<()> {
    let (store, report) = util::load_dataset(&arg.dataset, None, usize::MAX)?;
    let summary = store.summary();

    eprintln!("Dataset: {}", arg.dataset.display());
    eprintln!("  Rows:      {} ({} malformed skipped)", summary.rows, report.malformed);
    for (split, count) in &summary.splits {
        eprintln!("  Split {split}: {count}");
    }
    for (label, labeled) in &summary.labeled {
        let positives = summary.positives.get(label).copied().unwrap_or(0);
        #[expect(clippy::cast_precision_loss)]
        let rate = positives as f64 / (*labeled).max(1) as f64;
        eprintln!("  {label}: {positives}/{labeled} positive ({:.1}%)", rate * 100.0);
    }

    if arg.output.is_some() {
        Output::save_json(&summary, arg.output.clone())?;
    }
    Ok(())
}

pub(crate) fn run_convert(arg: &ConvertDatasetArg) -> anyhow::Result<()> {
    let (store, report) = util::load_dataset(&arg.input, arg.from, usize::MAX)?;
    let format = arg.to.unwrap_or_else(|| {
        arg.output
            .as_deref()
            .map_or(DatasetFormat::Jsonl, DatasetFormat::from_path)
    });
    let mut output = Output::from_output_path(arg.output.clone())?;
    util::write_dataset(&store, &mut output, format)?;

    eprintln!(
        "Converted {} rows to {format:?} ({} malformed skipped)",
        store.len(),
        report.malformed
    );
    eprintln!("  Output: {}", output.display_path());
    Ok(())
}
