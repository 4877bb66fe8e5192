use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::PathBuf,
};

use anyhow::Context;
use riskcast_collector::{
    collector::{Collector, CollectorStats},
    config::CollectorConfig,
    event::CollectorEvent,
    label::LabelSet,
    online::{OnlineReport, TargetReport},
    pending::QueueStats,
    split::SplitProportions,
    store::{DatasetStore, DatasetSummary},
};

use crate::util::{self, Output};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct CollectArg {
    /// Event stream in JSON Lines (stdin when omitted)
    input: Option<PathBuf>,
    /// Dataset file (JSON Lines); existing rows are kept and new rows appended
    #[arg(long)]
    dataset: PathBuf,
    /// Collector configuration JSON file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Label horizon in seconds
    #[arg(long)]
    horizon_sec: Option<u32>,
    /// Dataset capacity in rows
    #[arg(long)]
    cap_rows: Option<usize>,
    /// Split proportions as `train,val,test`
    #[arg(long)]
    split: Option<SplitProportions>,
    /// Also collect the extended label set
    #[arg(long)]
    extended_labels: bool,
    /// Discard existing dataset rows instead of appending
    #[arg(long)]
    fresh: bool,
    /// Write the collection report (JSON) to this file
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct CollectReport {
    events: usize,
    unparsable_events: usize,
    stats: CollectorStats,
    queue: QueueStats,
    pending_at_end: usize,
    online: OnlineReport,
    summary: DatasetSummary,
}

fn build_config(arg: &CollectArg) -> anyhow::Result<CollectorConfig> {
    let mut config: CollectorConfig = match &arg.config {
        Some(path) => util::read_json_file("collector config", path)?,
        None => CollectorConfig::default(),
    };
    if let Some(horizon_sec) = arg.horizon_sec {
        config.horizon_sec = horizon_sec;
    }
    if let Some(cap_rows) = arg.cap_rows {
        config.cap_rows = cap_rows;
    }
    if let Some(split) = arg.split {
        config.split_proportions = split;
    }
    if arg.extended_labels {
        config.labels = LabelSet::extended();
    }
    Ok(config.clamped())
}

pub(crate) fn run(arg: &CollectArg) -> anyhow::Result<()> {
    let config = build_config(arg)?;

    let store = if arg.fresh {
        DatasetStore::new(config.cap_rows)
    } else {
        let (store, loaded) = DatasetStore::load(&arg.dataset, config.cap_rows)
            .with_context(|| format!("Failed to load dataset: {}", arg.dataset.display()))?;
        if loaded.malformed > 0 {
            tracing::warn!(malformed = loaded.malformed, "skipped malformed dataset rows");
        }
        store
    };
    let initial_rows = store.len();
    let mut collector = Collector::with_store(config, store).context("Invalid collector config")?;

    let reader: Box<dyn BufRead> = match &arg.input {
        Some(path) => Box::new(BufReader::new(File::open(path).with_context(|| {
            format!("Failed to open event stream: {}", path.display())
        })?)),
        None => Box::new(io::stdin().lock()),
    };

    let mut events = 0;
    let mut unparsable_events = 0;
    for (index, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read event stream")?;
        if line.trim().is_empty() {
            continue;
        }
        events += 1;
        let event: CollectorEvent = match serde_json::from_str(&line) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(line = index + 1, error = %e, "skipping unparsable event");
                unparsable_events += 1;
                continue;
            }
        };
        if let Err(e) = collector.ingest(event) {
            tracing::warn!(line = index + 1, error = %e, "skipping invalid event");
        }
    }

    collector
        .store()
        .save(&arg.dataset)
        .with_context(|| format!("Failed to save dataset: {}", arg.dataset.display()))?;

    let stats = collector.stats();
    let summary = collector.store().summary();
    eprintln!("Collection completed");
    eprintln!(
        "  Events:    {events} ({unparsable_events} unparsable, {} invalid)",
        stats.invalid_events
    );
    eprintln!("  Sessions:  {}", stats.sessions);
    eprintln!("  Samples:   {} ticks, {} predictions", stats.samples, stats.predictions);
    eprintln!(
        "  Rows:      {} appended, {} evicted, {} total (was {initial_rows})",
        stats.rows_appended,
        stats.rows_evicted,
        summary.rows
    );
    let queue = collector.queue_stats();
    eprintln!(
        "  Pending:   {} unresolvable, {} evicted, {} left unresolved",
        queue.dropped_unresolvable,
        queue.evicted,
        collector.pending_len()
    );
    for (split, count) in &summary.splits {
        eprintln!("  Split {split}: {count}");
    }
    let online = collector.online_report();
    print_target("pMissNext5", &online.miss);
    print_target("pScoreDropNext5", &online.score_drop);
    eprintln!("  Dataset:   {}", arg.dataset.display());

    if let Some(path) = &arg.report {
        let report = CollectReport {
            events,
            unparsable_events,
            stats,
            queue,
            pending_at_end: collector.pending_len(),
            online,
            summary,
        };
        Output::save_json(&report, Some(path.clone()))?;
    }
    Ok(())
}

fn print_target(name: &str, report: &TargetReport) {
    if report.count == 0 {
        return;
    }
    eprintln!(
        "  Online {name}: n={} brier={:.4} precision={:.3} recall={:.3} f1={:.3}",
        report.count,
        report.brier.unwrap_or(f64::NAN),
        report.precision,
        report.recall,
        report.f1
    );
}
