//! The collection context tying sampling, labeling and storage together.

use serde::{Deserialize, Serialize};

use crate::{
    config::{CollectorConfig, ConfigError},
    event::{CollectorEvent, InvalidEventError, SessionInfo},
    online::{OnlineEvaluator, OnlineReport},
    pending::{ModelOutputs, PendingLabelQueue, PendingPrediction, QueueStats},
    row::Row,
    sampler::SnapshotSampler,
    snapshot::{PushOutcome, Snapshot, SnapshotWindow},
    split::{Split, SplitAssigner},
    state::GameState,
    store::DatasetStore,
};

/// Counters describing what the collector has seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectorStats {
    pub sessions: u64,
    pub snapshots: u64,
    /// Snapshots older than the latest one, ignored.
    pub out_of_order: u64,
    pub invalid_events: u64,
    /// Samples enqueued by [`Collector::tick`].
    pub samples: u64,
    /// Samples supplied by prediction events.
    pub predictions: u64,
    pub rows_appended: u64,
    pub rows_evicted: u64,
}

/// Single-threaded, tick-driven collector.
///
/// Each call does work proportional to the snapshot window and pending queue and
/// never blocks. Rows are labeled with the split of the current session.
///
/// # Examples
///
/// ```
/// use riskcast_collector::{collector::Collector, config::CollectorConfig, state::GameState};
///
/// let mut collector = Collector::new(CollectorConfig::default()).unwrap();
/// let mut state = GameState::default();
/// for t in 0..=5 {
///     state.misses = if t < 5 { 2 } else { 3 };
///     collector.tick(f64::from(t), &state);
/// }
/// let rows = collector.store().snapshot();
/// assert_eq!(rows.len(), 1);
/// assert_eq!(rows[0].label("y_missNext5"), Some(1));
/// ```
#[derive(Debug, Clone)]
pub struct Collector {
    config: CollectorConfig,
    assigner: SplitAssigner,
    session: SessionInfo,
    session_key: String,
    split: Split,
    sampler: SnapshotSampler,
    window: SnapshotWindow,
    queue: PendingLabelQueue,
    store: DatasetStore,
    online: OnlineEvaluator,
    stats: CollectorStats,
}

impl Collector {
    /// Creates a collector with an empty dataset.
    pub fn new(config: CollectorConfig) -> Result<Self, ConfigError> {
        let capacity = config.clamped().cap_rows;
        Self::with_store(config, DatasetStore::new(capacity))
    }

    /// Creates a collector that appends to an existing dataset.
    pub fn with_store(config: CollectorConfig, store: DatasetStore) -> Result<Self, ConfigError> {
        config.validate()?;
        let config = config.clamped();
        let assigner = SplitAssigner::new(config.split_proportions);
        let session = SessionInfo::default();
        let session_key = session.key();
        Ok(Self {
            split: assigner.assign(&session_key),
            assigner,
            session,
            session_key,
            sampler: SnapshotSampler::new(0.0),
            window: SnapshotWindow::new(config.window_retention_sec()),
            queue: PendingLabelQueue::new(config.horizon_sec, config.pending_cap),
            store,
            online: OnlineEvaluator::new(config.eval_threshold),
            stats: CollectorStats::default(),
            config,
        })
    }

    /// Begins a new session. Pending samples and snapshots of the previous session
    /// are discarded; the dataset is kept.
    pub fn start_session(&mut self, session: SessionInfo) {
        self.session_key = session.key();
        self.split = self.assigner.assign(&self.session_key);
        self.sampler.reset(session.start_sec);
        self.window.clear();
        self.queue.clear();
        self.stats.sessions += 1;
        tracing::debug!(key = %self.session_key, split = %self.split, "session started");
        self.session = session;
    }

    /// Returns the collector to its initial state, dropping all rows.
    pub fn reset(&mut self) {
        self.start_session(SessionInfo::default());
        self.store.clear();
        self.online.reset();
        self.queue = PendingLabelQueue::new(self.config.horizon_sec, self.config.pending_cap);
        self.stats = CollectorStats::default();
    }

    /// Samples `state` at clock reading `now_sec`.
    ///
    /// Returns the number of rows appended by horizon resolution.
    pub fn tick(&mut self, now_sec: f64, state: &GameState) -> usize {
        let sample = self.sampler.sample(state, now_sec);
        let Some(appended) = self.ingest_snapshot(sample.snapshot) else {
            return 0;
        };
        if self.config.sample_every_tick {
            self.queue.merge_or_push(PendingPrediction {
                t_sec: sample.snapshot.t_sec,
                features: sample.features,
                context: sample.context,
                model_outputs: ModelOutputs::default(),
            });
            self.stats.samples += 1;
        }
        appended
    }

    /// Adds an externally produced sample. A pending sample at the same second is
    /// replaced.
    pub fn record_prediction(&mut self, prediction: PendingPrediction) {
        self.queue.merge_or_push(prediction);
        self.stats.predictions += 1;
    }

    /// Adds a snapshot and resolves every sample whose horizon has elapsed.
    ///
    /// Returns `None` if the snapshot was older than the latest one, else the number
    /// of rows appended.
    pub fn ingest_snapshot(&mut self, snapshot: Snapshot) -> Option<usize> {
        if self.window.push(snapshot) == PushOutcome::Rejected {
            tracing::debug!(t_sec = snapshot.t_sec, "ignoring out-of-order snapshot");
            self.stats.out_of_order += 1;
            return None;
        }
        self.stats.snapshots += 1;

        let resolved = self
            .queue
            .resolve(&self.window, snapshot.t_sec, &self.config.labels);
        let appended = resolved.len();
        for sample in resolved {
            let row = Row::from_resolved(
                sample,
                self.split,
                &self.session_key,
                self.config.horizon_sec,
            );
            self.online
                .observe(&row.model_outputs, |name| row.binary_label(name));
            if self.store.append(row).is_some() {
                self.stats.rows_evicted += 1;
            }
            self.stats.rows_appended += 1;
        }
        Some(appended)
    }

    /// Dispatches one event.
    ///
    /// Invalid events are counted and dropped; the error is returned for reporting.
    pub fn ingest(&mut self, event: CollectorEvent) -> Result<usize, InvalidEventError> {
        let result = match event {
            CollectorEvent::SessionStart(session) => {
                self.start_session(session);
                Ok(0)
            }
            CollectorEvent::Snapshot(e) => {
                Snapshot::try_from(&e).map(|s| self.ingest_snapshot(s).unwrap_or(0))
            }
            CollectorEvent::Prediction(e) => PendingPrediction::try_from(&e).map(|p| {
                self.record_prediction(p);
                0
            }),
            CollectorEvent::State(e) => {
                if e.now_sec.is_finite() {
                    Ok(self.tick(e.now_sec, &e.state))
                } else {
                    Err(InvalidEventError::NonFinite { field: "nowSec" })
                }
            }
        };
        if let Err(e) = &result {
            tracing::debug!(error = %e, "dropping invalid event");
            self.stats.invalid_events += 1;
        }
        result
    }

    #[must_use]
    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    #[must_use]
    pub fn session(&self) -> &SessionInfo {
        &self.session
    }

    #[must_use]
    pub fn session_key(&self) -> &str {
        &self.session_key
    }

    #[must_use]
    pub fn split(&self) -> Split {
        self.split
    }

    #[must_use]
    pub fn store(&self) -> &DatasetStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut DatasetStore {
        &mut self.store
    }

    #[must_use]
    pub fn into_store(self) -> DatasetStore {
        self.store
    }

    #[must_use]
    pub fn stats(&self) -> CollectorStats {
        self.stats
    }

    #[must_use]
    pub fn queue_stats(&self) -> QueueStats {
        self.queue.stats()
    }

    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn online_report(&self) -> OnlineReport {
        self.online.report()
    }
}
