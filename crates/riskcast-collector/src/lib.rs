//! Online feature and label collection for gameplay risk prediction
//!
//! This crate turns a stream of timestamped gameplay telemetry into a labeled,
//! split-assigned supervised-learning dataset using delayed (horizon-based) labeling.
//!
//! # Overview
//!
//! ## Collection Workflow
//!
//! 1. **Sample** ([`sampler::SnapshotSampler`]): Convert the game state of each tick into a
//!    [`snapshot::Snapshot`] of cumulative counters and a 32-wide
//!    [`feature::FeatureVector`]
//! 2. **Retain** ([`snapshot::SnapshotWindow`]): Keep recent snapshots, strictly increasing
//!    in time, for horizon + slack seconds
//! 3. **Wait** ([`pending::PendingLabelQueue`]): Hold each sample until its horizon has
//!    elapsed
//! 4. **Label** ([`label::LabelSet`]): Derive labels from counter deltas between the
//!    sample's snapshot and the one a horizon later
//! 5. **Store** ([`store::DatasetStore`]): Append the finalized [`row::Row`] to a
//!    capacity-bounded FIFO dataset, tagged with the session's [`split::Split`]
//!
//! [`collector::Collector`] drives all of the above from explicit `tick` calls or typed
//! [`event::CollectorEvent`]s. There is no global state and no timer.
//!
//! ## Dataset Workflow
//!
//! - **Export / Import** ([`row::codec`]): JSON Lines and CSV with one stable,
//!   schema-versioned column layout
//! - **Persist** ([`store::DatasetStore::save`], [`store::DatasetStore::load`]): Local
//!   JSON Lines file, replaced atomically
//! - **Summarize** ([`store::DatasetSummary`]): Rows per split and positives per label
//!
//! # Error Handling
//!
//! Problems on the collection path recover locally: unresolvable samples, out-of-order
//! snapshots and invalid events are dropped and counted in
//! [`collector::CollectorStats`] / [`pending::QueueStats`]. Import skips malformed rows
//! and reports how many were skipped. Only I/O returns errors.
//!
//! # Examples
//!
//! ```
//! use riskcast_collector::{
//!     collector::Collector,
//!     config::CollectorConfig,
//!     event::CollectorEvent,
//! };
//!
//! let mut collector = Collector::new(CollectorConfig::default()).unwrap();
//! let lines = [
//!     r#"{"kind":"session_start","sessionId":"a1","seed":"42","gameTag":"groups"}"#,
//!     r#"{"kind":"state","nowSec":0.0,"state":{"score":100,"misses":2}}"#,
//!     r#"{"kind":"state","nowSec":1.0,"state":{"score":100,"misses":2}}"#,
//!     r#"{"kind":"state","nowSec":2.0,"state":{"score":100,"misses":2}}"#,
//!     r#"{"kind":"state","nowSec":3.0,"state":{"score":100,"misses":2}}"#,
//!     r#"{"kind":"state","nowSec":4.0,"state":{"score":100,"misses":2}}"#,
//!     r#"{"kind":"state","nowSec":5.0,"state":{"score":90,"misses":3}}"#,
//! ];
//! for line in lines {
//!     let event: CollectorEvent = serde_json::from_str(line).unwrap();
//!     collector.ingest(event).unwrap();
//! }
//!
//! let rows = collector.store().snapshot();
//! assert_eq!(rows.len(), 1);
//! assert_eq!(rows[0].label("y_missNext5"), Some(1));
//! assert_eq!(rows[0].label("y_scoreDropNext5"), Some(1));
//!
//! let mut csv = vec![];
//! collector.store().export_csv(&mut csv).unwrap();
//! assert!(String::from_utf8(csv).unwrap().starts_with("schema,split,session,tSec"));
//! ```

pub mod collector;
pub mod config;
pub mod event;
pub mod feature;
pub mod label;
pub mod online;
pub mod pending;
pub mod row;
pub mod sampler;
pub mod snapshot;
pub mod split;
pub mod state;
pub mod store;
