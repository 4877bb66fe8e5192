//! Timestamped counter snapshots and the rolling window that retains them.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Cumulative game counters at one whole second of session time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub t_sec: u32,
    /// Seconds left in the session.
    pub left: u32,
    pub score: i64,
    pub combo: i64,
    pub miss: i64,
    /// Accuracy percentage, 0..=100.
    pub acc: u8,
    pub pressure: u8,
    pub mini_on: bool,
    pub mini_left: u32,
    pub storm: bool,
    #[serde(default)]
    pub hit_good: i64,
    #[serde(default)]
    pub hit_wrong: i64,
    #[serde(default)]
    pub hit_junk: i64,
    #[serde(default)]
    pub expire_good: i64,
}

/// A cumulative counter that labels can be derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "camelCase")]
pub enum Counter {
    #[display("miss")]
    Miss,
    #[display("score")]
    Score,
    #[display("combo")]
    Combo,
    #[display("hitGood")]
    HitGood,
    #[display("hitWrong")]
    HitWrong,
    #[display("hitJunk")]
    HitJunk,
    #[display("expireGood")]
    ExpireGood,
}

impl Counter {
    pub const ALL: [Counter; 7] = [
        Counter::Miss,
        Counter::Score,
        Counter::Combo,
        Counter::HitGood,
        Counter::HitWrong,
        Counter::HitJunk,
        Counter::ExpireGood,
    ];
}

impl Snapshot {
    #[must_use]
    pub fn counter(&self, counter: Counter) -> i64 {
        match counter {
            Counter::Miss => self.miss,
            Counter::Score => self.score,
            Counter::Combo => self.combo,
            Counter::HitGood => self.hit_good,
            Counter::HitWrong => self.hit_wrong,
            Counter::HitJunk => self.hit_junk,
            Counter::ExpireGood => self.expire_good,
        }
    }
}

/// What [`SnapshotWindow::push`] did with a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum PushOutcome {
    /// Newer than every retained snapshot.
    Appended,
    /// Same second as the latest snapshot; the old one was overwritten.
    Replaced,
    /// Older than the latest snapshot; ignored.
    Rejected,
}

/// Rolling, strictly increasing window of snapshots.
///
/// After every accepted push, snapshots with `t_sec < latest - retention_sec` are
/// evicted.
#[derive(Debug, Clone)]
pub struct SnapshotWindow {
    retention_sec: u32,
    entries: VecDeque<Snapshot>,
}

impl SnapshotWindow {
    #[must_use]
    pub fn new(retention_sec: u32) -> Self {
        Self {
            retention_sec,
            entries: VecDeque::new(),
        }
    }

    #[must_use]
    pub fn retention_sec(&self) -> u32 {
        self.retention_sec
    }

    /// Inserts a snapshot, keeping timestamps strictly increasing.
    ///
    /// # Examples
    ///
    /// ```
    /// use riskcast_collector::snapshot::{PushOutcome, Snapshot, SnapshotWindow};
    ///
    /// let mut window = SnapshotWindow::new(45);
    /// let at = |t_sec| Snapshot { t_sec, ..Snapshot::default() };
    /// assert_eq!(window.push(at(3)), PushOutcome::Appended);
    /// assert_eq!(window.push(at(3)), PushOutcome::Replaced);
    /// assert_eq!(window.push(at(2)), PushOutcome::Rejected);
    /// ```
    pub fn push(&mut self, snapshot: Snapshot) -> PushOutcome {
        let outcome = match self.entries.back_mut() {
            Some(last) if snapshot.t_sec < last.t_sec => return PushOutcome::Rejected,
            Some(last) if snapshot.t_sec == last.t_sec => {
                *last = snapshot;
                PushOutcome::Replaced
            }
            _ => {
                self.entries.push_back(snapshot);
                PushOutcome::Appended
            }
        };

        let oldest_kept = snapshot.t_sec.saturating_sub(self.retention_sec);
        while self.entries.front().is_some_and(|s| s.t_sec < oldest_kept) {
            self.entries.pop_front();
        }
        outcome
    }

    /// Snapshot recorded at exactly `t_sec`.
    #[must_use]
    pub fn get(&self, t_sec: u32) -> Option<&Snapshot> {
        let index = self
            .entries
            .binary_search_by_key(&t_sec, |s| s.t_sec)
            .ok()?;
        self.entries.get(index)
    }

    #[must_use]
    pub fn latest(&self) -> Option<&Snapshot> {
        self.entries.back()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
